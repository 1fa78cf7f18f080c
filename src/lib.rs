//! Expression, predicate and body tokenization core for message routing
//!
//! Languages compile source text into reusable [`Expression`]s and
//! [`Predicate`]s that are evaluated once per [`Exchange`]. The `tokenize`
//! language splits a body into a [`LazySequence`] of fragments without reading
//! the whole body into memory.

pub mod config;
pub mod diagnostics;
pub mod error;
pub mod expression;
pub mod language;
pub mod model;
pub mod parser;
pub mod registry;
pub mod tokenizer;

// Re-export main types
pub use config::EngineConfig;
pub use diagnostics::SyntaxError;
pub use error::{ExpressionError, ExpressionResult};
pub use expression::{EvaluationContext, Expression, Predicate};
pub use language::{Language, LanguageOption};
pub use model::{BodyStream, Exchange, LazySequence, TypeConverter, Value, ValueType};
pub use registry::{Bean, LanguageRegistry, Registry, SimpleRegistry};
pub use tokenizer::{InputSource, TokenizerBuilder, TokenizerConfig};
