// Copyright 2024 OctoFHIR Team
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Streaming body tokenization
//!
//! A [`TokenizerConfig`] selects one splitting strategy: literal delimiter,
//! regular expression, start/end token pairs, or markup elements. The
//! [`TokenizerBuilder`] validates it and composes the splitter with the
//! skip-first, grouping and type conversion decorators into an
//! [`Expression`](crate::expression::Expression) whose value is a
//! [`LazySequence`](crate::model::LazySequence).
//!
//! Splitters read the body in chunks of
//! [`read_buffer_size`](crate::config::EngineConfig::read_buffer_size) bytes
//! and hold only the fragment being produced. The body reader is dropped once
//! the sequence is exhausted, fails or is closed.

pub mod builder;
pub mod config;
pub mod delimiter;
pub mod group;
pub mod pair;
pub mod scanner;
pub mod xml;

pub use builder::{TokenizerBuilder, TokenizerExpression};
pub use config::{InputSource, OPTION_NAMES, TokenizerConfig, TokenizerMode};
pub use delimiter::{DelimiterSplitter, Matcher};
pub use group::{GroupIterator, GroupJoin, SkipFirst};
pub use pair::PairSplitter;
pub use scanner::ChunkedInput;
pub use xml::{INHERIT_ALL, NamespaceInheritance, XmlSplitter};

use crate::error::ExpressionResult;

/// One raw fragment or the failure that ended splitting
pub type FragmentResult = ExpressionResult<Vec<u8>>;

/// A type-erased splitter
pub type BoxedSplitter = Box<dyn Iterator<Item = FragmentResult> + Send>;
