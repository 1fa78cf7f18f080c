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

//! Error types shared by languages, expressions and tokenizers

use crate::diagnostics::SyntaxError;
use crate::model::CoercionError;
use thiserror::Error;

/// Result type for compile and evaluation operations
pub type ExpressionResult<T> = Result<T, ExpressionError>;

/// Errors raised while compiling or evaluating an expression
///
/// Every variant is `Clone` so a failure can be attached to the in-flight
/// [`Exchange`](crate::model::Exchange) and inspected later by the route.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExpressionError {
    /// Mutually exclusive or incomplete options, raised at compile time
    #[error("Invalid configuration: {message}")]
    Configuration {
        /// What was wrong with the configuration
        message: String,
    },

    /// A registry reference could not be resolved to an expression or predicate
    #[error("Cannot resolve reference '{name}': {reason}")]
    Lookup {
        /// The name that was looked up
        name: String,
        /// Why the lookup failed
        reason: String,
    },

    /// Malformed mini-expression source
    #[error(transparent)]
    Syntax(#[from] SyntaxError),

    /// A value could not be converted to a mandatory result type
    #[error(transparent)]
    Coercion(#[from] CoercionError),

    /// Generic evaluation failure
    #[error("Evaluation failed: {message}")]
    Evaluation {
        /// Error message
        message: String,
    },

    /// Reading the underlying body failed
    #[error("I/O error while reading body: {message}")]
    Io {
        /// Error message from the reader
        message: String,
    },

    /// The markup splitter hit malformed input
    #[error("Malformed XML at byte {position}: {message}")]
    Xml {
        /// Byte offset reported by the reader
        position: usize,
        /// Error message from the reader
        message: String,
    },

    /// No language is registered under the requested name
    #[error("No language registered under '{name}'")]
    UnknownLanguage {
        /// The requested language name
        name: String,
    },

    /// `init` was called again with a different evaluation context
    #[error("Expression is already bound to a different evaluation context")]
    AlreadyInitialized,

    /// `evaluate` was called before `init`
    #[error("Expression has not been bound to an evaluation context")]
    NotInitialized,
}

impl ExpressionError {
    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create a lookup error
    pub fn lookup(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Lookup {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Create an evaluation error
    pub fn evaluation(message: impl Into<String>) -> Self {
        Self::Evaluation {
            message: message.into(),
        }
    }

    /// Create an unknown language error
    pub fn unknown_language(name: impl Into<String>) -> Self {
        Self::UnknownLanguage { name: name.into() }
    }

    /// True for errors that are raised while compiling rather than evaluating
    pub fn is_compile_time(&self) -> bool {
        matches!(
            self,
            Self::Configuration { .. } | Self::Syntax(_) | Self::UnknownLanguage { .. }
        )
    }
}

impl From<std::io::Error> for ExpressionError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: err.to_string(),
        }
    }
}
