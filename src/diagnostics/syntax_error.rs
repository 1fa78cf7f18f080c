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

//! Location-carrying syntax errors for mini-expression sources

use std::fmt;
use thiserror::Error;

/// Placeholder rendered when an error carries no message
pub const MISSING_MESSAGE: &str = "[null]";

/// A parse failure in a textual mini-expression
///
/// Carries the original source, the zero-based character index of the
/// offending position (absent when no position applies) and a short message.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub struct SyntaxError {
    expression: String,
    location: Option<usize>,
    message: Option<String>,
}

impl SyntaxError {
    /// Create an error pointing at `index` within `expression`
    pub fn new(expression: impl Into<String>, index: usize, message: impl Into<String>) -> Self {
        Self {
            expression: expression.into(),
            location: Some(index),
            message: Some(message.into()),
        }
    }

    /// Create an error that cannot be tied to a position
    pub fn unlocated(expression: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            expression: expression.into(),
            location: None,
            message: Some(message.into()),
        }
    }

    /// Create an error from raw parts, where a negative index means "no position"
    pub fn from_parts(expression: impl Into<String>, index: i64, message: Option<String>) -> Self {
        Self {
            expression: expression.into(),
            location: usize::try_from(index).ok(),
            message,
        }
    }

    /// The source text that failed to parse
    pub fn expression(&self) -> &str {
        &self.expression
    }

    /// Zero-based index of the failure, or -1 when not localizable
    pub fn index(&self) -> i64 {
        self.location.map_or(-1, |i| i as i64)
    }

    /// Zero-based index of the failure, if any
    pub fn location(&self) -> Option<usize> {
        self.location
    }

    /// The message without any positional annotation
    pub fn short_message(&self) -> &str {
        self.message.as_deref().unwrap_or(MISSING_MESSAGE)
    }

    /// Render the message followed by the source and a caret line
    ///
    /// ```text
    /// bad token at location 1
    /// abc
    ///  *
    /// ```
    pub fn render(&self) -> String {
        let Some(message) = &self.message else {
            return MISSING_MESSAGE.to_string();
        };

        let mut out = String::with_capacity(message.len() + self.expression.len() * 2 + 32);
        out.push_str(message);
        if let Some(index) = self.location {
            out.push_str(" at location ");
            out.push_str(&index.to_string());
            out.push('\n');
            out.push_str(&self.expression);
            out.push('\n');
            out.extend(std::iter::repeat_n(' ', index));
            out.push_str("*\n");
        }
        out
    }
}

impl fmt::Display for SyntaxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}
