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

//! Language SPI and the built-in languages
//!
//! A [`Language`] compiles source text, plus optional positional options,
//! into an [`Expression`] or [`Predicate`] that is already bound to the
//! language's evaluation context. Languages hold no per-evaluation state and
//! are shared by every exchange.

pub mod accessor;
pub mod constant;
pub mod reference;
pub mod simple;
pub mod tokenize;

pub use accessor::{AccessorExpression, AccessorLanguage, Scope};
pub use constant::{ConstantExpression, ConstantLanguage};
pub use reference::{DynamicReference, RefLanguage};
pub use simple::{SimpleExpression, SimpleLanguage};
pub use tokenize::TokenizeLanguage;

use crate::error::{ExpressionError, ExpressionResult};
use crate::expression::{EvaluationContext, Expression, ExpressionPredicate, Predicate};
use crate::model::ValueType;
use crate::registry::LanguageFactory;
use std::fmt;
use std::sync::Arc;

/// A named compiler from source text to expressions and predicates
pub trait Language: Send + Sync + fmt::Debug {
    /// The name the language is registered under
    fn name(&self) -> &str;

    /// Compile `source` into an expression
    fn create_expression(&self, source: &str) -> ExpressionResult<Arc<dyn Expression>>;

    /// Compile `source` into a predicate
    fn create_predicate(&self, source: &str) -> ExpressionResult<Arc<dyn Predicate>>;

    /// Compile `source` with positional options
    ///
    /// Languages without structured configuration ignore the options.
    fn create_expression_with_options(
        &self,
        source: &str,
        _options: &[LanguageOption],
    ) -> ExpressionResult<Arc<dyn Expression>> {
        self.create_expression(source)
    }

    /// Compile `source` into a predicate with positional options
    fn create_predicate_with_options(
        &self,
        source: &str,
        _options: &[LanguageOption],
    ) -> ExpressionResult<Arc<dyn Predicate>> {
        self.create_predicate(source)
    }
}

/// A typed positional option passed to a language
#[derive(Debug, Clone, Default, PartialEq)]
pub enum LanguageOption {
    /// Option not supplied
    #[default]
    Null,
    /// Boolean flag
    Bool(bool),
    /// Integer value
    Int(i64),
    /// Text value
    Text(String),
    /// Result type
    Type(ValueType),
}

impl LanguageOption {
    /// Check if the option was left unset
    pub fn is_null(&self) -> bool {
        matches!(self, LanguageOption::Null)
    }

    /// Read as text; unset yields `None`
    pub fn as_text(&self) -> Option<&str> {
        match self {
            LanguageOption::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Read as a flag, accepting `"true"`/`"false"` text
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            LanguageOption::Bool(flag) => Some(*flag),
            LanguageOption::Text(text) => match text.trim().to_ascii_lowercase().as_str() {
                "true" => Some(true),
                "false" => Some(false),
                _ => None,
            },
            _ => None,
        }
    }

    /// Read as an integer, accepting numeric text
    pub fn as_int(&self) -> Option<i64> {
        match self {
            LanguageOption::Int(value) => Some(*value),
            LanguageOption::Text(text) => text.trim().parse().ok(),
            _ => None,
        }
    }

    /// Read as a result type, accepting type names
    pub fn as_type(&self) -> Option<ValueType> {
        match self {
            LanguageOption::Type(value_type) => Some(*value_type),
            LanguageOption::Text(text) => text.parse().ok(),
            _ => None,
        }
    }
}

impl From<bool> for LanguageOption {
    fn from(value: bool) -> Self {
        LanguageOption::Bool(value)
    }
}

impl From<i64> for LanguageOption {
    fn from(value: i64) -> Self {
        LanguageOption::Int(value)
    }
}

impl From<i32> for LanguageOption {
    fn from(value: i32) -> Self {
        LanguageOption::Int(value as i64)
    }
}

impl From<&str> for LanguageOption {
    fn from(value: &str) -> Self {
        LanguageOption::Text(value.to_string())
    }
}

impl From<String> for LanguageOption {
    fn from(value: String) -> Self {
        LanguageOption::Text(value)
    }
}

impl From<ValueType> for LanguageOption {
    fn from(value: ValueType) -> Self {
        LanguageOption::Type(value)
    }
}

impl<T: Into<LanguageOption>> From<Option<T>> for LanguageOption {
    fn from(value: Option<T>) -> Self {
        value.map_or(LanguageOption::Null, Into::into)
    }
}

const STANDARD_LANGUAGES: &[LanguageFactory] = &[
    AccessorLanguage::header,
    AccessorLanguage::exchange_property,
    AccessorLanguage::variable,
    ConstantLanguage::factory,
    RefLanguage::factory,
    SimpleLanguage::factory,
    TokenizeLanguage::factory,
];

/// Factories for every built-in language
pub fn standard_languages() -> &'static [LanguageFactory] {
    STANDARD_LANGUAGES
}

/// Bind an expression to `context` and share it
pub(crate) fn bind_expression<E>(
    expression: E,
    context: &Arc<EvaluationContext>,
) -> ExpressionResult<Arc<dyn Expression>>
where
    E: Expression + 'static,
{
    let expression: Arc<dyn Expression> = Arc::new(expression);
    expression.init(context)?;
    Ok(expression)
}

/// Wrap a bound expression as a predicate judged by truthiness
pub(crate) fn truthiness_predicate(
    expression: Arc<dyn Expression>,
    context: &Arc<EvaluationContext>,
) -> ExpressionResult<Arc<dyn Predicate>> {
    let predicate: Arc<dyn Predicate> = Arc::new(ExpressionPredicate::new(expression));
    predicate.init(context)?;
    Ok(predicate)
}

/// Reject a blank source for languages that need a name
pub(crate) fn require_name(language: &str, source: &str) -> ExpressionResult<String> {
    let name = source.trim();
    if name.is_empty() {
        return Err(ExpressionError::configuration(format!(
            "the {language} language requires a non-empty name"
        )));
    }
    Ok(name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_option_coercions() {
        assert_eq!(LanguageOption::from("TRUE").as_bool(), Some(true));
        assert_eq!(LanguageOption::from("12").as_int(), Some(12));
        assert_eq!(LanguageOption::from("int").as_type(), Some(ValueType::Integer));
        assert_eq!(LanguageOption::from(None::<&str>), LanguageOption::Null);
        assert!(LanguageOption::Null.as_text().is_none());
        assert!(LanguageOption::from(3i64).as_bool().is_none());
    }

    #[test]
    fn test_require_name() {
        assert_eq!(require_name("header", "  id ").unwrap(), "id");
        assert!(require_name("header", "   ").is_err());
    }
}
