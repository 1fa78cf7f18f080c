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

//! The `tokenize` language
//!
//! Without options the source is the delimiter. With options, the eleven
//! positional slots listed in [`OPTION_NAMES`](crate::tokenizer::OPTION_NAMES)
//! configure the tokenizer, and the source stands in for an unset token.

use super::{Language, LanguageOption, truthiness_predicate};
use crate::error::ExpressionResult;
use crate::expression::{EvaluationContext, Expression, Predicate};
use crate::tokenizer::{TokenizerBuilder, TokenizerConfig};
use std::fmt;
use std::sync::Arc;

/// The `tokenize` language
pub struct TokenizeLanguage {
    context: Arc<EvaluationContext>,
}

impl TokenizeLanguage {
    /// Create the language over `context`
    pub fn new(context: Arc<EvaluationContext>) -> Self {
        Self { context }
    }

    /// Factory for the standard table
    pub fn factory(context: &Arc<EvaluationContext>) -> Arc<dyn Language> {
        Arc::new(Self::new(context.clone()))
    }

    /// Compile a configuration built elsewhere
    pub fn create_from_config(&self, config: TokenizerConfig) -> ExpressionResult<Arc<dyn Expression>> {
        let expression: Arc<dyn Expression> = Arc::from(TokenizerBuilder::new(config).build()?);
        expression.init(&self.context)?;
        Ok(expression)
    }
}

impl fmt::Debug for TokenizeLanguage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenizeLanguage").finish_non_exhaustive()
    }
}

impl Language for TokenizeLanguage {
    fn name(&self) -> &str {
        "tokenize"
    }

    fn create_expression(&self, source: &str) -> ExpressionResult<Arc<dyn Expression>> {
        self.create_expression_with_options(source, &[])
    }

    fn create_predicate(&self, source: &str) -> ExpressionResult<Arc<dyn Predicate>> {
        self.create_predicate_with_options(source, &[])
    }

    fn create_expression_with_options(
        &self,
        source: &str,
        options: &[LanguageOption],
    ) -> ExpressionResult<Arc<dyn Expression>> {
        self.create_from_config(TokenizerConfig::from_options(source, options)?)
    }

    /// True when at least one fragment is produced
    fn create_predicate_with_options(
        &self,
        source: &str,
        options: &[LanguageOption],
    ) -> ExpressionResult<Arc<dyn Predicate>> {
        let expression = self.create_expression_with_options(source, options)?;
        truthiness_predicate(expression, &self.context)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ExpressionError;
    use crate::model::{Exchange, Value};
    use crate::registry::SimpleRegistry;

    fn language() -> TokenizeLanguage {
        TokenizeLanguage::new(EvaluationContext::new(Arc::new(SimpleRegistry::new())))
    }

    #[test]
    fn test_source_is_token() {
        let expression = language().create_expression(",").unwrap();
        let value = expression.evaluate(&mut Exchange::with_body("a,b")).unwrap();
        let items = value.into_sequence().unwrap().try_collect().unwrap();
        assert_eq!(items, vec![Value::from("a"), Value::from("b")]);
    }

    #[test]
    fn test_predicate_on_non_empty() {
        let predicate = language().create_predicate(",").unwrap();
        assert!(predicate.matches(&mut Exchange::with_body("a")).unwrap());
        assert!(!predicate.matches(&mut Exchange::with_body("")).unwrap());
    }

    #[test]
    fn test_conflicting_options_rejected() {
        let mut options = vec![LanguageOption::Null; 11];
        options[3] = "</x>".into();
        options[7] = true.into();
        let err = language()
            .create_expression_with_options("<x>", &options)
            .unwrap_err();
        assert!(matches!(err, ExpressionError::Configuration { .. }));
    }
}
