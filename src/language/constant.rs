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

//! The `constant` language

use super::{Language, LanguageOption, bind_expression, truthiness_predicate};
use crate::error::{ExpressionError, ExpressionResult};
use crate::expression::{ContextBinding, EvaluationContext, Expression, Predicate};
use crate::model::{Exchange, Value};
use std::fmt;
use std::sync::Arc;

/// Returns the same value for every exchange
#[derive(Debug)]
pub struct ConstantExpression {
    value: Value,
    binding: ContextBinding,
}

impl ConstantExpression {
    /// Create a constant expression
    pub fn new(value: impl Into<Value>) -> Self {
        Self {
            value: value.into(),
            binding: ContextBinding::new(),
        }
    }
}

impl Expression for ConstantExpression {
    fn binding(&self) -> &ContextBinding {
        &self.binding
    }

    fn evaluate(&self, _exchange: &mut Exchange) -> ExpressionResult<Value> {
        self.binding.get()?;
        Ok(self.value.clone())
    }
}

/// The `constant` language
///
/// The source text is the value. The first option, when given, is a result
/// type the text is converted to once at compile time.
pub struct ConstantLanguage {
    context: Arc<EvaluationContext>,
}

impl ConstantLanguage {
    /// Create the language over `context`
    pub fn new(context: Arc<EvaluationContext>) -> Self {
        Self { context }
    }

    /// Factory for the standard table
    pub fn factory(context: &Arc<EvaluationContext>) -> Arc<dyn Language> {
        Arc::new(Self::new(context.clone()))
    }
}

impl fmt::Debug for ConstantLanguage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConstantLanguage").finish_non_exhaustive()
    }
}

impl Language for ConstantLanguage {
    fn name(&self) -> &str {
        "constant"
    }

    fn create_expression(&self, source: &str) -> ExpressionResult<Arc<dyn Expression>> {
        bind_expression(ConstantExpression::new(source), &self.context)
    }

    fn create_predicate(&self, source: &str) -> ExpressionResult<Arc<dyn Predicate>> {
        let expression = self.create_expression(source)?;
        truthiness_predicate(expression, &self.context)
    }

    fn create_expression_with_options(
        &self,
        source: &str,
        options: &[LanguageOption],
    ) -> ExpressionResult<Arc<dyn Expression>> {
        let Some(option) = options.first().filter(|option| !option.is_null()) else {
            return self.create_expression(source);
        };
        let target = option.as_type().ok_or_else(|| {
            ExpressionError::configuration(format!("invalid result type option {option:?}"))
        })?;
        let value = self.context.converter().convert(Value::from(source), target)?;
        bind_expression(ConstantExpression::new(value), &self.context)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ValueType;
    use crate::registry::SimpleRegistry;

    fn language() -> ConstantLanguage {
        ConstantLanguage::new(EvaluationContext::new(Arc::new(SimpleRegistry::new())))
    }

    #[test]
    fn test_constant_text() {
        let expression = language().create_expression("${not parsed}").unwrap();
        assert_eq!(
            expression.evaluate(&mut Exchange::new()).unwrap(),
            Value::from("${not parsed}")
        );
    }

    #[test]
    fn test_constant_with_result_type() {
        let expression = language()
            .create_expression_with_options("42", &[ValueType::Integer.into()])
            .unwrap();
        assert_eq!(expression.evaluate(&mut Exchange::new()).unwrap(), Value::Integer(42));

        let err = language()
            .create_expression_with_options("forty-two", &[ValueType::Integer.into()])
            .unwrap_err();
        assert!(matches!(err, ExpressionError::Coercion(_)));
    }
}
