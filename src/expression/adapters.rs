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

//! Expressions that wrap a delegate

use super::{ContextBinding, EvaluationContext, Expression, Predicate};
use crate::error::ExpressionResult;
use crate::model::{Exchange, Value, ValueType};
use std::sync::Arc;

/// Uses an expression as a predicate through value truthiness
#[derive(Debug)]
pub struct ExpressionPredicate {
    expression: Arc<dyn Expression>,
    binding: ContextBinding,
}

impl ExpressionPredicate {
    /// Wrap `expression`
    pub fn new(expression: Arc<dyn Expression>) -> Self {
        Self {
            expression,
            binding: ContextBinding::new(),
        }
    }

    /// The wrapped expression
    pub fn expression(&self) -> &Arc<dyn Expression> {
        &self.expression
    }
}

impl Predicate for ExpressionPredicate {
    fn binding(&self) -> &ContextBinding {
        &self.binding
    }

    fn init(&self, context: &Arc<EvaluationContext>) -> ExpressionResult<()> {
        self.binding.bind(context)?;
        // a shared delegate keeps the context it was first bound to
        if self.expression.binding().is_bound() {
            return Ok(());
        }
        self.expression.init(context)
    }

    fn matches(&self, exchange: &mut Exchange) -> ExpressionResult<bool> {
        Ok(self.expression.evaluate(exchange)?.is_truthy())
    }
}

/// Uses a predicate as a boolean-valued expression
#[derive(Debug)]
pub struct PredicateExpression {
    predicate: Arc<dyn Predicate>,
    binding: ContextBinding,
}

impl PredicateExpression {
    /// Wrap `predicate`
    pub fn new(predicate: Arc<dyn Predicate>) -> Self {
        Self {
            predicate,
            binding: ContextBinding::new(),
        }
    }

    /// The wrapped predicate
    pub fn predicate(&self) -> &Arc<dyn Predicate> {
        &self.predicate
    }
}

impl Expression for PredicateExpression {
    fn binding(&self) -> &ContextBinding {
        &self.binding
    }

    fn init(&self, context: &Arc<EvaluationContext>) -> ExpressionResult<()> {
        self.binding.bind(context)?;
        if self.predicate.binding().is_bound() {
            return Ok(());
        }
        self.predicate.init(context)
    }

    fn evaluate(&self, exchange: &mut Exchange) -> ExpressionResult<Value> {
        self.predicate.matches(exchange).map(Value::Boolean)
    }
}

/// Coerces every value its delegate produces to a fixed element type
///
/// Sequences are converted element by element as they are consumed; other
/// values are converted immediately.
#[derive(Debug)]
pub struct ConvertingExpression {
    delegate: Box<dyn Expression>,
    target: ValueType,
    binding: ContextBinding,
}

impl ConvertingExpression {
    /// Wrap `delegate`, converting to `target`
    pub fn new(delegate: Box<dyn Expression>, target: ValueType) -> Self {
        Self {
            delegate,
            target,
            binding: ContextBinding::new(),
        }
    }

    /// The element type produced values are converted to
    pub fn target(&self) -> ValueType {
        self.target
    }
}

impl Expression for ConvertingExpression {
    fn binding(&self) -> &ContextBinding {
        &self.binding
    }

    fn init(&self, context: &Arc<EvaluationContext>) -> ExpressionResult<()> {
        self.binding.bind(context)?;
        self.delegate.init(context)
    }

    fn evaluate(&self, exchange: &mut Exchange) -> ExpressionResult<Value> {
        let converter = *self.binding.get()?.converter();
        let target = self.target;
        match self.delegate.evaluate(exchange)? {
            Value::Sequence(seq) => Ok(Value::Sequence(
                seq.map_values(move |value| Ok(converter.convert(value, target)?)),
            )),
            Value::List(items) => items
                .into_iter()
                .map(|item| Ok(converter.convert(item, target)?))
                .collect::<ExpressionResult<Vec<_>>>()
                .map(Value::List),
            other => Ok(converter.convert(other, target)?),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ExpressionError;
    use crate::model::LazySequence;
    use crate::registry::SimpleRegistry;

    #[derive(Debug)]
    struct Fixed {
        value: fn() -> Value,
        binding: ContextBinding,
    }

    impl Fixed {
        fn new(value: fn() -> Value) -> Self {
            Self {
                value,
                binding: ContextBinding::new(),
            }
        }
    }

    impl Expression for Fixed {
        fn binding(&self) -> &ContextBinding {
            &self.binding
        }

        fn evaluate(&self, _exchange: &mut Exchange) -> ExpressionResult<Value> {
            self.binding.get()?;
            Ok((self.value)())
        }
    }

    fn context() -> Arc<EvaluationContext> {
        EvaluationContext::new(Arc::new(SimpleRegistry::new()))
    }

    #[test]
    fn test_expression_predicate() {
        let ctx = context();
        let predicate = ExpressionPredicate::new(Arc::new(Fixed::new(|| Value::from("true"))));
        predicate.init(&ctx).unwrap();
        assert!(predicate.matches(&mut Exchange::new()).unwrap());

        let predicate = ExpressionPredicate::new(Arc::new(Fixed::new(|| Value::Null)));
        predicate.init(&ctx).unwrap();
        assert!(!predicate.matches(&mut Exchange::new()).unwrap());
    }

    #[test]
    fn test_predicate_expression_round_trips_truthiness() {
        let ctx = context();
        let inner = Arc::new(ExpressionPredicate::new(Arc::new(Fixed::new(|| {
            Value::Boolean(false)
        }))));
        let expression = PredicateExpression::new(inner);
        expression.init(&ctx).unwrap();
        assert_eq!(
            expression.evaluate(&mut Exchange::new()).unwrap(),
            Value::Boolean(false)
        );
    }

    #[test]
    fn test_converting_expression_is_lazy() {
        let ctx = context();
        let expression = ConvertingExpression::new(
            Box::new(Fixed::new(|| {
                Value::Sequence(LazySequence::from_values(vec![
                    Value::from("1"),
                    Value::from("two"),
                ]))
            })),
            ValueType::Integer,
        );
        expression.init(&ctx).unwrap();

        let mut seq = expression
            .evaluate(&mut Exchange::new())
            .unwrap()
            .into_sequence()
            .unwrap();
        assert_eq!(seq.next().unwrap().unwrap(), Value::Integer(1));
        assert!(matches!(
            seq.next().unwrap(),
            Err(ExpressionError::Coercion(_))
        ));
    }

    #[test]
    fn test_unbound_expression_fails() {
        let expression = ConvertingExpression::new(
            Box::new(Fixed::new(|| Value::from("1"))),
            ValueType::Integer,
        );
        assert_eq!(
            expression.evaluate(&mut Exchange::new()).unwrap_err(),
            ExpressionError::NotInitialized
        );
    }

    #[test]
    fn test_rebinding_to_other_context_fails() {
        let expression = ConvertingExpression::new(
            Box::new(Fixed::new(|| Value::from("1"))),
            ValueType::Integer,
        );
        expression.init(&context()).unwrap();
        assert_eq!(
            expression.init(&context()).unwrap_err(),
            ExpressionError::AlreadyInitialized
        );
    }
}
