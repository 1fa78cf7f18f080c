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

//! The two evaluator shapes every language compiles to
//!
//! An [`Expression`] maps an exchange to a value, a [`Predicate`] maps it to a
//! boolean. Both are compiled once, bound once to an [`EvaluationContext`],
//! and then shared across every exchange that flows through the route. Any
//! per-call state lives in the returned value, never in the instance.

pub mod adapters;
pub mod context;

pub use adapters::{ConvertingExpression, ExpressionPredicate, PredicateExpression};
pub use context::{ContextBinding, EvaluationContext, FileResourceLoader, ResourceLoader};

use crate::error::ExpressionResult;
use crate::model::{Exchange, Value, ValueType};
use std::fmt;
use std::sync::Arc;

/// A compiled, reusable function from an exchange to a value
pub trait Expression: Send + Sync + fmt::Debug {
    /// The slot holding this instance's evaluation context
    fn binding(&self) -> &ContextBinding;

    /// Bind this expression (and any delegates it owns) to `context`
    ///
    /// Must be called before the first evaluation. Binding the same context
    /// again is a no-op; a different context is rejected.
    fn init(&self, context: &Arc<EvaluationContext>) -> ExpressionResult<()> {
        self.binding().bind(context)
    }

    /// Evaluate against one exchange
    fn evaluate(&self, exchange: &mut Exchange) -> ExpressionResult<Value>;

    /// Evaluate and coerce the result to `target`
    fn evaluate_as(&self, exchange: &mut Exchange, target: ValueType) -> ExpressionResult<Value> {
        let converter = *self.binding().get()?.converter();
        let value = self.evaluate(exchange)?;
        Ok(converter.convert(value, target)?)
    }
}

/// A compiled, reusable function from an exchange to a boolean
pub trait Predicate: Send + Sync + fmt::Debug {
    /// The slot holding this instance's evaluation context
    fn binding(&self) -> &ContextBinding;

    /// Bind this predicate (and any delegates it owns) to `context`
    fn init(&self, context: &Arc<EvaluationContext>) -> ExpressionResult<()> {
        self.binding().bind(context)
    }

    /// Test one exchange
    fn matches(&self, exchange: &mut Exchange) -> ExpressionResult<bool>;
}
