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

//! The `simple` language: `${...}` templates

use super::{Language, bind_expression, truthiness_predicate};
use crate::error::ExpressionResult;
use crate::expression::{ContextBinding, EvaluationContext, Expression, Predicate};
use crate::model::{Exchange, Value};
use crate::parser::{Template, parse_template};
use std::fmt;
use std::sync::Arc;

/// A compiled template
#[derive(Debug)]
pub struct SimpleExpression {
    template: Template,
    binding: ContextBinding,
}

impl SimpleExpression {
    /// Parse `source` into an unbound expression
    pub fn parse(source: &str) -> ExpressionResult<Self> {
        Ok(Self {
            template: parse_template(source)?,
            binding: ContextBinding::new(),
        })
    }

    /// The parsed template
    pub fn template(&self) -> &Template {
        &self.template
    }
}

impl Expression for SimpleExpression {
    fn binding(&self) -> &ContextBinding {
        &self.binding
    }

    fn evaluate(&self, exchange: &mut Exchange) -> ExpressionResult<Value> {
        let context = self.binding.get()?;
        self.template.evaluate(exchange, context.converter())
    }
}

/// The `simple` language
pub struct SimpleLanguage {
    context: Arc<EvaluationContext>,
}

impl SimpleLanguage {
    /// Create the language over `context`
    pub fn new(context: Arc<EvaluationContext>) -> Self {
        Self { context }
    }

    /// Factory for the standard table
    pub fn factory(context: &Arc<EvaluationContext>) -> Arc<dyn Language> {
        Arc::new(Self::new(context.clone()))
    }
}

impl fmt::Debug for SimpleLanguage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SimpleLanguage").finish_non_exhaustive()
    }
}

impl Language for SimpleLanguage {
    fn name(&self) -> &str {
        "simple"
    }

    fn create_expression(&self, source: &str) -> ExpressionResult<Arc<dyn Expression>> {
        bind_expression(SimpleExpression::parse(source)?, &self.context)
    }

    fn create_predicate(&self, source: &str) -> ExpressionResult<Arc<dyn Predicate>> {
        let expression = self.create_expression(source)?;
        truthiness_predicate(expression, &self.context)
    }
}
