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

//! The `ref` language: expressions and predicates looked up by name
//!
//! A plain source is resolved once, at compile time, and the registry's own
//! instance is returned. A source containing `${...}` is a template that
//! computes the name from each exchange; it is re-rendered and re-resolved on
//! every evaluation.

use super::{Language, bind_expression, require_name};
use crate::error::{ExpressionError, ExpressionResult};
use crate::expression::{
    ContextBinding, EvaluationContext, Expression, ExpressionPredicate, Predicate,
    PredicateExpression,
};
use crate::model::{Exchange, Value};
use crate::parser::{Template, contains_function, parse_template};
use std::fmt;
use std::sync::Arc;

/// What a registry name resolved to
#[derive(Debug, Clone)]
pub enum Resolved {
    /// An expression; preferred when a bean offers both shapes
    Expression(Arc<dyn Expression>),
    /// A predicate
    Predicate(Arc<dyn Predicate>),
}

impl Resolved {
    /// View as an expression, wrapping a predicate as a boolean expression
    pub fn into_expression(self) -> Arc<dyn Expression> {
        match self {
            Resolved::Expression(expression) => expression,
            Resolved::Predicate(predicate) => Arc::new(PredicateExpression::new(predicate)),
        }
    }

    /// View as a predicate, judging an expression by truthiness
    pub fn into_predicate(self) -> Arc<dyn Predicate> {
        match self {
            Resolved::Expression(expression) => Arc::new(ExpressionPredicate::new(expression)),
            Resolved::Predicate(predicate) => predicate,
        }
    }
}

/// Look `name` up in the context's registry
///
/// Fails with a lookup error naming the reference when it is absent or bound
/// to something that is neither an expression nor a predicate.
pub fn resolve_reference(context: &EvaluationContext, name: &str) -> ExpressionResult<Resolved> {
    let Some(bean) = context.registry().lookup_by_name(name) else {
        return Err(ExpressionError::lookup(name, "no bean bound under this name"));
    };
    if let Some(expression) = bean.as_expression() {
        return Ok(Resolved::Expression(expression.clone()));
    }
    match bean.as_predicate() {
        Some(predicate) => Ok(Resolved::Predicate(predicate.clone())),
        None => Err(ExpressionError::lookup(
            name,
            format!(
                "bound to a {}, not an expression or predicate",
                bean.kind()
            ),
        )),
    }
}

/// Bind a registry bean unless another context already owns it
fn init_shared_expression(
    expression: &Arc<dyn Expression>,
    context: &Arc<EvaluationContext>,
) -> ExpressionResult<()> {
    if expression.binding().is_bound() {
        return Ok(());
    }
    expression.init(context)
}

fn init_shared_predicate(
    predicate: &Arc<dyn Predicate>,
    context: &Arc<EvaluationContext>,
) -> ExpressionResult<()> {
    if predicate.binding().is_bound() {
        return Ok(());
    }
    predicate.init(context)
}

/// Reference whose target name is computed per exchange
#[derive(Debug)]
pub struct DynamicReference {
    template: Template,
    binding: ContextBinding,
}

impl DynamicReference {
    /// Create a dynamic reference from a parsed name template
    pub fn new(template: Template) -> Self {
        Self {
            template,
            binding: ContextBinding::new(),
        }
    }

    /// The name template
    pub fn template(&self) -> &Template {
        &self.template
    }
}

impl Expression for DynamicReference {
    fn binding(&self) -> &ContextBinding {
        &self.binding
    }

    fn evaluate(&self, exchange: &mut Exchange) -> ExpressionResult<Value> {
        let context = self.binding.get()?;
        let rendered = self.template.render(exchange, context.converter())?;
        let name = rendered.trim();
        log::trace!("Dynamic reference '{}' resolved to '{name}'", self.template.source());

        let delegate = resolve_reference(context, name)?.into_expression();
        init_shared_expression(&delegate, context)?;
        delegate.evaluate(exchange)
    }
}

/// The `ref` language
///
/// Registry beans are bound to this language's context on first use. A bean
/// already bound to another context is used with that context.
pub struct RefLanguage {
    context: Arc<EvaluationContext>,
}

impl RefLanguage {
    /// Create the language over `context`
    pub fn new(context: Arc<EvaluationContext>) -> Self {
        Self { context }
    }

    /// Factory for the standard table
    pub fn factory(context: &Arc<EvaluationContext>) -> Arc<dyn Language> {
        Arc::new(Self::new(context.clone()))
    }

    fn compile(&self, source: &str) -> ExpressionResult<Reference> {
        let source = require_name("ref", source)?;
        if contains_function(&source) {
            let template = parse_template(&source)?;
            return Ok(Reference::Dynamic(template));
        }
        let resolved = resolve_reference(&self.context, &source)?;
        log::debug!("Resolved static reference '{source}'");
        Ok(Reference::Static(resolved))
    }
}

enum Reference {
    Static(Resolved),
    Dynamic(Template),
}

impl fmt::Debug for RefLanguage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RefLanguage").finish_non_exhaustive()
    }
}

impl Language for RefLanguage {
    fn name(&self) -> &str {
        "ref"
    }

    fn create_expression(&self, source: &str) -> ExpressionResult<Arc<dyn Expression>> {
        match self.compile(source)? {
            Reference::Static(resolved) => {
                let expression = resolved.into_expression();
                init_shared_expression(&expression, &self.context)?;
                Ok(expression)
            }
            Reference::Dynamic(template) => {
                bind_expression(DynamicReference::new(template), &self.context)
            }
        }
    }

    fn create_predicate(&self, source: &str) -> ExpressionResult<Arc<dyn Predicate>> {
        let predicate = match self.compile(source)? {
            Reference::Static(resolved) => resolved.into_predicate(),
            Reference::Dynamic(template) => {
                let expression: Arc<dyn Expression> = Arc::new(DynamicReference::new(template));
                Arc::new(ExpressionPredicate::new(expression))
            }
        };
        init_shared_predicate(&predicate, &self.context)?;
        Ok(predicate)
    }
}
