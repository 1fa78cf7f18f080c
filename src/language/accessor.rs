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

//! Languages that read one named slot off the exchange

use super::{Language, bind_expression, require_name, truthiness_predicate};
use crate::error::ExpressionResult;
use crate::expression::{ContextBinding, EvaluationContext, Expression, Predicate};
use crate::model::{Exchange, Value};
use std::fmt;
use std::sync::Arc;

/// Prefix marking a source that names an external resource holding the name
pub const RESOURCE_PREFIX: &str = "resource:";

/// Which part of the exchange an accessor reads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scope {
    /// The message body
    Body,
    /// A header
    Header,
    /// An exchange property
    Property,
    /// A variable
    Variable,
}

impl Scope {
    /// The language name reading this scope
    pub fn language_name(&self) -> &'static str {
        match self {
            Scope::Body => "body",
            Scope::Header => "header",
            Scope::Property => "exchangeProperty",
            Scope::Variable => "variable",
        }
    }
}

/// Reads a body, header, property or variable without modifying the exchange
#[derive(Debug)]
pub struct AccessorExpression {
    scope: Scope,
    name: String,
    binding: ContextBinding,
}

impl AccessorExpression {
    /// Read the named slot in `scope`
    pub fn new(scope: Scope, name: impl Into<String>) -> Self {
        Self {
            scope,
            name: name.into(),
            binding: ContextBinding::new(),
        }
    }

    /// Read the body
    pub fn body() -> Self {
        Self::new(Scope::Body, "")
    }

    /// The scope read
    pub fn scope(&self) -> Scope {
        self.scope
    }

    /// The slot name; empty for the body
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Expression for AccessorExpression {
    fn binding(&self) -> &ContextBinding {
        &self.binding
    }

    fn evaluate(&self, exchange: &mut Exchange) -> ExpressionResult<Value> {
        self.binding.get()?;
        let value = match self.scope {
            Scope::Body => Some(exchange.body()),
            Scope::Header => exchange.header(&self.name),
            Scope::Property => exchange.property(&self.name),
            Scope::Variable => exchange.variable(&self.name),
        };
        Ok(value.cloned().unwrap_or_default())
    }
}

/// The `header`, `exchangeProperty` and `variable` languages
pub struct AccessorLanguage {
    scope: Scope,
    context: Arc<EvaluationContext>,
}

impl AccessorLanguage {
    /// Create an accessor language over `scope`
    pub fn new(scope: Scope, context: Arc<EvaluationContext>) -> Self {
        Self { scope, context }
    }

    /// Factory for the `header` language
    pub fn header(context: &Arc<EvaluationContext>) -> Arc<dyn Language> {
        Arc::new(Self::new(Scope::Header, context.clone()))
    }

    /// Factory for the `exchangeProperty` language
    pub fn exchange_property(context: &Arc<EvaluationContext>) -> Arc<dyn Language> {
        Arc::new(Self::new(Scope::Property, context.clone()))
    }

    /// Factory for the `variable` language
    pub fn variable(context: &Arc<EvaluationContext>) -> Arc<dyn Language> {
        Arc::new(Self::new(Scope::Variable, context.clone()))
    }

    /// Resolve the slot name from source text
    ///
    /// A `resource:` source is loaded once, here, and its trimmed content
    /// becomes the name.
    fn resolve_name(&self, source: &str) -> ExpressionResult<String> {
        let language = self.scope.language_name();
        let name = require_name(language, source)?;
        match name.strip_prefix(RESOURCE_PREFIX) {
            Some(uri) => {
                let loaded = self.context.resource_loader().load(uri.trim())?;
                require_name(language, &loaded)
            }
            None => Ok(name),
        }
    }
}

impl fmt::Debug for AccessorLanguage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessorLanguage")
            .field("scope", &self.scope)
            .finish_non_exhaustive()
    }
}

impl Language for AccessorLanguage {
    fn name(&self) -> &str {
        self.scope.language_name()
    }

    fn create_expression(&self, source: &str) -> ExpressionResult<Arc<dyn Expression>> {
        let name = self.resolve_name(source)?;
        bind_expression(AccessorExpression::new(self.scope, name), &self.context)
    }

    fn create_predicate(&self, source: &str) -> ExpressionResult<Arc<dyn Predicate>> {
        let expression = self.create_expression(source)?;
        truthiness_predicate(expression, &self.context)
    }
}
