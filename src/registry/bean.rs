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

//! Name-based lookup of beans used by reference languages

use crate::expression::{Expression, Predicate};
use crate::model::Value;
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use std::sync::Arc;

/// External name to object lookup table
///
/// Owned by the host engine. Implementations must be safe to query from many
/// threads at once.
pub trait Registry: Send + Sync {
    /// Look up an object by name
    fn lookup_by_name(&self, name: &str) -> Option<Bean>;
}

/// An object stored in a [`Registry`]
///
/// The variants enumerate what a looked-up object can be used as, so callers
/// match on capabilities instead of probing types.
#[derive(Debug, Clone)]
pub enum Bean {
    /// Usable only as an expression
    Expression(Arc<dyn Expression>),
    /// Usable only as a predicate
    Predicate(Arc<dyn Predicate>),
    /// Usable as either shape
    Dual {
        /// The expression view
        expression: Arc<dyn Expression>,
        /// The predicate view
        predicate: Arc<dyn Predicate>,
    },
    /// Any other object
    Value(Value),
}

impl Bean {
    /// The expression view of this bean, if it has one
    pub fn as_expression(&self) -> Option<&Arc<dyn Expression>> {
        match self {
            Bean::Expression(expression) | Bean::Dual { expression, .. } => Some(expression),
            _ => None,
        }
    }

    /// The predicate view of this bean, if it has one
    pub fn as_predicate(&self) -> Option<&Arc<dyn Predicate>> {
        match self {
            Bean::Predicate(predicate) | Bean::Dual { predicate, .. } => Some(predicate),
            _ => None,
        }
    }

    /// Short description of the bean's shape for error messages
    pub fn kind(&self) -> &'static str {
        match self {
            Bean::Expression(_) => "expression",
            Bean::Predicate(_) => "predicate",
            Bean::Dual { .. } => "expression and predicate",
            Bean::Value(_) => "value",
        }
    }
}

/// In-memory [`Registry`] backed by a hash map
#[derive(Debug, Default)]
pub struct SimpleRegistry {
    beans: RwLock<FxHashMap<String, Bean>>,
}

impl SimpleRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `bean` under `name`, returning the previous binding
    pub fn bind(&self, name: impl Into<String>, bean: Bean) -> Option<Bean> {
        self.beans.write().insert(name.into(), bean)
    }

    /// Bind an expression under `name`
    pub fn bind_expression(
        &self,
        name: impl Into<String>,
        expression: Arc<dyn Expression>,
    ) -> Option<Bean> {
        self.bind(name, Bean::Expression(expression))
    }

    /// Bind a predicate under `name`
    pub fn bind_predicate(
        &self,
        name: impl Into<String>,
        predicate: Arc<dyn Predicate>,
    ) -> Option<Bean> {
        self.bind(name, Bean::Predicate(predicate))
    }

    /// Bind a plain value under `name`
    pub fn bind_value(&self, name: impl Into<String>, value: impl Into<Value>) -> Option<Bean> {
        self.bind(name, Bean::Value(value.into()))
    }

    /// Remove the binding for `name`
    pub fn unbind(&self, name: &str) -> Option<Bean> {
        self.beans.write().remove(name)
    }

    /// Number of bound names
    pub fn len(&self) -> usize {
        self.beans.read().len()
    }

    /// Check if nothing is bound
    pub fn is_empty(&self) -> bool {
        self.beans.read().is_empty()
    }
}

impl Registry for SimpleRegistry {
    fn lookup_by_name(&self, name: &str) -> Option<Bean> {
        self.beans.read().get(name).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expression::{ContextBinding, ExpressionPredicate};
    use crate::error::ExpressionResult;
    use crate::model::Exchange;

    #[derive(Debug, Default)]
    struct Body {
        binding: ContextBinding,
    }

    impl Expression for Body {
        fn binding(&self) -> &ContextBinding {
            &self.binding
        }

        fn evaluate(&self, exchange: &mut Exchange) -> ExpressionResult<Value> {
            Ok(exchange.body().clone())
        }
    }

    #[test]
    fn test_bind_and_lookup() {
        let registry = SimpleRegistry::new();
        assert!(registry.is_empty());

        let expression: Arc<dyn Expression> = Arc::new(Body::default());
        registry.bind_expression("body", expression.clone());
        registry.bind_value("answer", 42i64);

        let bean = registry.lookup_by_name("body").unwrap();
        assert!(Arc::ptr_eq(bean.as_expression().unwrap(), &expression));
        assert!(bean.as_predicate().is_none());

        let bean = registry.lookup_by_name("answer").unwrap();
        assert_eq!(bean.kind(), "value");
        assert!(bean.as_expression().is_none());

        assert!(registry.lookup_by_name("missing").is_none());
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_dual_bean_exposes_both_views() {
        let expression: Arc<dyn Expression> = Arc::new(Body::default());
        let predicate: Arc<dyn Predicate> = Arc::new(ExpressionPredicate::new(expression.clone()));
        let bean = Bean::Dual {
            expression,
            predicate,
        };
        assert!(bean.as_expression().is_some());
        assert!(bean.as_predicate().is_some());
    }

    #[test]
    fn test_unbind() {
        let registry = SimpleRegistry::new();
        registry.bind_value("x", "y");
        assert!(registry.unbind("x").is_some());
        assert!(registry.unbind("x").is_none());
        assert!(registry.is_empty());
    }
}
