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

//! The unit of work expressions are evaluated against

use super::value::Value;
use crate::error::ExpressionError;
use rustc_hash::FxHashMap;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_EXCHANGE_ID: AtomicU64 = AtomicU64::new(1);

/// A message in transit: body, headers, properties and variables
///
/// Expressions borrow the exchange mutably for the duration of one
/// evaluation and never keep it.
#[derive(Debug, Clone)]
pub struct Exchange {
    id: String,
    body: Value,
    headers: FxHashMap<String, Value>,
    properties: FxHashMap<String, Value>,
    variables: FxHashMap<String, Value>,
    exception: Option<ExpressionError>,
}

impl Default for Exchange {
    fn default() -> Self {
        Self::new()
    }
}

impl Exchange {
    /// Create an exchange with an empty body
    pub fn new() -> Self {
        let seq = NEXT_EXCHANGE_ID.fetch_add(1, Ordering::Relaxed);
        Self {
            id: format!("ID-{seq:08}"),
            body: Value::Null,
            headers: FxHashMap::default(),
            properties: FxHashMap::default(),
            variables: FxHashMap::default(),
            exception: None,
        }
    }

    /// Create an exchange carrying `body`
    pub fn with_body(body: impl Into<Value>) -> Self {
        let mut exchange = Self::new();
        exchange.body = body.into();
        exchange
    }

    /// Unique identifier of this exchange
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Borrow the body
    pub fn body(&self) -> &Value {
        &self.body
    }

    /// Replace the body
    pub fn set_body(&mut self, body: impl Into<Value>) {
        self.body = body.into();
    }

    /// Take the body out, leaving null behind
    pub fn take_body(&mut self) -> Value {
        std::mem::take(&mut self.body)
    }

    /// Get a header
    pub fn header(&self, name: &str) -> Option<&Value> {
        self.headers.get(name)
    }

    /// Set a header
    pub fn set_header(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.headers.insert(name.into(), value.into());
    }

    /// Remove a header
    pub fn remove_header(&mut self, name: &str) -> Option<Value> {
        self.headers.remove(name)
    }

    /// All headers
    pub fn headers(&self) -> &FxHashMap<String, Value> {
        &self.headers
    }

    /// Get an exchange property
    pub fn property(&self, name: &str) -> Option<&Value> {
        self.properties.get(name)
    }

    /// Set an exchange property
    pub fn set_property(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.properties.insert(name.into(), value.into());
    }

    /// Remove an exchange property
    pub fn remove_property(&mut self, name: &str) -> Option<Value> {
        self.properties.remove(name)
    }

    /// All exchange properties
    pub fn properties(&self) -> &FxHashMap<String, Value> {
        &self.properties
    }

    /// Get a variable
    pub fn variable(&self, name: &str) -> Option<&Value> {
        self.variables.get(name)
    }

    /// Set a variable
    pub fn set_variable(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.variables.insert(name.into(), value.into());
    }

    /// Remove a variable
    pub fn remove_variable(&mut self, name: &str) -> Option<Value> {
        self.variables.remove(name)
    }

    /// All variables
    pub fn variables(&self) -> &FxHashMap<String, Value> {
        &self.variables
    }

    /// Attach a failure to this exchange
    pub fn set_exception(&mut self, error: ExpressionError) {
        self.exception = Some(error);
    }

    /// The failure attached to this exchange, if any
    pub fn exception(&self) -> Option<&ExpressionError> {
        self.exception.as_ref()
    }

    /// Remove and return the attached failure
    pub fn take_exception(&mut self) -> Option<ExpressionError> {
        self.exception.take()
    }

    /// Whether a failure is attached
    pub fn is_failed(&self) -> bool {
        self.exception.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_unique() {
        let a = Exchange::new();
        let b = Exchange::new();
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn test_scopes_are_separate() {
        let mut exchange = Exchange::with_body("hello");
        exchange.set_header("k", "header");
        exchange.set_property("k", "property");
        exchange.set_variable("k", "variable");

        assert_eq!(exchange.header("k"), Some(&Value::from("header")));
        assert_eq!(exchange.property("k"), Some(&Value::from("property")));
        assert_eq!(exchange.variable("k"), Some(&Value::from("variable")));
        assert_eq!(exchange.take_body(), Value::from("hello"));
        assert!(exchange.body().is_null());
    }

    #[test]
    fn test_exception_slot() {
        let mut exchange = Exchange::new();
        assert!(!exchange.is_failed());
        exchange.set_exception(ExpressionError::evaluation("boom"));
        assert!(exchange.is_failed());
        assert!(exchange.take_exception().is_some());
        assert!(exchange.exception().is_none());
    }
}
