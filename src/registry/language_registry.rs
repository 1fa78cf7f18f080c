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

//! Name-keyed table of languages
//!
//! Built once at process start from an explicit factory table and treated as
//! read-only afterwards. Lookups take `&self` and are safe from any thread.

use crate::error::{ExpressionError, ExpressionResult};
use crate::expression::{EvaluationContext, Expression, Predicate};
use crate::language::{Language, LanguageOption, standard_languages};
use once_cell::sync::OnceCell;
use rustc_hash::FxHashMap;
use std::fmt;
use std::sync::Arc;

/// Constructs a language bound to an evaluation context
pub type LanguageFactory = fn(&Arc<EvaluationContext>) -> Arc<dyn Language>;

static GLOBAL_LANGUAGES: OnceCell<LanguageRegistry> = OnceCell::new();

/// Registry of languages keyed by name
pub struct LanguageRegistry {
    context: Arc<EvaluationContext>,
    languages: FxHashMap<String, Arc<dyn Language>>,
}

impl LanguageRegistry {
    /// Create an empty registry whose languages compile against `context`
    pub fn new(context: Arc<EvaluationContext>) -> Self {
        Self {
            context,
            languages: FxHashMap::default(),
        }
    }

    /// Create a registry holding every built-in language
    pub fn standard(context: Arc<EvaluationContext>) -> ExpressionResult<Self> {
        let mut registry = Self::new(context);
        for factory in standard_languages() {
            registry.register_factory(*factory)?;
        }
        Ok(registry)
    }

    /// Register a language instance
    ///
    /// Names are unique; registering a second language under a taken name is
    /// rejected.
    pub fn register(&mut self, language: Arc<dyn Language>) -> ExpressionResult<()> {
        let name = language.name().to_string();
        if self.languages.contains_key(&name) {
            return Err(ExpressionError::configuration(format!(
                "language '{name}' is already registered"
            )));
        }
        log::debug!("Registered language '{name}'");
        self.languages.insert(name, language);
        Ok(())
    }

    /// Construct a language from `factory` and register it
    pub fn register_factory(&mut self, factory: LanguageFactory) -> ExpressionResult<()> {
        let language = factory(&self.context);
        self.register(language)
    }

    /// Get a language by name
    pub fn get(&self, name: &str) -> Option<&Arc<dyn Language>> {
        self.languages.get(name)
    }

    /// Get a language by name, failing when it is not registered
    pub fn resolve(&self, name: &str) -> ExpressionResult<Arc<dyn Language>> {
        self.get(name)
            .cloned()
            .ok_or_else(|| ExpressionError::unknown_language(name))
    }

    /// Check whether a language is registered under `name`
    pub fn contains(&self, name: &str) -> bool {
        self.languages.contains_key(name)
    }

    /// Registered language names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.languages.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// The context every registered language compiles against
    pub fn context(&self) -> &Arc<EvaluationContext> {
        &self.context
    }

    /// Compile `source` with the named language
    pub fn create_expression(
        &self,
        language: &str,
        source: &str,
        options: &[LanguageOption],
    ) -> ExpressionResult<Arc<dyn Expression>> {
        let language = self.resolve(language)?;
        if options.is_empty() {
            language.create_expression(source)
        } else {
            language.create_expression_with_options(source, options)
        }
    }

    /// Compile `source` as a predicate with the named language
    pub fn create_predicate(
        &self,
        language: &str,
        source: &str,
        options: &[LanguageOption],
    ) -> ExpressionResult<Arc<dyn Predicate>> {
        let language = self.resolve(language)?;
        if options.is_empty() {
            language.create_predicate(source)
        } else {
            language.create_predicate_with_options(source, options)
        }
    }

    /// Install `registry` as the process-wide table
    ///
    /// Succeeds once per process; later calls fail with
    /// [`ExpressionError::AlreadyInitialized`]. There is no teardown.
    pub fn install_global(registry: LanguageRegistry) -> ExpressionResult<&'static LanguageRegistry> {
        GLOBAL_LANGUAGES
            .set(registry)
            .map_err(|_| ExpressionError::AlreadyInitialized)?;
        log::debug!("Installed global language registry");
        Self::global()
    }

    /// The process-wide table
    pub fn global() -> ExpressionResult<&'static LanguageRegistry> {
        GLOBAL_LANGUAGES.get().ok_or(ExpressionError::NotInitialized)
    }
}

impl fmt::Debug for LanguageRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LanguageRegistry")
            .field("languages", &self.names())
            .finish()
    }
}
