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

//! Evaluation context and the one-time binding to it

use crate::config::EngineConfig;
use crate::error::{ExpressionError, ExpressionResult};
use crate::model::{Charset, TypeConverter};
use crate::registry::Registry;
use std::fmt;
use std::sync::{Arc, OnceLock};

/// Loads static external resources referenced from expression sources
pub trait ResourceLoader: Send + Sync {
    /// Load the resource at `uri` as text
    fn load(&self, uri: &str) -> ExpressionResult<String>;
}

/// Loads `file:` URIs and bare paths from the local filesystem
#[derive(Debug, Default, Clone, Copy)]
pub struct FileResourceLoader;

impl ResourceLoader for FileResourceLoader {
    fn load(&self, uri: &str) -> ExpressionResult<String> {
        let path = uri.strip_prefix("file:").unwrap_or(uri);
        log::debug!("Loading expression resource from {path}");
        std::fs::read_to_string(path).map_err(|err| ExpressionError::Io {
            message: format!("cannot load resource '{uri}': {err}"),
        })
    }
}

/// Engine-wide facilities available to every bound expression
pub struct EvaluationContext {
    config: EngineConfig,
    converter: TypeConverter,
    registry: Arc<dyn Registry>,
    resource_loader: Arc<dyn ResourceLoader>,
}

impl EvaluationContext {
    /// Create a context with the default configuration
    pub fn new(registry: Arc<dyn Registry>) -> Arc<Self> {
        let config = EngineConfig::default();
        Arc::new(Self {
            converter: TypeConverter::new(config.default_charset),
            config,
            registry,
            resource_loader: Arc::new(FileResourceLoader),
        })
    }

    /// Create a context with a custom configuration
    pub fn with_config(
        config: EngineConfig,
        registry: Arc<dyn Registry>,
    ) -> ExpressionResult<Arc<Self>> {
        Self::with_resource_loader(config, registry, Arc::new(FileResourceLoader))
    }

    /// Create a context with a custom configuration and resource loader
    pub fn with_resource_loader(
        config: EngineConfig,
        registry: Arc<dyn Registry>,
        resource_loader: Arc<dyn ResourceLoader>,
    ) -> ExpressionResult<Arc<Self>> {
        config.validate()?;
        Ok(Arc::new(Self {
            converter: TypeConverter::new(config.default_charset),
            config,
            registry,
            resource_loader,
        }))
    }

    /// Engine configuration
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Type converter using the configured charset
    pub fn converter(&self) -> &TypeConverter {
        &self.converter
    }

    /// Default charset for decoding bodies
    pub fn charset(&self) -> Charset {
        self.config.default_charset
    }

    /// Registry used for name-based lookups
    pub fn registry(&self) -> &Arc<dyn Registry> {
        &self.registry
    }

    /// Loader for static external resources
    pub fn resource_loader(&self) -> &Arc<dyn ResourceLoader> {
        &self.resource_loader
    }
}

impl fmt::Debug for EvaluationContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EvaluationContext")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Holds the evaluation context an expression was initialized with
///
/// Binding is one-shot: the same context may be bound again (no-op), a
/// different one is rejected.
#[derive(Debug, Default)]
pub struct ContextBinding {
    context: OnceLock<Arc<EvaluationContext>>,
}

impl ContextBinding {
    /// Create an unbound slot
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind to `context`
    pub fn bind(&self, context: &Arc<EvaluationContext>) -> ExpressionResult<()> {
        let current = self.context.get_or_init(|| Arc::clone(context));
        if Arc::ptr_eq(current, context) {
            Ok(())
        } else {
            Err(ExpressionError::AlreadyInitialized)
        }
    }

    /// The bound context
    pub fn get(&self) -> ExpressionResult<&Arc<EvaluationContext>> {
        self.context.get().ok_or(ExpressionError::NotInitialized)
    }

    /// Whether a context has been bound
    pub fn is_bound(&self) -> bool {
        self.context.get().is_some()
    }
}
