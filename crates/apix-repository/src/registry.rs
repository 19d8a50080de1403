//! Convention-based model lookup.
//!
//! A repository named `PostRepository` manages the `Post` model. The
//! registry maps namespaced model names (`app.models.Post`) to factories
//! and builds the model on demand.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use apix_core::config::ModelsConfig;
use apix_core::error::AppError;
use apix_core::result::AppResult;
use apix_core::traits::Model;

/// Suffix stripped from repository names.
const REPOSITORY_SUFFIX: &str = "Repository";

type ModelFactory<M> = Box<dyn Fn() -> AppResult<M> + Send + Sync>;

/// Factories for the models of one store, keyed by qualified model name.
pub struct ModelRegistry<M: Model> {
    namespace: String,
    factories: HashMap<String, ModelFactory<M>>,
}

impl<M: Model> ModelRegistry<M> {
    /// Creates an empty registry for the given namespace prefix.
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            factories: HashMap::new(),
        }
    }

    /// Creates an empty registry using the configured namespace.
    pub fn from_config(config: &ModelsConfig) -> Self {
        Self::new(config.namespace.clone())
    }

    /// The namespace prefix.
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Registers a factory under a bare model name such as `"Post"`.
    ///
    /// A later registration under the same name replaces the earlier one.
    pub fn register<F>(&mut self, model_name: &str, factory: F) -> &mut Self
    where
        F: Fn() -> AppResult<M> + Send + Sync + 'static,
    {
        let key = format!("{}{}", self.namespace, model_name);
        debug!(model = %key, "Registering model");
        self.factories.insert(key, Box::new(factory));
        self
    }

    /// Whether a bare model name is registered.
    pub fn contains(&self, model_name: &str) -> bool {
        self.factories
            .contains_key(&format!("{}{}", self.namespace, model_name))
    }

    /// Derives the bare model name from a repository name.
    ///
    /// Any module path (`blog::PostRepository`, `blog.PostRepository`) is
    /// dropped before the `Repository` suffix is stripped.
    pub fn model_name(repository_name: &str) -> AppResult<String> {
        let base = repository_name
            .rsplit("::")
            .next()
            .unwrap_or(repository_name)
            .rsplit('.')
            .next()
            .unwrap_or(repository_name)
            .trim();
        let name = base.strip_suffix(REPOSITORY_SUFFIX).unwrap_or(base);
        if name.is_empty() {
            return Err(AppError::configuration(format!(
                "Cannot derive a model name from repository '{repository_name}'"
            )));
        }
        Ok(name.to_string())
    }

    /// The registry key a repository name resolves to.
    pub fn qualified_name(&self, repository_name: &str) -> AppResult<String> {
        Ok(format!(
            "{}{}",
            self.namespace,
            Self::model_name(repository_name)?
        ))
    }

    /// Builds the model for a repository name.
    pub fn resolve(&self, repository_name: &str) -> AppResult<Arc<M>> {
        let key = self.qualified_name(repository_name)?;
        let factory = self.factories.get(&key).ok_or_else(|| {
            AppError::configuration(format!(
                "No model '{key}' registered for repository '{repository_name}'"
            ))
        })?;

        let model = factory().map_err(|e| {
            AppError::configuration(format!("Failed to instantiate model '{key}': {e}"))
        })?;

        debug!(model = %key, repository = repository_name, "Resolved model");
        Ok(Arc::new(model))
    }
}

impl<M: Model> std::fmt::Debug for ModelRegistry<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<&String> = self.factories.keys().collect();
        names.sort();
        f.debug_struct("ModelRegistry")
            .field("namespace", &self.namespace)
            .field("models", &names)
            .finish()
    }
}
