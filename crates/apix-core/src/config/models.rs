//! Model resolution configuration.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Settings for resolving a repository's model by naming convention.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelsConfig {
    /// Prefix prepended to a model name to form its registry key.
    #[serde(default = "default_namespace")]
    pub namespace: String,
    /// Model name to record table, for stores that keep one table per model.
    #[serde(default)]
    pub tables: BTreeMap<String, String>,
}

impl Default for ModelsConfig {
    fn default() -> Self {
        Self {
            namespace: default_namespace(),
            tables: BTreeMap::new(),
        }
    }
}

fn default_namespace() -> String {
    "app.models.".to_string()
}
