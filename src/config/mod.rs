//! Configuration
//!
//! Layered configuration for storage, tree building, retrieval and logging.
//! See [`ConfigLoader`] for source precedence.

mod facade;
pub mod merge;
pub mod paths;
pub mod sources;
pub mod workspace;

pub use facade::ConfigLoader;
pub use paths::xdg_root as xdg;
pub use workspace::storage_paths::StorageConfig;

use crate::logging::LoggingConfig;
use crate::metrics::MetricSchema;
use crate::tree::subtree::DEFAULT_ROOT_SENTINEL;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BugmapConfig {
    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub tree: TreeConfig,

    #[serde(default)]
    pub retrieval: RetrievalConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl BugmapConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.tree.root_sentinel.is_empty() {
            return Err("tree.root_sentinel cannot be empty".to_string());
        }
        if self.retrieval.store_timeout_ms == 0 {
            return Err("retrieval.store_timeout_ms must be greater than 0".to_string());
        }
        self.tree.metrics.validate()
    }
}

fn default_root_sentinel() -> String {
    DEFAULT_ROOT_SENTINEL.to_string()
}

/// Tree building and addressing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeConfig {
    /// Path naming the whole tree of a query scope
    #[serde(default = "default_root_sentinel")]
    pub root_sentinel: String,

    /// Characters stripped from a leaf path before the metric table lookup
    #[serde(default)]
    pub metric_key_prefix_len: usize,

    #[serde(default)]
    pub metrics: MetricSchema,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            root_sentinel: default_root_sentinel(),
            metric_key_prefix_len: 0,
            metrics: MetricSchema::default(),
        }
    }
}

fn default_store_timeout_ms() -> u64 {
    30_000
}

/// Store access during build and retrieval
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Deadline for each store call
    #[serde(default = "default_store_timeout_ms")]
    pub store_timeout_ms: u64,
}

impl RetrievalConfig {
    pub fn store_timeout(&self) -> Duration {
        Duration::from_millis(self.store_timeout_ms)
    }
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            store_timeout_ms: default_store_timeout_ms(),
        }
    }
}
