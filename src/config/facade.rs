//! ConfigLoader facade delegating to merge service.

use super::merge::service::MergeService;
use super::BugmapConfig;
use crate::error::ApiError;
use std::path::Path;

/// Configuration loader facade.
///
/// Precedence, lowest first: defaults, global file
/// (`$XDG_CONFIG_HOME/bugmap/config.toml`), workspace file (`bugmap.toml`),
/// `BUGMAP_*` environment variables.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from files and environment.
    pub fn load(workspace_root: &Path) -> Result<BugmapConfig, ApiError> {
        let config = MergeService::load(workspace_root)?;
        Self::checked(config)
    }

    /// Load configuration from a specific file.
    pub fn load_from_file(path: &Path) -> Result<BugmapConfig, ApiError> {
        let config = MergeService::load_from_file(path)?;
        Self::checked(config)
    }

    /// Create default configuration.
    pub fn default() -> BugmapConfig {
        BugmapConfig::default()
    }

    fn checked(config: BugmapConfig) -> Result<BugmapConfig, ApiError> {
        config.validate().map_err(ApiError::ConfigError)?;
        Ok(config)
    }
}
