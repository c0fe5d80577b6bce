//! Base builder with scalar defaults.
//!
//! Nested defaults (metric schema, logging) come from serde defaults on the
//! config structs, so only top-level scalars are seeded here.

use crate::tree::subtree::DEFAULT_ROOT_SENTINEL;
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError};

pub fn builder_with_defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    Config::builder()
        .set_default("tree.root_sentinel", DEFAULT_ROOT_SENTINEL)?
        .set_default("tree.metric_key_prefix_len", 0)?
        .set_default("retrieval.store_timeout_ms", 30_000)
}
