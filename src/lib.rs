//! Bugmap: Defect Treemaps over Source Hierarchies
//!
//! Turns a flat `(path, parent, size)` edge list plus per-file defect metrics
//! into node records persisted per query scope, and serves bounded-depth
//! subtrees, metric aggregates and treemap exports from them.

pub mod aggregate;
pub mod codec;
pub mod config;
pub mod error;
pub mod ingest;
pub mod logging;
pub mod metrics;
pub mod store;
pub mod tooling;
pub mod tree;
pub mod types;
pub mod views;

pub use error::{ApiError, StorageError};
pub use metrics::{MetricSchema, MetricTable};
pub use store::{DocumentStore, NodeRecord};
pub use tree::{EdgeRecord, SubtreeEngine, Tree, TreeBuilder};
pub use views::{Treemap, TreemapRow};
