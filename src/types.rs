//! Core types shared by the builder, the store and the retrieval engine.

use std::collections::BTreeMap;

/// QueryId: namespace under which one tree is built and retrieved
pub type QueryId = String;

/// NodeKey: codec-encoded node path, unique within a query scope
pub type NodeKey = String;

/// Metrics: metric name to value, ordered by name for deterministic encoding
pub type Metrics = BTreeMap<String, f64>;
