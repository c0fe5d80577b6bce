//! NodeRecord Store
//!
//! Document store interface for persisted node records. Records are keyed by
//! `(query, key)`; every record of one build shares the same query scope.

pub mod memory;
pub mod persistence;

use crate::codec;
use crate::error::StorageError;
use crate::types::{Metrics, NodeKey, QueryId};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// NodeRecord: one node of a built tree, as persisted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeRecord {
    pub query: QueryId,
    pub key: NodeKey,
    pub parent: Option<NodeKey>,
    pub children: Vec<NodeKey>,
    pub size: u64,
    pub metrics: Metrics,
}

impl NodeRecord {
    /// Decoded path of this node.
    pub fn path(&self) -> String {
        codec::decode(&self.key)
    }

    /// Decoded path of the parent, `None` at the root.
    pub fn parent_path(&self) -> Option<String> {
        codec::decode_opt(self.parent.as_deref())
    }

    /// Decoded child paths, in stored order.
    pub fn child_paths(&self) -> impl Iterator<Item = String> + '_ {
        self.children.iter().map(|key| codec::decode(key))
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

/// Outcome of a batch upsert
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpsertReport {
    pub succeeded: Vec<NodeKey>,
    /// (key, cause)
    pub failed: Vec<(NodeKey, String)>,
}

impl UpsertReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Document store holding node records.
///
/// `Err` means the store itself failed; a missing record is `Ok(None)` or
/// simply absent from a multi-get.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn get_by_key(&self, query: &str, key: &str) -> Result<Option<NodeRecord>, StorageError>;

    async fn get_by_keys(
        &self,
        query: &str,
        keys: &[NodeKey],
    ) -> Result<Vec<NodeRecord>, StorageError>;

    /// Every record of a query scope.
    async fn get_all(&self, query: &str) -> Result<Vec<NodeRecord>, StorageError>;

    /// Insert or replace each record by `(query, key)`.
    ///
    /// Per-record failures go into the report; `Err` is reserved for the
    /// store being unusable as a whole.
    async fn upsert_batch(
        &self,
        query: &str,
        records: &[NodeRecord],
    ) -> Result<UpsertReport, StorageError>;
}

pub use memory::MemoryDocumentStore;
pub use persistence::SledDocumentStore;
