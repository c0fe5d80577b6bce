//! In-process document store.

use super::{DocumentStore, NodeRecord, UpsertReport};
use crate::error::StorageError;
use crate::types::{NodeKey, QueryId};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;

/// Document store held in a map keyed by `(query, key)`
#[derive(Default)]
pub struct MemoryDocumentStore {
    records: RwLock<HashMap<(QueryId, NodeKey), NodeRecord>>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records across all scopes.
    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn get_by_key(&self, query: &str, key: &str) -> Result<Option<NodeRecord>, StorageError> {
        Ok(self
            .records
            .read()
            .get(&(query.to_string(), key.to_string()))
            .cloned())
    }

    async fn get_by_keys(
        &self,
        query: &str,
        keys: &[NodeKey],
    ) -> Result<Vec<NodeRecord>, StorageError> {
        let records = self.records.read();
        Ok(keys
            .iter()
            .filter_map(|key| records.get(&(query.to_string(), key.clone())).cloned())
            .collect())
    }

    async fn get_all(&self, query: &str) -> Result<Vec<NodeRecord>, StorageError> {
        let mut scope: Vec<NodeRecord> = self
            .records
            .read()
            .iter()
            .filter(|((q, _), _)| q == query)
            .map(|(_, record)| record.clone())
            .collect();
        scope.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(scope)
    }

    async fn upsert_batch(
        &self,
        query: &str,
        records: &[NodeRecord],
    ) -> Result<UpsertReport, StorageError> {
        let mut report = UpsertReport::default();
        let mut map = self.records.write();
        for record in records {
            if record.query != query {
                report.failed.push((
                    record.key.clone(),
                    format!("record belongs to scope '{}'", record.query),
                ));
                continue;
            }
            map.insert((query.to_string(), record.key.clone()), record.clone());
            report.succeeded.push(record.key.clone());
        }
        Ok(report)
    }
}
