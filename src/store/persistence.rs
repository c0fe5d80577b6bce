//! Sled-backed document store.
//!
//! Each query scope lives in its own sled tree (`scope/<query>`), keyed by
//! node key, with bincode-encoded records as values.

use super::{DocumentStore, NodeRecord, UpsertReport};
use crate::error::StorageError;
use crate::types::NodeKey;
use async_trait::async_trait;
use std::path::Path;
use tracing::{debug, warn};

const SCOPE_PREFIX: &str = "scope/";

pub struct SledDocumentStore {
    db: sled::Db,
}

impl SledDocumentStore {
    /// Open (or create) a store at the given directory.
    pub fn open(path: &Path) -> Result<Self, StorageError> {
        std::fs::create_dir_all(path)?;
        let db = sled::open(path)?;
        Ok(Self::from_db(db))
    }

    pub fn from_db(db: sled::Db) -> Self {
        Self { db }
    }

    /// In-memory store removed on drop.
    pub fn temporary() -> Result<Self, StorageError> {
        let db = sled::Config::new().temporary(true).open()?;
        Ok(Self::from_db(db))
    }

    /// Query scopes that currently hold a tree.
    pub(crate) fn scopes(&self) -> Vec<String> {
        self.db
            .tree_names()
            .into_iter()
            .filter_map(|name| {
                std::str::from_utf8(&name)
                    .ok()
                    .and_then(|n| n.strip_prefix(SCOPE_PREFIX))
                    .map(str::to_string)
            })
            .collect()
    }

    fn scope_name(query: &str) -> String {
        format!("{}{}", SCOPE_PREFIX, query)
    }

    /// Scope tree for writes, created on first use.
    fn scope(&self, query: &str) -> Result<sled::Tree, StorageError> {
        Ok(self.db.open_tree(Self::scope_name(query))?)
    }

    /// Scope tree for reads; `None` if nothing was ever written to it.
    fn existing_scope(&self, query: &str) -> Result<Option<sled::Tree>, StorageError> {
        let name = Self::scope_name(query);
        if !self.db.tree_names().iter().any(|n| &n[..] == name.as_bytes()) {
            return Ok(None);
        }
        Ok(Some(self.db.open_tree(name)?))
    }

    fn decode_record(bytes: &[u8]) -> Result<NodeRecord, StorageError> {
        Ok(bincode::deserialize(bytes)?)
    }
}

#[async_trait]
impl DocumentStore for SledDocumentStore {
    async fn get_by_key(&self, query: &str, key: &str) -> Result<Option<NodeRecord>, StorageError> {
        let Some(scope) = self.existing_scope(query)? else {
            return Ok(None);
        };
        match scope.get(key.as_bytes())? {
            Some(bytes) => Ok(Some(Self::decode_record(&bytes)?)),
            None => Ok(None),
        }
    }

    async fn get_by_keys(
        &self,
        query: &str,
        keys: &[NodeKey],
    ) -> Result<Vec<NodeRecord>, StorageError> {
        let Some(scope) = self.existing_scope(query)? else {
            return Ok(Vec::new());
        };
        let mut records = Vec::with_capacity(keys.len());
        for key in keys {
            if let Some(bytes) = scope.get(key.as_bytes())? {
                records.push(Self::decode_record(&bytes)?);
            }
        }
        Ok(records)
    }

    async fn get_all(&self, query: &str) -> Result<Vec<NodeRecord>, StorageError> {
        let Some(scope) = self.existing_scope(query)? else {
            return Ok(Vec::new());
        };
        scope
            .iter()
            .values()
            .map(|value| Self::decode_record(&value?))
            .collect()
    }

    async fn upsert_batch(
        &self,
        query: &str,
        records: &[NodeRecord],
    ) -> Result<UpsertReport, StorageError> {
        let scope = self.scope(query)?;
        let mut report = UpsertReport::default();
        let mut batch = sled::Batch::default();
        let mut staged = Vec::with_capacity(records.len());

        for record in records {
            if record.query != query {
                report.failed.push((
                    record.key.clone(),
                    format!("record belongs to scope '{}'", record.query),
                ));
                continue;
            }
            match bincode::serialize(record) {
                Ok(bytes) => {
                    batch.insert(record.key.as_bytes(), bytes);
                    staged.push(record.key.clone());
                }
                Err(e) => report.failed.push((record.key.clone(), e.to_string())),
            }
        }

        match scope.apply_batch(batch).and_then(|_| scope.flush()) {
            Ok(_) => report.succeeded = staged,
            Err(e) => {
                warn!(query = %query, error = %e, "Sled batch apply failed");
                let cause = e.to_string();
                report
                    .failed
                    .extend(staged.into_iter().map(|key| (key, cause.clone())));
            }
        }

        debug!(
            query = %query,
            succeeded = report.succeeded.len(),
            failed = report.failed.len(),
            "Applied upsert batch"
        );
        Ok(report)
    }
}
