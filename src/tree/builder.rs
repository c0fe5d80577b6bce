//! Tree Builder
//!
//! Turns a flat edge list and a leaf metric table into one [`NodeRecord`] per
//! edge and upserts them into the document store under a query scope.
//! Building is deterministic: the same inputs always produce the same records.

use super::edge::EdgeRecord;
use super::{with_deadline, DEFAULT_STORE_TIMEOUT};
use crate::codec;
use crate::error::ApiError;
use crate::metrics::{MetricSchema, MetricTable};
use crate::store::{DocumentStore, NodeRecord, UpsertReport};
use crate::types::NodeKey;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Summary of a successful build
#[derive(Debug, Clone)]
pub struct BuildReport {
    pub query: String,
    /// Built records keyed by node key
    pub nodes: BTreeMap<NodeKey, NodeRecord>,
    pub leaf_count: usize,
    pub directory_count: usize,
    pub duration_ms: u64,
}

pub struct TreeBuilder {
    store: Arc<dyn DocumentStore>,
    schema: MetricSchema,
    /// Characters stripped from a path before the metric table lookup
    metric_key_prefix_len: usize,
    timeout: Duration,
}

impl TreeBuilder {
    pub fn new(store: Arc<dyn DocumentStore>, schema: MetricSchema) -> Self {
        Self {
            store,
            schema,
            metric_key_prefix_len: 0,
            timeout: DEFAULT_STORE_TIMEOUT,
        }
    }

    pub fn with_metric_key_prefix_len(mut self, len: usize) -> Self {
        self.metric_key_prefix_len = len;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn schema(&self) -> &MetricSchema {
        &self.schema
    }

    /// Build the node records for `query` without touching the store.
    pub fn assemble(
        &self,
        edges: &[EdgeRecord],
        metrics: &MetricTable,
        query: &str,
    ) -> Result<BTreeMap<NodeKey, NodeRecord>, ApiError> {
        metrics.validate(&self.schema)?;

        let mut paths = HashSet::with_capacity(edges.len());
        for edge in edges {
            if !paths.insert(edge.path.as_str()) {
                return Err(ApiError::MalformedInput(format!(
                    "Duplicate path '{}' in edge list",
                    edge.path
                )));
            }
        }

        let mut children: HashMap<&str, Vec<NodeKey>> = HashMap::new();
        for edge in edges {
            if let Some(parent) = edge.parent.as_deref() {
                if !paths.contains(parent) {
                    return Err(ApiError::MalformedInput(format!(
                        "Parent '{}' of '{}' is not in the edge list",
                        parent, edge.path
                    )));
                }
                if parent == edge.path {
                    return Err(ApiError::MalformedInput(format!(
                        "'{}' is its own parent",
                        edge.path
                    )));
                }
                children
                    .entry(parent)
                    .or_default()
                    .push(codec::encode(&edge.path));
            }
        }

        let mut nodes = BTreeMap::new();
        for edge in edges {
            let metric_key = codec::encode(self.metric_key(&edge.path));
            let node_metrics = match metrics.get_by_key(&metric_key) {
                Some(values) => self.schema.leaf_metrics(values)?,
                None => self.schema.zeroed(),
            };
            let key = codec::encode(&edge.path);
            let record = NodeRecord {
                query: query.to_string(),
                key: key.clone(),
                parent: codec::encode_opt(edge.parent.as_deref()),
                children: children.remove(edge.path.as_str()).unwrap_or_default(),
                size: edge.size,
                metrics: node_metrics,
            };
            nodes.insert(key, record);
        }

        Ok(nodes)
    }

    /// Assemble and persist the tree for `query`.
    ///
    /// If some records fail to persist the rest stay written and
    /// `PartialWriteFailure` lists the failed keys for a retry through
    /// [`TreeBuilder::persist`].
    pub async fn build(
        &self,
        edges: &[EdgeRecord],
        metrics: &MetricTable,
        query: &str,
    ) -> Result<BuildReport, ApiError> {
        let started = Instant::now();
        let nodes = self.assemble(edges, metrics, query)?;
        let records: Vec<NodeRecord> = nodes.values().cloned().collect();

        let report = self.persist(query, &records).await?;
        if !report.is_complete() {
            warn!(
                query = %query,
                failed = report.failed.len(),
                succeeded = report.succeeded.len(),
                "Tree build partially persisted"
            );
            return Err(ApiError::PartialWriteFailure {
                failed: report.failed,
                succeeded: report.succeeded.len(),
            });
        }

        let leaf_count = nodes.values().filter(|n| n.is_leaf()).count();
        let report = BuildReport {
            query: query.to_string(),
            leaf_count,
            directory_count: nodes.len() - leaf_count,
            nodes,
            duration_ms: started.elapsed().as_millis() as u64,
        };

        info!(
            query = %query,
            nodes = report.nodes.len(),
            leaves = report.leaf_count,
            duration_ms = report.duration_ms,
            "Built tree"
        );
        Ok(report)
    }

    /// Upsert records as one batch under the store deadline.
    pub async fn persist(
        &self,
        query: &str,
        records: &[NodeRecord],
    ) -> Result<UpsertReport, ApiError> {
        debug!(query = %query, records = records.len(), "Submitting upsert batch");
        with_deadline(
            self.timeout,
            "upsert_batch",
            self.store.upsert_batch(query, records),
        )
        .await
    }

    fn metric_key<'a>(&self, path: &'a str) -> &'a str {
        match path.char_indices().nth(self.metric_key_prefix_len) {
            Some((idx, _)) => &path[idx..],
            None if self.metric_key_prefix_len == 0 => path,
            None => "",
        }
    }
}
