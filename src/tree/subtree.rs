//! Subtree Retrieval Engine
//!
//! Materializes the subtree below a root path from the document store,
//! expanding level by level. Each level is a single multi-key fetch, so a
//! retrieval costs one round trip per level rather than one per node.

use super::{restrict_depth, with_deadline, Tree, DEFAULT_STORE_TIMEOUT};
use crate::aggregate;
use crate::codec;
use crate::error::ApiError;
use crate::store::DocumentStore;
use crate::types::NodeKey;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Path that names the whole tree of a query scope.
pub const DEFAULT_ROOT_SENTINEL: &str = "~";

pub struct SubtreeEngine {
    store: Arc<dyn DocumentStore>,
    root_sentinel: String,
    timeout: Duration,
}

impl SubtreeEngine {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            store,
            root_sentinel: DEFAULT_ROOT_SENTINEL.to_string(),
            timeout: DEFAULT_STORE_TIMEOUT,
        }
    }

    pub fn with_root_sentinel(mut self, sentinel: impl Into<String>) -> Self {
        self.root_sentinel = sentinel.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn root_sentinel(&self) -> &str {
        &self.root_sentinel
    }

    /// Subtree of `root_path` down to `depth` levels (0 = unbounded).
    ///
    /// The root is level 0; nodes at level `depth` are included without their
    /// children. A root absent from the scope is `NotFound`.
    pub async fn get_subtree(
        &self,
        query: &str,
        root_path: &str,
        depth: u32,
    ) -> Result<Tree, ApiError> {
        let started = Instant::now();
        let root_key = codec::encode(root_path);
        let root = with_deadline(
            self.timeout,
            "get_by_key",
            self.store.get_by_key(query, &root_key),
        )
        .await?
        .ok_or_else(|| {
            ApiError::NotFound(format!("'{}' not found in query '{}'", root_path, query))
        })?;

        // Whole-scope lookup; other roots of a forest are dropped.
        if depth == 0 && root_path == self.root_sentinel {
            let all = self.get_tree(query).await?;
            let tree = restrict_depth(&all, root_path, 0);
            debug!(
                query = %query,
                nodes = tree.len(),
                unreachable = all.len() - tree.len(),
                "Served sentinel root from full-scope lookup"
            );
            return Ok(tree);
        }

        let mut visited: HashSet<NodeKey> = HashSet::from([root_key]);
        let mut frontier: Vec<NodeKey> = root.children.clone();
        let mut tree = Tree::new();
        tree.insert(root.path(), root);

        let mut level = 1;
        while !frontier.is_empty() && (depth == 0 || level <= depth) {
            frontier.retain(|key| visited.insert(key.clone()));
            if frontier.is_empty() {
                break;
            }

            let fetched = with_deadline(
                self.timeout,
                "get_by_keys",
                self.store.get_by_keys(query, &frontier),
            )
            .await?;
            if fetched.len() < frontier.len() {
                warn!(
                    query = %query,
                    level = level,
                    missing = frontier.len() - fetched.len(),
                    "Child records referenced but not stored"
                );
            }
            debug!(
                query = %query,
                level = level,
                requested = frontier.len(),
                fetched = fetched.len(),
                "Expanded subtree level"
            );

            let mut next = Vec::new();
            for record in fetched {
                next.extend(record.children.iter().cloned());
                tree.insert(record.path(), record);
            }
            frontier = next;
            level += 1;
        }

        info!(
            query = %query,
            root = %root_path,
            depth = depth,
            nodes = tree.len(),
            duration_ms = started.elapsed().as_millis() as u64,
            "Retrieved subtree"
        );
        Ok(tree)
    }

    /// Every record of the query scope in one lookup.
    pub async fn get_tree(&self, query: &str) -> Result<Tree, ApiError> {
        let records =
            with_deadline(self.timeout, "get_all", self.store.get_all(query)).await?;
        if records.is_empty() {
            return Err(ApiError::NotFound(format!(
                "Query '{}' has no stored tree",
                query
            )));
        }
        debug!(query = %query, nodes = records.len(), "Fetched whole tree");
        Ok(records.into_iter().map(|r| (r.path(), r)).collect())
    }

    /// Like [`SubtreeEngine::get_subtree`], but each directory carries the
    /// average metrics of all leaves below it, including leaves deeper than
    /// `depth`.
    pub async fn get_averaged_subtree(
        &self,
        query: &str,
        root_path: &str,
        depth: u32,
    ) -> Result<Tree, ApiError> {
        let full = self.get_subtree(query, root_path, 0).await?;
        let averaged = aggregate::with_directory_averages(&full, root_path)?;
        Ok(restrict_depth(&averaged, root_path, depth))
    }
}
