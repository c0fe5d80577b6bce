//! Tree construction and retrieval
//!
//! A tree is a flat map from decoded path to [`NodeRecord`], with parent and
//! child relationships held as node keys inside each record.

pub mod builder;
pub mod edge;
pub mod subtree;

use crate::error::{ApiError, StorageError};
use crate::store::NodeRecord;
use std::collections::{BTreeMap, HashSet, VecDeque};
use std::future::Future;
use std::time::Duration;

pub use builder::{BuildReport, TreeBuilder};
pub use edge::EdgeRecord;
pub use subtree::SubtreeEngine;

/// Materialized (sub)tree keyed by decoded path
pub type Tree = BTreeMap<String, NodeRecord>;

/// Default deadline for a single store call.
pub const DEFAULT_STORE_TIMEOUT: Duration = Duration::from_secs(30);

/// Run one store call under a deadline.
///
/// Store failures and expired deadlines both surface as `Unavailable`.
pub(crate) async fn with_deadline<T, F>(
    timeout: Duration,
    operation: &str,
    call: F,
) -> Result<T, ApiError>
where
    F: Future<Output = Result<T, StorageError>>,
{
    match tokio::time::timeout(timeout, call).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => Err(ApiError::Unavailable(format!("{} failed: {}", operation, e))),
        Err(_) => Err(ApiError::Unavailable(format!(
            "{} timed out after {}ms",
            operation,
            timeout.as_millis()
        ))),
    }
}

/// Nodes of `tree` within `depth` hops below `root_path` (0 = unbounded).
///
/// Children missing from `tree` are skipped.
pub fn restrict_depth(tree: &Tree, root_path: &str, depth: u32) -> Tree {
    let mut restricted = Tree::new();
    let mut seen = HashSet::new();
    let mut queue = VecDeque::new();
    queue.push_back((root_path.to_string(), 0u32));

    while let Some((path, level)) = queue.pop_front() {
        if !seen.insert(path.clone()) {
            continue;
        }
        let Some(record) = tree.get(&path) else {
            continue;
        };
        if depth == 0 || level < depth {
            for child in record.child_paths() {
                queue.push_back((child, level + 1));
            }
        }
        restricted.insert(path, record.clone());
    }

    restricted
}

/// Length in hops of the longest downward path from `root_path` within `tree`.
pub fn height(tree: &Tree, root_path: &str) -> u32 {
    let mut max = 0;
    let mut seen = HashSet::new();
    let mut queue = VecDeque::from([(root_path.to_string(), 0u32)]);
    while let Some((path, level)) = queue.pop_front() {
        if !seen.insert(path.clone()) {
            continue;
        }
        if let Some(record) = tree.get(&path) {
            max = max.max(level);
            for child in record.child_paths() {
                queue.push_back((child, level + 1));
            }
        }
    }
    max
}
