//! Edge records: one row of the flat source hierarchy.

use serde::{Deserialize, Serialize};

/// (path, parent path, size) for one node of the source hierarchy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeRecord {
    pub path: String,
    /// `None` at the root
    pub parent: Option<String>,
    pub size: u64,
}

impl EdgeRecord {
    /// Create an edge. An empty parent string marks the root.
    pub fn new(path: impl Into<String>, parent: impl Into<String>, size: u64) -> Self {
        let parent = parent.into();
        Self {
            path: path.into(),
            parent: if parent.is_empty() { None } else { Some(parent) },
            size,
        }
    }

    /// Create a root edge.
    pub fn root(path: impl Into<String>, size: u64) -> Self {
        Self {
            path: path.into(),
            parent: None,
            size,
        }
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }
}
