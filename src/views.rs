//! Treemap Views
//!
//! Flattens a materialized (sub)tree into `[path, parent, size, value]` rows
//! for an external treemap renderer. The requested root is exported without a
//! parent so any subtree renders as a self-contained treemap.

use crate::aggregate::normalize_by_size;
use crate::error::ApiError;
use crate::tree::Tree;
use serde::ser::{SerializeSeq, SerializeTuple};
use serde::{Serialize, Serializer};
use std::collections::{HashSet, VecDeque};

/// Header row of every exported treemap.
pub const TREEMAP_HEADER: [&str; 4] = ["Directory/File", "Parent Directory", "Size", "Bugs"];

/// One treemap row; serialized as a four-element array
#[derive(Debug, Clone, PartialEq)]
pub struct TreemapRow {
    pub path: String,
    pub parent: Option<String>,
    pub size: u64,
    /// `None` when the node has no value for the requested metric
    pub value: Option<f64>,
}

impl TreemapRow {
    pub fn new(path: &str, parent: Option<&str>, size: u64, value: Option<f64>) -> Self {
        Self {
            path: path.to_string(),
            parent: parent.map(str::to_string),
            size,
            value,
        }
    }
}

impl Serialize for TreemapRow {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut row = serializer.serialize_tuple(4)?;
        row.serialize_element(&self.path)?;
        row.serialize_element(&self.parent)?;
        row.serialize_element(&self.size)?;
        row.serialize_element(&self.value.map(MetricValue))?;
        row.end()
    }
}

/// Whole-number metrics serialize as integers, the rest as floats.
struct MetricValue(f64);

impl Serialize for MetricValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        const MAX_EXACT: f64 = 9_007_199_254_740_992.0;
        if self.0.fract() == 0.0 && self.0.abs() < MAX_EXACT {
            serializer.serialize_i64(self.0 as i64)
        } else {
            serializer.serialize_f64(self.0)
        }
    }
}

/// Header plus rows, parents before children
#[derive(Debug, Clone, PartialEq)]
pub struct Treemap {
    pub rows: Vec<TreemapRow>,
}

impl Treemap {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl Serialize for Treemap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.rows.len() + 1))?;
        seq.serialize_element(&TREEMAP_HEADER)?;
        for row in &self.rows {
            seq.serialize_element(row)?;
        }
        seq.end()
    }
}

/// Export `tree` as treemap rows for `metric_name`, rooted at `root_path`.
///
/// Rows follow breadth-first order from the root. Nodes not reachable from
/// it are left out, so the root row is the only one without a parent.
pub fn to_treemap(
    tree: &Tree,
    root_path: &str,
    metric_name: &str,
    normalize: bool,
) -> Result<Treemap, ApiError> {
    let root = tree
        .get(root_path)
        .ok_or_else(|| ApiError::NotFound(format!("'{}' is not in the tree", root_path)))?;
    if !root.metrics.contains_key(metric_name) {
        return Err(ApiError::MalformedInput(format!(
            "Unknown metric '{}'",
            metric_name
        )));
    }

    let mut ordered = Vec::with_capacity(tree.len());
    let mut seen = HashSet::with_capacity(tree.len());
    let mut queue = VecDeque::from([root_path.to_string()]);
    while let Some(path) = queue.pop_front() {
        if !tree.contains_key(&path) || !seen.insert(path.clone()) {
            continue;
        }
        queue.extend(tree[&path].child_paths());
        ordered.push(path);
    }

    let rows: Vec<TreemapRow> = ordered
        .iter()
        .map(|path| {
            let record = &tree[path];
            TreemapRow {
                path: path.clone(),
                parent: if path == root_path {
                    None
                } else {
                    record.parent_path()
                },
                size: record.size,
                value: record.metrics.get(metric_name).copied(),
            }
        })
        .collect();

    let rows = if normalize {
        normalize_by_size(rows)
    } else {
        rows
    };
    Ok(Treemap { rows })
}
