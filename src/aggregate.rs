//! Metric aggregation and normalization over materialized trees
//!
//! Directories carry no measured metrics of their own. Aggregation sums each
//! metric over the leaf descendants of a node; averaging divides those sums by
//! the number of leaves. Normalization rescales treemap values by the square
//! root of node size so very large files do not dominate.

use crate::error::ApiError;
use crate::metrics::{safe_ratio, MetricSchema};
use crate::store::NodeRecord;
use crate::tree::Tree;
use crate::types::Metrics;
use crate::views::TreemapRow;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Leaf count and per-metric sums below a node
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Aggregate {
    pub file_count: u64,
    pub metric_sums: Metrics,
}

impl Aggregate {
    fn from_leaf(record: &NodeRecord) -> Self {
        Self {
            file_count: 1,
            metric_sums: record.metrics.clone(),
        }
    }

    fn absorb(&mut self, other: &Aggregate) {
        self.file_count += other.file_count;
        for (name, value) in &other.metric_sums {
            *self.metric_sums.entry(name.clone()).or_insert(0.0) += value;
        }
    }

    /// Sums for reporting: measured metrics as summed, each ratio recomputed
    /// from its summed operands instead of a sum of per-file ratios.
    pub fn pooled_sums(&self, schema: &MetricSchema) -> Metrics {
        let mut sums = self.metric_sums.clone();
        for ratio in &schema.ratios {
            let numerator = self.metric_sums.get(&ratio.numerator).copied().unwrap_or(0.0);
            let denominator = self.metric_sums.get(&ratio.denominator).copied().unwrap_or(0.0);
            sums.insert(ratio.name.clone(), safe_ratio(numerator, denominator));
        }
        sums
    }

    /// Per-metric mean over the counted leaves; all zero when none were counted.
    pub fn averages(&self) -> Metrics {
        self.metric_sums
            .iter()
            .map(|(name, sum)| {
                let avg = if self.file_count == 0 {
                    0.0
                } else {
                    sum / self.file_count as f64
                };
                (name.clone(), avg)
            })
            .collect()
    }
}

/// Sum every metric over the leaf descendants of `start_path`.
///
/// A leaf start node counts itself. Children missing from `tree`, and nodes
/// reached twice, are `MalformedInput`.
pub fn aggregate(tree: &Tree, start_path: &str) -> Result<Aggregate, ApiError> {
    if !tree.contains_key(start_path) {
        return Err(ApiError::NotFound(format!("'{}' is not in the tree", start_path)));
    }

    let mut total = Aggregate::default();
    let mut seen = HashSet::new();
    let mut stack = vec![start_path.to_string()];

    while let Some(path) = stack.pop() {
        let record = lookup(tree, &path)?;
        if !seen.insert(path.clone()) {
            return Err(revisited(&path));
        }
        if record.is_leaf() {
            total.absorb(&Aggregate::from_leaf(record));
        } else {
            stack.extend(record.child_paths());
        }
    }

    Ok(total)
}

/// Metrics of `path` averaged over its leaves; a leaf reports its own values.
pub fn average_metrics(tree: &Tree, path: &str) -> Result<Metrics, ApiError> {
    let record = tree
        .get(path)
        .ok_or_else(|| ApiError::NotFound(format!("'{}' is not in the tree", path)))?;
    if record.is_leaf() {
        return Ok(record.metrics.clone());
    }

    let sums = aggregate(tree, path)?;
    if sums.file_count == 0 {
        return Ok(record.metrics.keys().map(|k| (k.clone(), 0.0)).collect());
    }
    Ok(sums.averages())
}

/// Copy of `tree` where every directory reachable from `root_path` carries the
/// average of its leaves instead of its stored metrics.
///
/// Computed in one post-order pass, so each node is visited once.
pub fn with_directory_averages(tree: &Tree, root_path: &str) -> Result<Tree, ApiError> {
    if !tree.contains_key(root_path) {
        return Err(ApiError::NotFound(format!("'{}' is not in the tree", root_path)));
    }

    let mut order = Vec::new();
    let mut seen = HashSet::new();
    let mut stack = vec![root_path.to_string()];
    while let Some(path) = stack.pop() {
        let record = lookup(tree, &path)?;
        if !seen.insert(path.clone()) {
            return Err(revisited(&path));
        }
        stack.extend(record.child_paths());
        order.push(path);
    }

    let mut sums: HashMap<String, Aggregate> = HashMap::with_capacity(order.len());
    for path in order.iter().rev() {
        let record = &tree[path];
        let agg = if record.is_leaf() {
            Aggregate::from_leaf(record)
        } else {
            let mut agg = Aggregate::default();
            for child in record.child_paths() {
                agg.absorb(&sums[&child]);
            }
            agg
        };
        sums.insert(path.clone(), agg);
    }

    let mut averaged = tree.clone();
    for (path, agg) in &sums {
        if let Some(record) = averaged.get_mut(path) {
            if !record.is_leaf() && agg.file_count > 0 {
                record.metrics = agg.averages();
            }
        }
    }
    Ok(averaged)
}

/// Divide each row's value by `sqrt(size)`; size 0 divides by 1.
/// Rows without a value pass through unchanged.
pub fn normalize_by_size(rows: Vec<TreemapRow>) -> Vec<TreemapRow> {
    rows.into_iter()
        .map(|mut row| {
            if let Some(value) = row.value {
                let divisor = if row.size == 0 {
                    1.0
                } else {
                    (row.size as f64).sqrt()
                };
                row.value = Some(value / divisor);
            }
            row
        })
        .collect()
}

fn lookup<'a>(tree: &'a Tree, path: &str) -> Result<&'a NodeRecord, ApiError> {
    tree.get(path).ok_or_else(|| {
        ApiError::MalformedInput(format!("Child '{}' is referenced but not in the tree", path))
    })
}

fn revisited(path: &str) -> ApiError {
    ApiError::MalformedInput(format!("Node '{}' is reachable more than once", path))
}
