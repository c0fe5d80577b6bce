//! Metric schema and metric table
//!
//! A metric table maps leaf paths to a tuple of measured values. The schema
//! names the tuple positions and declares the ratio metrics derived from them
//! at build time.

use crate::codec;
use crate::error::ApiError;
use crate::types::{Metrics, NodeKey};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// A metric computed as `numerator / denominator`, 0 when the denominator is 0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatioMetric {
    pub name: String,
    pub numerator: String,
    pub denominator: String,
}

fn default_measured() -> Vec<String> {
    vec!["bugs".to_string(), "security_bugs".to_string()]
}

fn default_ratios() -> Vec<RatioMetric> {
    vec![RatioMetric {
        name: "security_bug_ratio".to_string(),
        numerator: "security_bugs".to_string(),
        denominator: "bugs".to_string(),
    }]
}

/// Named metric layout of one metric-table tuple plus derived ratios
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricSchema {
    /// Tuple positions, in order
    #[serde(default = "default_measured")]
    pub measured: Vec<String>,

    /// Ratios derived from measured metrics
    #[serde(default = "default_ratios")]
    pub ratios: Vec<RatioMetric>,
}

impl Default for MetricSchema {
    fn default() -> Self {
        Self {
            measured: default_measured(),
            ratios: default_ratios(),
        }
    }
}

impl MetricSchema {
    /// Check names are non-empty, unique, and ratio operands are measured.
    pub fn validate(&self) -> Result<(), String> {
        if self.measured.is_empty() {
            return Err("Metric schema must declare at least one measured metric".to_string());
        }

        let mut seen = HashSet::new();
        for name in self.names() {
            if name.trim().is_empty() {
                return Err("Metric names cannot be empty".to_string());
            }
            if !seen.insert(name) {
                return Err(format!("Duplicate metric name '{}'", name));
            }
        }

        for ratio in &self.ratios {
            for operand in [&ratio.numerator, &ratio.denominator] {
                if !self.measured.contains(operand) {
                    return Err(format!(
                        "Ratio '{}' refers to unknown measured metric '{}'",
                        ratio.name, operand
                    ));
                }
            }
        }

        Ok(())
    }

    /// All metric names, measured first then derived.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.measured
            .iter()
            .map(String::as_str)
            .chain(self.ratios.iter().map(|r| r.name.as_str()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names().any(|n| n == name)
    }

    /// Metrics for a directory node: every declared metric at 0.
    pub fn zeroed(&self) -> Metrics {
        self.names().map(|name| (name.to_string(), 0.0)).collect()
    }

    /// Metrics for a leaf: measured values verbatim plus derived ratios.
    pub fn leaf_metrics(&self, values: &[f64]) -> Result<Metrics, ApiError> {
        if values.len() != self.measured.len() {
            return Err(ApiError::MalformedInput(format!(
                "Expected {} metric values ({}), got {}",
                self.measured.len(),
                self.measured.join(", "),
                values.len()
            )));
        }

        let mut metrics: Metrics = self
            .measured
            .iter()
            .cloned()
            .zip(values.iter().copied())
            .collect();

        for ratio in &self.ratios {
            let numerator = metrics.get(&ratio.numerator).copied().unwrap_or(0.0);
            let denominator = metrics.get(&ratio.denominator).copied().unwrap_or(0.0);
            metrics.insert(ratio.name.clone(), safe_ratio(numerator, denominator));
        }

        Ok(metrics)
    }
}

/// `numerator / denominator`, or 0 when the denominator is 0.
pub fn safe_ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        0.0
    } else {
        numerator / denominator
    }
}

/// Leaf path to measured metric tuple.
///
/// Entries are held under codec-encoded keys, the same form node keys take
/// in the store, so a serialized table matches the persisted layout.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MetricTable {
    entries: BTreeMap<NodeKey, Vec<f64>>,
}

impl MetricTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert under a plain path.
    pub fn insert(&mut self, path: &str, values: Vec<f64>) {
        self.entries.insert(codec::encode(path), values);
    }

    /// Insert under an already encoded key.
    pub fn insert_key(&mut self, key: impl Into<NodeKey>, values: Vec<f64>) {
        self.entries.insert(key.into(), values);
    }

    pub fn get(&self, path: &str) -> Option<&[f64]> {
        self.get_by_key(&codec::encode(path))
    }

    pub fn get_by_key(&self, key: &str) -> Option<&[f64]> {
        self.entries.get(key).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Reject entries whose tuple does not match the schema.
    pub fn validate(&self, schema: &MetricSchema) -> Result<(), ApiError> {
        for (key, values) in &self.entries {
            let path = codec::decode(key);
            if values.len() != schema.measured.len() {
                return Err(ApiError::MalformedInput(format!(
                    "Metric entry for '{}' has {} values, schema declares {}",
                    path,
                    values.len(),
                    schema.measured.len()
                )));
            }
            if let Some(bad) = values.iter().find(|v| !v.is_finite()) {
                return Err(ApiError::MalformedInput(format!(
                    "Metric entry for '{}' has non-finite value {}",
                    path, bad
                )));
            }
        }
        Ok(())
    }
}

impl FromIterator<(String, Vec<f64>)> for MetricTable {
    fn from_iter<I: IntoIterator<Item = (String, Vec<f64>)>>(iter: I) -> Self {
        let mut table = Self::new();
        for (path, values) in iter {
            table.insert(&path, values);
        }
        table
    }
}
