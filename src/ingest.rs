//! Edge list and metric table ingestion
//!
//! Inputs are JSON. An edge list is an array whose items are either rows
//! `[path, parent, size, ...]` (trailing columns ignored) or objects
//! `{"path", "parent", "size"}`. A null or empty parent marks a root.
//! A metric table is an object mapping leaf paths to arrays of numbers. Its
//! keys may be plain paths or codec-encoded keys; both load to the same entry.

use crate::codec;
use crate::error::ApiError;
use crate::metrics::{MetricSchema, MetricTable};
use crate::tree::EdgeRecord;
use serde_json::Value;
use std::path::Path;

/// Parse an edge list from JSON text.
pub fn parse_edges(json: &str) -> Result<Vec<EdgeRecord>, ApiError> {
    let value: Value = serde_json::from_str(json)
        .map_err(|e| ApiError::MalformedInput(format!("Edge list is not valid JSON: {}", e)))?;
    let items = value
        .as_array()
        .ok_or_else(|| ApiError::MalformedInput("Edge list must be a JSON array".to_string()))?;

    items
        .iter()
        .enumerate()
        .map(|(idx, item)| parse_edge(item).map_err(|msg| {
            ApiError::MalformedInput(format!("Edge {}: {}", idx, msg))
        }))
        .collect()
}

fn parse_edge(item: &Value) -> Result<EdgeRecord, String> {
    let (path, parent, size) = match item {
        Value::Array(row) => {
            if row.len() < 3 {
                return Err(format!("expected at least 3 columns, got {}", row.len()));
            }
            (&row[0], &row[1], &row[2])
        }
        Value::Object(fields) => (
            fields.get("path").unwrap_or(&Value::Null),
            fields.get("parent").unwrap_or(&Value::Null),
            fields.get("size").unwrap_or(&Value::Null),
        ),
        other => return Err(format!("expected array or object, got {}", other)),
    };

    let path = path
        .as_str()
        .filter(|p| !p.is_empty())
        .ok_or_else(|| "path must be a non-empty string".to_string())?;
    let parent = match parent {
        Value::Null => "",
        Value::String(p) => p.as_str(),
        other => return Err(format!("parent must be a string or null, got {}", other)),
    };

    Ok(EdgeRecord::new(path, parent, parse_size(size)?))
}

fn parse_size(value: &Value) -> Result<u64, String> {
    match value {
        Value::Number(n) => {
            if let Some(size) = n.as_u64() {
                return Ok(size);
            }
            match n.as_f64() {
                Some(f) if f >= 0.0 && f.fract() == 0.0 => Ok(f as u64),
                _ => Err(format!("size must be a non-negative integer, got {}", n)),
            }
        }
        Value::String(s) => s
            .trim()
            .parse::<u64>()
            .map_err(|_| format!("size must be a non-negative integer, got \"{}\"", s)),
        other => Err(format!("size must be a non-negative integer, got {}", other)),
    }
}

/// Parse a metric table from JSON text and check it against `schema`.
pub fn parse_metric_table(json: &str, schema: &MetricSchema) -> Result<MetricTable, ApiError> {
    let value: Value = serde_json::from_str(json).map_err(|e| {
        ApiError::MalformedInput(format!("Metric table is not valid JSON: {}", e))
    })?;
    let entries = value.as_object().ok_or_else(|| {
        ApiError::MalformedInput("Metric table must be a JSON object".to_string())
    })?;

    let mut table = MetricTable::new();
    for (path, values) in entries {
        let values = values.as_array().ok_or_else(|| {
            ApiError::MalformedInput(format!("Metric entry for '{}' must be an array", path))
        })?;
        let numbers = values
            .iter()
            .map(|v| {
                v.as_f64().ok_or_else(|| {
                    ApiError::MalformedInput(format!(
                        "Metric entry for '{}' has non-numeric value {}",
                        path, v
                    ))
                })
            })
            .collect::<Result<Vec<f64>, ApiError>>()?;
        table.insert(&codec::decode(path), numbers);
    }

    table.validate(schema)?;
    Ok(table)
}

/// Read and parse an edge list file.
pub fn load_edges(path: &Path) -> Result<Vec<EdgeRecord>, ApiError> {
    parse_edges(&read_input(path)?)
}

/// Read and parse a metric table file.
pub fn load_metric_table(path: &Path, schema: &MetricSchema) -> Result<MetricTable, ApiError> {
    parse_metric_table(&read_input(path)?, schema)
}

fn read_input(path: &Path) -> Result<String, ApiError> {
    std::fs::read_to_string(path).map_err(|e| {
        ApiError::MalformedInput(format!("Failed to read {}: {}", path.display(), e))
    })
}
