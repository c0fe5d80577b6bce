//! Config merge: source precedence and deserialization.

pub mod merge_policy;
pub mod service;
