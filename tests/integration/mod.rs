//! Integration tests for tree building, retrieval and export

mod cli_contracts;
mod concurrency;
mod retrieval_properties;
mod scenarios;
mod support;
