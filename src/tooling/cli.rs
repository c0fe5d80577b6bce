//! CLI Tooling
//!
//! Thin command layer over the builder, the retrieval engine and the treemap
//! export. Commands return their rendered output as a string.

use crate::aggregate;
use crate::config::{BugmapConfig, ConfigLoader};
use crate::error::ApiError;
use crate::ingest;
use crate::store::{DocumentStore, SledDocumentStore};
use crate::tooling::format;
use crate::tree::{SubtreeEngine, Tree, TreeBuilder};
use crate::views;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

/// Bugmap CLI - defect treemaps over source hierarchies
#[derive(Parser)]
#[command(name = "bugmap")]
#[command(about = "Build, query and export defect treemaps over source hierarchies")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Workspace root directory
    #[arg(long, default_value = ".")]
    pub workspace: PathBuf,

    /// Configuration file path (overrides default config loading)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    pub log_format: Option<String>,

    /// Log output (stdout, stderr, file, file+stderr, both)
    #[arg(long)]
    pub log_output: Option<String>,

    /// Log file path (if output includes "file")
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Build (or rebuild) the tree of a query scope
    Build {
        /// Query scope identifier
        #[arg(long)]
        query: String,
        /// JSON edge list
        #[arg(long)]
        edges: PathBuf,
        /// JSON metric table
        #[arg(long)]
        metrics: PathBuf,
    },
    /// Show the subtree below a path
    Subtree {
        #[arg(long)]
        query: String,
        /// Root path of the subtree (defaults to the whole-tree sentinel)
        #[arg(long)]
        root: Option<String>,
        /// Levels below the root, 0 for unbounded
        #[arg(long, default_value = "0")]
        depth: u32,
        /// Replace directory metrics by the average of their files
        #[arg(long)]
        averaged: bool,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Show every node of a query scope
    Tree {
        #[arg(long)]
        query: String,
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Export a subtree as treemap rows (JSON)
    Treemap {
        #[arg(long)]
        query: String,
        #[arg(long)]
        root: Option<String>,
        #[arg(long, default_value = "0")]
        depth: u32,
        /// Metric to export
        #[arg(long, default_value = "bugs")]
        metric: String,
        /// Divide values by the square root of node size
        #[arg(long)]
        normalize: bool,
        #[arg(long)]
        averaged: bool,
    },
    /// Sum and average metrics over the files below a path
    Aggregate {
        #[arg(long)]
        query: String,
        #[arg(long)]
        root: Option<String>,
        #[arg(long, default_value = "text")]
        format: String,
    },
}

/// Subcommand name, used in log events.
pub fn command_name(command: &Commands) -> &'static str {
    match command {
        Commands::Build { .. } => "build",
        Commands::Subtree { .. } => "subtree",
        Commands::Tree { .. } => "tree",
        Commands::Treemap { .. } => "treemap",
        Commands::Aggregate { .. } => "aggregate",
    }
}

/// Shared state for executing commands
pub struct CliContext {
    config: BugmapConfig,
    builder: TreeBuilder,
    engine: SubtreeEngine,
}

impl CliContext {
    /// Load configuration and open the sled store for a workspace.
    pub fn new(workspace_root: PathBuf, config_path: Option<PathBuf>) -> Result<Self, ApiError> {
        let config = match &config_path {
            Some(path) => ConfigLoader::load_from_file(path)?,
            None => ConfigLoader::load(&workspace_root)?,
        };
        let store_path = config.storage.resolve_store_path(&workspace_root)?;
        let store = Arc::new(SledDocumentStore::open(&store_path)?);
        info!(
            store = %store_path.display(),
            queries = store.scopes().len(),
            "Opened node store"
        );
        Ok(Self::with_store(config, store))
    }

    /// Build a context over an already open store.
    pub fn with_store(config: BugmapConfig, store: Arc<dyn DocumentStore>) -> Self {
        let timeout = config.retrieval.store_timeout();
        let builder = TreeBuilder::new(Arc::clone(&store), config.tree.metrics.clone())
            .with_metric_key_prefix_len(config.tree.metric_key_prefix_len)
            .with_timeout(timeout);
        let engine = SubtreeEngine::new(store)
            .with_root_sentinel(config.tree.root_sentinel.clone())
            .with_timeout(timeout);
        Self {
            config,
            builder,
            engine,
        }
    }

    pub fn config(&self) -> &BugmapConfig {
        &self.config
    }

    /// Execute a CLI command
    pub async fn execute(&self, command: &Commands) -> Result<String, ApiError> {
        let result = self.execute_inner(command).await;
        match &result {
            Ok(_) => info!(command = command_name(command), "Command completed"),
            Err(e) => tracing::error!(command = command_name(command), error = %e, "Command failed"),
        }
        result
    }

    async fn execute_inner(&self, command: &Commands) -> Result<String, ApiError> {
        match command {
            Commands::Build {
                query,
                edges,
                metrics,
            } => {
                let edges = ingest::load_edges(edges)?;
                let table = ingest::load_metric_table(metrics, self.builder.schema())?;
                let report = self.builder.build(&edges, &table, query).await?;
                Ok(format::format_build_report(&report))
            }
            Commands::Subtree {
                query,
                root,
                depth,
                averaged,
                format: output,
            } => {
                let root = self.root_or_sentinel(root);
                let tree = self.fetch(query, root, *depth, *averaged).await?;
                match output.as_str() {
                    "json" => to_json(&tree),
                    "text" => Ok(format::format_subtree_text(&tree, root, &self.metric_names())),
                    other => Err(invalid_format(other)),
                }
            }
            Commands::Tree {
                query,
                format: output,
            } => {
                let tree = self.engine.get_tree(query).await?;
                match output.as_str() {
                    "json" => to_json(&tree),
                    "text" => Ok(format::format_tree_text(&tree, &self.metric_names())),
                    other => Err(invalid_format(other)),
                }
            }
            Commands::Treemap {
                query,
                root,
                depth,
                metric,
                normalize,
                averaged,
            } => {
                if !self.config.tree.metrics.contains(metric) {
                    return Err(ApiError::MalformedInput(format!(
                        "Unknown metric '{}' (expected one of: {})",
                        metric,
                        self.metric_names().join(", ")
                    )));
                }
                let root = self.root_or_sentinel(root);
                let tree = self.fetch(query, root, *depth, *averaged).await?;
                let treemap = views::to_treemap(&tree, root, metric, *normalize)?;
                to_json(&treemap)
            }
            Commands::Aggregate {
                query,
                root,
                format: output,
            } => {
                let root = self.root_or_sentinel(root);
                let tree = self.engine.get_subtree(query, root, 0).await?;
                let totals = aggregate::aggregate(&tree, root)?;
                let sums = totals.pooled_sums(&self.config.tree.metrics);
                let averages = aggregate::average_metrics(&tree, root)?;
                match output.as_str() {
                    "json" => to_json(&serde_json::json!({
                        "root": root,
                        "file_count": totals.file_count,
                        "metric_sums": sums,
                        "averages": averages,
                    })),
                    "text" => Ok(format::format_aggregate_text(
                        root,
                        totals.file_count,
                        &sums,
                        &averages,
                    )),
                    other => Err(invalid_format(other)),
                }
            }
        }
    }

    async fn fetch(
        &self,
        query: &str,
        root: &str,
        depth: u32,
        averaged: bool,
    ) -> Result<Tree, ApiError> {
        if averaged {
            self.engine.get_averaged_subtree(query, root, depth).await
        } else {
            self.engine.get_subtree(query, root, depth).await
        }
    }

    fn root_or_sentinel<'a>(&'a self, root: &'a Option<String>) -> &'a str {
        root.as_deref().unwrap_or(self.engine.root_sentinel())
    }

    fn metric_names(&self) -> Vec<String> {
        self.config
            .tree
            .metrics
            .names()
            .map(str::to_string)
            .collect()
    }
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String, ApiError> {
    serde_json::to_string_pretty(value)
        .map_err(|e| ApiError::MalformedInput(format!("Failed to serialize output: {}", e)))
}

fn invalid_format(format: &str) -> ApiError {
    ApiError::MalformedInput(format!(
        "Invalid output format: {} (must be 'text' or 'json')",
        format
    ))
}
