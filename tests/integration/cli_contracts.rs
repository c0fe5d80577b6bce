use bugmap::config::ConfigLoader;
use bugmap::error::ApiError;
use bugmap::store::{DocumentStore, MemoryDocumentStore};
use bugmap::tooling::cli::{CliContext, Commands};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

fn write_inputs(dir: &Path) -> (std::path::PathBuf, std::path::PathBuf) {
    let edges = dir.join("edges.json");
    let metrics = dir.join("metrics.json");
    fs::write(
        &edges,
        r#"[["/a", "", 10], ["/a/b", "/a", 4], ["/a/c", "/a", 6]]"#,
    )
    .unwrap();
    fs::write(&metrics, r#"{"/a/b": [2, 1], "/a/c": [0, 0]}"#).unwrap();
    (edges, metrics)
}

async fn built_context(dir: &Path) -> CliContext {
    let store: Arc<dyn DocumentStore> = Arc::new(MemoryDocumentStore::new());
    let context = CliContext::with_store(ConfigLoader::default(), store);
    let (edges, metrics) = write_inputs(dir);
    context
        .execute(&Commands::Build {
            query: "Q".to_string(),
            edges,
            metrics,
        })
        .await
        .unwrap();
    context
}

#[tokio::test]
async fn treemap_json_contract() {
    let temp_dir = TempDir::new().unwrap();
    let context = built_context(temp_dir.path()).await;

    let output = context
        .execute(&Commands::Treemap {
            query: "Q".to_string(),
            root: Some("/a".to_string()),
            depth: 1,
            metric: "bugs".to_string(),
            normalize: false,
            averaged: false,
        })
        .await
        .unwrap();

    let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();
    assert_eq!(
        parsed,
        serde_json::json!([
            ["Directory/File", "Parent Directory", "Size", "Bugs"],
            ["/a", null, 10, 0],
            ["/a/b", "/a", 4, 2],
            ["/a/c", "/a", 6, 0]
        ])
    );
}

#[tokio::test]
async fn treemap_rejects_unknown_metric() {
    let temp_dir = TempDir::new().unwrap();
    let context = built_context(temp_dir.path()).await;

    let result = context
        .execute(&Commands::Treemap {
            query: "Q".to_string(),
            root: Some("/a".to_string()),
            depth: 0,
            metric: "lines".to_string(),
            normalize: false,
            averaged: false,
        })
        .await;
    assert!(matches!(result, Err(ApiError::MalformedInput(_))));
}

#[tokio::test]
async fn subtree_json_contract() {
    let temp_dir = TempDir::new().unwrap();
    let context = built_context(temp_dir.path()).await;

    let output = context
        .execute(&Commands::Subtree {
            query: "Q".to_string(),
            root: Some("/a/b".to_string()),
            depth: 0,
            averaged: false,
            format: "json".to_string(),
        })
        .await
        .unwrap();

    let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();
    let record = parsed.get("/a/b").unwrap();
    assert_eq!(record.get("size").and_then(|v| v.as_u64()), Some(4));
    assert_eq!(
        record.pointer("/metrics/security_bug_ratio").and_then(|v| v.as_f64()),
        Some(0.5)
    );
    assert_eq!(parsed.as_object().unwrap().len(), 1);
}

#[tokio::test]
async fn aggregate_json_contract() {
    let temp_dir = TempDir::new().unwrap();
    let context = built_context(temp_dir.path()).await;

    let output = context
        .execute(&Commands::Aggregate {
            query: "Q".to_string(),
            root: Some("/a".to_string()),
            format: "json".to_string(),
        })
        .await
        .unwrap();

    let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();
    assert_eq!(parsed.get("file_count").and_then(|v| v.as_u64()), Some(2));
    assert_eq!(parsed.pointer("/metric_sums/bugs").and_then(|v| v.as_f64()), Some(2.0));
    assert_eq!(parsed.pointer("/averages/bugs").and_then(|v| v.as_f64()), Some(1.0));
}

#[tokio::test]
async fn text_output_and_bad_format() {
    let temp_dir = TempDir::new().unwrap();
    let context = built_context(temp_dir.path()).await;

    let text = context
        .execute(&Commands::Subtree {
            query: "Q".to_string(),
            root: Some("/a".to_string()),
            depth: 1,
            averaged: false,
            format: "text".to_string(),
        })
        .await
        .unwrap();
    assert!(text.contains("/a/b"));
    assert!(text.contains("3 nodes"));

    let result = context
        .execute(&Commands::Aggregate {
            query: "Q".to_string(),
            root: None,
            format: "yaml".to_string(),
        })
        .await;
    assert!(result.is_err());
}

#[tokio::test]
async fn workspace_config_selects_store_path() {
    let temp_dir = TempDir::new().unwrap();
    let workspace = temp_dir.path().join("workspace");
    fs::create_dir_all(&workspace).unwrap();
    let config_path = temp_dir.path().join("bugmap.toml");
    fs::write(
        &config_path,
        r#"
        [storage]
        store_path = "nodes"
        "#,
    )
    .unwrap();
    let (edges, metrics) = write_inputs(temp_dir.path());

    {
        let context = CliContext::new(workspace.clone(), Some(config_path.clone())).unwrap();
        context
            .execute(&Commands::Build {
                query: "Q".to_string(),
                edges,
                metrics,
            })
            .await
            .unwrap();
    }
    assert!(workspace.join("nodes").exists());

    let context = CliContext::new(workspace, Some(config_path)).unwrap();
    let output = context
        .execute(&Commands::Treemap {
            query: "Q".to_string(),
            root: Some("/a".to_string()),
            depth: 0,
            metric: "security_bugs".to_string(),
            normalize: true,
            averaged: false,
        })
        .await
        .unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();
    assert_eq!(parsed.as_array().unwrap().len(), 4);
    assert_eq!(parsed[2][3].as_f64(), Some(0.5));
}

#[tokio::test]
async fn tree_command_lists_whole_scope() {
    let temp_dir = TempDir::new().unwrap();
    let context = built_context(temp_dir.path()).await;

    let output = context
        .execute(&Commands::Tree {
            query: "Q".to_string(),
            format: "json".to_string(),
        })
        .await
        .unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();
    let paths: Vec<&String> = parsed.as_object().unwrap().keys().collect();
    assert_eq!(paths, vec!["/a", "/a/b", "/a/c"]);

    let text = context
        .execute(&Commands::Tree {
            query: "Q".to_string(),
            format: "text".to_string(),
        })
        .await
        .unwrap();
    assert!(text.contains("  /a/c"));

    assert!(matches!(
        context
            .execute(&Commands::Tree {
                query: "other".to_string(),
                format: "json".to_string(),
            })
            .await,
        Err(ApiError::NotFound(_))
    ));
}
