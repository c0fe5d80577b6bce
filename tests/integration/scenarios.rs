use crate::integration::support::{builder, sample_edges, sample_metrics};
use bugmap::error::ApiError;
use bugmap::store::{DocumentStore, MemoryDocumentStore, SledDocumentStore};
use bugmap::tree::SubtreeEngine;
use bugmap::views::to_treemap;
use std::sync::Arc;

fn stores() -> Vec<(&'static str, Arc<dyn DocumentStore>)> {
    vec![
        ("memory", Arc::new(MemoryDocumentStore::new())),
        ("sled", Arc::new(SledDocumentStore::temporary().unwrap())),
    ]
}

#[tokio::test]
async fn depth_one_subtree_returns_three_records() {
    for (name, store) in stores() {
        builder(store.clone())
            .build(&sample_edges(), &sample_metrics(), "Q")
            .await
            .unwrap();
        let tree = SubtreeEngine::new(store)
            .get_subtree("Q", "/a", 1)
            .await
            .unwrap();

        assert_eq!(tree.len(), 3, "{}", name);
        let root = &tree["/a"];
        let mut children: Vec<String> = root.child_paths().collect();
        children.sort();
        assert_eq!(children, vec!["/a/b", "/a/c"], "{}", name);
        assert!(root.metrics.values().all(|v| *v == 0.0), "{}", name);

        let b = &tree["/a/b"].metrics;
        assert_eq!(b["bugs"], 2.0);
        assert_eq!(b["security_bugs"], 1.0);
        assert_eq!(b["security_bug_ratio"], 0.5);

        let c = &tree["/a/c"].metrics;
        assert_eq!(c["bugs"], 0.0);
        assert_eq!(c["security_bug_ratio"], 0.0);
    }
}

#[tokio::test]
async fn leaf_subtree_is_just_the_leaf() {
    for (name, store) in stores() {
        builder(store.clone())
            .build(&sample_edges(), &sample_metrics(), "Q")
            .await
            .unwrap();
        let tree = SubtreeEngine::new(store)
            .get_subtree("Q", "/a/b", 0)
            .await
            .unwrap();
        assert_eq!(tree.keys().collect::<Vec<_>>(), vec!["/a/b"], "{}", name);
    }
}

#[tokio::test]
async fn missing_root_is_not_found() {
    for (name, store) in stores() {
        builder(store.clone())
            .build(&sample_edges(), &sample_metrics(), "Q")
            .await
            .unwrap();
        let result = SubtreeEngine::new(store)
            .get_subtree("Q", "/missing", 0)
            .await;
        assert!(matches!(result, Err(ApiError::NotFound(_))), "{}", name);
    }
}

#[tokio::test]
async fn treemap_rows_for_depth_one_subtree() {
    let store: Arc<dyn DocumentStore> = Arc::new(SledDocumentStore::temporary().unwrap());
    builder(store.clone())
        .build(&sample_edges(), &sample_metrics(), "Q")
        .await
        .unwrap();
    let tree = SubtreeEngine::new(store)
        .get_subtree("Q", "/a", 1)
        .await
        .unwrap();

    let treemap = to_treemap(&tree, "/a", "bugs", false).unwrap();
    assert_eq!(
        serde_json::to_value(&treemap).unwrap(),
        serde_json::json!([
            ["Directory/File", "Parent Directory", "Size", "Bugs"],
            ["/a", null, 10, 0],
            ["/a/b", "/a", 4, 2],
            ["/a/c", "/a", 6, 0]
        ])
    );
}

#[tokio::test]
async fn query_scopes_are_isolated() {
    let store: Arc<dyn DocumentStore> = Arc::new(SledDocumentStore::temporary().unwrap());
    builder(store.clone())
        .build(&sample_edges(), &sample_metrics(), "Q1")
        .await
        .unwrap();
    let engine = SubtreeEngine::new(store);

    assert_eq!(engine.get_subtree("Q1", "/a", 0).await.unwrap().len(), 3);
    assert!(matches!(
        engine.get_subtree("Q2", "/a", 0).await,
        Err(ApiError::NotFound(_))
    ));
}

#[tokio::test]
async fn rebuild_is_byte_identical() {
    let store: Arc<dyn DocumentStore> = Arc::new(SledDocumentStore::temporary().unwrap());
    let b = builder(store.clone());
    b.build(&sample_edges(), &sample_metrics(), "Q").await.unwrap();
    let first = store.get_all("Q").await.unwrap();
    b.build(&sample_edges(), &sample_metrics(), "Q").await.unwrap();
    let second = store.get_all("Q").await.unwrap();

    assert_eq!(
        bincode::serialize(&first).unwrap(),
        bincode::serialize(&second).unwrap()
    );
}

#[tokio::test]
async fn special_characters_in_paths_survive_storage() {
    let store: Arc<dyn DocumentStore> = Arc::new(SledDocumentStore::temporary().unwrap());
    let edges = vec![
        bugmap::tree::EdgeRecord::root("/src", 9),
        bugmap::tree::EdgeRecord::new("/src/v1.2", "/src", 5),
        bugmap::tree::EdgeRecord::new("/src/v1.2/$cost%.cc", "/src/v1.2", 4),
    ];
    let metrics = [("/src/v1.2/$cost%.cc".to_string(), vec![1.0, 1.0])]
        .into_iter()
        .collect();
    builder(store.clone())
        .build(&edges, &metrics, "Q")
        .await
        .unwrap();

    let tree = SubtreeEngine::new(store)
        .get_subtree("Q", "/src/v1.2", 0)
        .await
        .unwrap();
    assert_eq!(tree["/src/v1.2/$cost%.cc"].metrics["bugs"], 1.0);
    assert_eq!(
        tree["/src/v1.2/$cost%.cc"].parent_path().as_deref(),
        Some("/src/v1.2")
    );
}
