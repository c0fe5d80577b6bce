use crate::integration::support::{builder, layered_edges};
use bugmap::metrics::MetricTable;
use bugmap::store::{DocumentStore, MemoryDocumentStore};
use bugmap::tree::{height, restrict_depth, EdgeRecord, SubtreeEngine};
use proptest::prelude::*;
use std::collections::HashSet;
use std::sync::Arc;

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
}

/// Random tree: node `i` hangs below a node with a smaller index.
fn arb_edges() -> impl Strategy<Value = Vec<EdgeRecord>> {
    prop::collection::vec((any::<prop::sample::Index>(), 0u64..100), 0..40).prop_map(|picks| {
        let mut paths = vec!["/r".to_string()];
        let mut edges = vec![EdgeRecord::root("/r", 0)];
        for (i, (pick, size)) in picks.into_iter().enumerate() {
            let parent = paths[pick.index(paths.len())].clone();
            let path = format!("{}/n{}", parent, i);
            edges.push(EdgeRecord::new(path.clone(), parent, size));
            paths.push(path);
        }
        edges
    })
}

proptest! {
    #[test]
    fn bounded_subtree_is_restriction_of_full(edges in arb_edges(), depth in 1u32..6) {
        let rt = runtime();
        let (full, bounded) = rt.block_on(async {
            let store: Arc<dyn DocumentStore> = Arc::new(MemoryDocumentStore::new());
            builder(store.clone())
                .build(&edges, &MetricTable::new(), "Q")
                .await
                .unwrap();
            let engine = SubtreeEngine::new(store);
            let full = engine.get_subtree("Q", "/r", 0).await.unwrap();
            let bounded = engine.get_subtree("Q", "/r", depth).await.unwrap();
            (full, bounded)
        });

        prop_assert_eq!(full.len(), edges.len());
        prop_assert!(height(&bounded, "/r") <= depth);
        prop_assert_eq!(bounded, restrict_depth(&full, "/r", depth));
    }

    #[test]
    fn built_keys_are_distinct(edges in arb_edges()) {
        let nodes = builder(Arc::new(MemoryDocumentStore::new()))
            .assemble(&edges, &MetricTable::new(), "Q")
            .unwrap();
        let keys: HashSet<&String> = nodes.values().map(|n| &n.key).collect();
        prop_assert_eq!(keys.len(), edges.len());
    }
}

#[tokio::test]
async fn deep_tree_respects_each_depth() {
    let edges = layered_edges(3, 5);
    let store: Arc<dyn DocumentStore> = Arc::new(MemoryDocumentStore::new());
    builder(store.clone())
        .build(&edges, &MetricTable::new(), "Q")
        .await
        .unwrap();
    let engine = SubtreeEngine::new(store);

    let full = engine.get_subtree("Q", "/r", 0).await.unwrap();
    assert_eq!(full.len(), edges.len());
    assert_eq!(height(&full, "/r"), 6);

    for depth in 1..=6 {
        let bounded = engine.get_subtree("Q", "/r", depth).await.unwrap();
        assert_eq!(height(&bounded, "/r"), depth);
        assert_eq!(bounded, restrict_depth(&full, "/r", depth));
    }
}

#[tokio::test]
async fn sentinel_root_returns_whole_scope() {
    let edges = vec![
        EdgeRecord::root("~", 5),
        EdgeRecord::new("~/x", "~", 2),
        EdgeRecord::new("~/y", "~", 3),
    ];
    let store: Arc<dyn DocumentStore> = Arc::new(MemoryDocumentStore::new());
    builder(store.clone())
        .build(&edges, &MetricTable::new(), "Q")
        .await
        .unwrap();

    let tree = SubtreeEngine::new(store)
        .get_subtree("Q", "~", 0)
        .await
        .unwrap();
    assert_eq!(tree.len(), 3);
}
