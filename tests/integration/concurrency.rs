use crate::integration::support::{builder, layered_edges, sample_edges, sample_metrics};
use bugmap::metrics::MetricTable;
use bugmap::store::{DocumentStore, SledDocumentStore};
use bugmap::tree::SubtreeEngine;
use std::sync::Arc;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_builds_of_distinct_queries() {
    let store: Arc<dyn DocumentStore> = Arc::new(SledDocumentStore::temporary().unwrap());
    let edges = layered_edges(4, 3);

    let mut handles = Vec::new();
    for i in 0..8 {
        let store = Arc::clone(&store);
        let edges = edges.clone();
        handles.push(tokio::spawn(async move {
            builder(store)
                .build(&edges, &MetricTable::new(), &format!("Q{}", i))
                .await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let engine = SubtreeEngine::new(store);
    for i in 0..8 {
        let tree = engine
            .get_subtree(&format!("Q{}", i), "/r", 0)
            .await
            .unwrap();
        assert_eq!(tree.len(), edges.len());
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_reads_agree() {
    let store: Arc<dyn DocumentStore> = Arc::new(SledDocumentStore::temporary().unwrap());
    builder(store.clone())
        .build(&sample_edges(), &sample_metrics(), "Q")
        .await
        .unwrap();
    let engine = Arc::new(SubtreeEngine::new(store));

    let mut handles = Vec::new();
    for _ in 0..16 {
        let engine = Arc::clone(&engine);
        handles.push(tokio::spawn(async move {
            engine.get_subtree("Q", "/a", 1).await
        }));
    }
    let first = engine.get_subtree("Q", "/a", 1).await.unwrap();
    for handle in handles {
        assert_eq!(handle.await.unwrap().unwrap(), first);
    }
}
