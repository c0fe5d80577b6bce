use bugmap::metrics::{MetricSchema, MetricTable};
use bugmap::store::DocumentStore;
use bugmap::tree::{EdgeRecord, TreeBuilder};
use std::sync::Arc;

/// Three-node tree used across the scenario tests.
pub fn sample_edges() -> Vec<EdgeRecord> {
    vec![
        EdgeRecord::new("/a", "", 10),
        EdgeRecord::new("/a/b", "/a", 4),
        EdgeRecord::new("/a/c", "/a", 6),
    ]
}

pub fn sample_metrics() -> MetricTable {
    [
        ("/a/b".to_string(), vec![2.0, 1.0]),
        ("/a/c".to_string(), vec![0.0, 0.0]),
    ]
    .into_iter()
    .collect()
}

pub fn builder(store: Arc<dyn DocumentStore>) -> TreeBuilder {
    TreeBuilder::new(store, MetricSchema::default())
}

/// Chain-and-fan tree: `/r` with `width` directories, each holding a file and
/// a nested directory down to `depth` levels.
pub fn layered_edges(width: usize, depth: usize) -> Vec<EdgeRecord> {
    let mut edges = vec![EdgeRecord::root("/r", 0)];
    for w in 0..width {
        let mut parent = "/r".to_string();
        for d in 0..depth {
            let dir = format!("{}/d{}_{}", parent, w, d);
            edges.push(EdgeRecord::new(dir.clone(), parent.clone(), 0));
            edges.push(EdgeRecord::new(format!("{}/f.cc", dir), dir.clone(), 3));
            parent = dir;
        }
    }
    edges
}
