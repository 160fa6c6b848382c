use statex_core::graph::{GraphStore, MemoryGraph, MemoryNode};
use statex_core::{Importer, StateDocument};
use tempfile::TempDir;

/// Scratch directory plus a snapshot path inside it
#[allow(dead_code)]
pub fn scratch() -> (TempDir, std::path::PathBuf) {
    let dir = TempDir::new().expect("Failed to create temp directory");
    let path = dir.path().join("graph.json");
    (dir, path)
}

/// Graph with one imported node under the root, built from `document`
#[allow(dead_code)]
pub async fn populated(document: &StateDocument) -> (MemoryGraph, MemoryNode) {
    let graph = MemoryGraph::new();
    let root = graph.root().await.unwrap();
    let node = Importer::new(&graph)
        .await
        .unwrap()
        .import(&root, document)
        .await
        .unwrap();
    (graph, node)
}
