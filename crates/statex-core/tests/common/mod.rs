use serde_json::Value;
use statex_core::graph::{GraphMutation, GraphStore, MemoryGraph, MemoryNode, MutationOp};
use statex_core::{Importer, StateDocument};

/// Fresh graph holding only the root and the FCO prototype
#[allow(dead_code)]
pub fn new_graph() -> MemoryGraph {
    MemoryGraph::new()
}

/// Create an empty node under the root to reconcile into
///
/// Tests reconcile below a container rather than the root itself, so that a
/// `children` list never has to mention the FCO.
#[allow(dead_code)]
pub async fn container(graph: &MemoryGraph) -> MemoryNode {
    let importer = Importer::new(graph).await.unwrap();
    let root = graph.root().await.unwrap();
    let node = importer
        .import(&root, &StateDocument::new().attribute("name", "container"))
        .await
        .unwrap();
    graph.take_journal().unwrap();
    node
}

/// Child of `parent` whose `name` attribute equals `name`
#[allow(dead_code)]
pub async fn child_named(graph: &MemoryGraph, parent: &MemoryNode, name: &str) -> MemoryNode {
    for child in graph.load_children(parent).await.unwrap() {
        if graph.attribute(&child, "name").await.unwrap() == Some(Value::from(name)) {
            return child;
        }
    }
    panic!("no child named {name} under {}", parent.path());
}

/// Meta node registered under `name`
#[allow(dead_code)]
pub async fn meta_named(graph: &MemoryGraph, name: &str) -> MemoryNode {
    for node in graph.meta_nodes().await.unwrap() {
        if graph.attribute(&node, "name").await.unwrap() == Some(Value::from(name)) {
            return node;
        }
    }
    panic!("no meta node named {name}");
}

/// Position of the first journal entry with `op`
#[allow(dead_code)]
pub fn position_of(journal: &[GraphMutation], op: MutationOp) -> usize {
    journal
        .iter()
        .position(|m| m.op == op)
        .unwrap_or_else(|| panic!("{op:?} not in journal: {journal:?}"))
}

/// Document from a `json!` literal
#[allow(dead_code)]
pub fn doc(value: Value) -> StateDocument {
    serde_json::from_value(value).unwrap()
}
