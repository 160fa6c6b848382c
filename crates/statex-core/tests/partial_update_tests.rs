#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use common::{child_named, container, doc, new_graph};
use serde_json::json;
use statex_core::graph::{GraphStore, MutationOp};
use statex_core::Importer;

async fn with_three_children() -> (statex_core::MemoryGraph, statex_core::MemoryNode) {
    let graph = new_graph();
    let node = container(&graph).await;
    let importer = Importer::new(&graph).await.unwrap();
    importer
        .apply(
            &node,
            &doc(json!({
                "children": [
                    {"id": "@name:a", "attributes": {"name": "a"}},
                    {"id": "@name:b", "attributes": {"name": "b"}},
                    {"id": "@name:c", "attributes": {"name": "c"}}
                ]
            })),
        )
        .await
        .unwrap();
    graph.take_journal().unwrap();
    (graph, node)
}

#[tokio::test]
async fn test_omitted_children_are_never_deleted() {
    let (graph, node) = with_three_children().await;
    let importer = Importer::new(&graph).await.unwrap();

    importer
        .apply(&node, &doc(json!({"attributes": {"name": "renamed"}})))
        .await
        .unwrap();

    assert_eq!(graph.load_children(&node).await.unwrap().len(), 3);
    let journal = graph.take_journal().unwrap();
    assert!(journal.iter().all(|m| m.op != MutationOp::DeleteNode));
}

#[tokio::test]
async fn test_empty_document_is_a_no_op() {
    let (graph, node) = with_three_children().await;
    let importer = Importer::new(&graph).await.unwrap();

    importer.apply(&node, &doc(json!({}))).await.unwrap();

    assert!(graph.take_journal().unwrap().is_empty());
    assert_eq!(graph.load_children(&node).await.unwrap().len(), 3);
}

#[tokio::test]
async fn test_explicit_children_delete_unmatched() {
    let (graph, node) = with_three_children().await;
    let importer = Importer::new(&graph).await.unwrap();

    importer
        .apply(
            &node,
            &doc(json!({"children": [{"id": "@name:b", "attributes": {"name": "b"}}]})),
        )
        .await
        .unwrap();

    let children = graph.load_children(&node).await.unwrap();
    assert_eq!(children.len(), 1);
    assert_eq!(children[0], child_named(&graph, &node, "b").await);
}

#[tokio::test]
async fn test_explicit_empty_children_delete_all() {
    let (graph, node) = with_three_children().await;
    let importer = Importer::new(&graph).await.unwrap();

    importer
        .apply(&node, &doc(json!({"children": []})))
        .await
        .unwrap();

    assert!(graph.load_children(&node).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_grandchildren_untouched_when_child_omits_children() {
    let graph = new_graph();
    let node = container(&graph).await;
    let importer = Importer::new(&graph).await.unwrap();
    importer
        .apply(
            &node,
            &doc(json!({
                "children": [{
                    "id": "@name:a",
                    "attributes": {"name": "a"},
                    "children": [{"id": "@name:leaf", "attributes": {"name": "leaf"}}]
                }]
            })),
        )
        .await
        .unwrap();

    importer
        .apply(
            &node,
            &doc(json!({"children": [{"id": "@name:a", "attributes": {"name": "a", "v": 1}}]})),
        )
        .await
        .unwrap();

    let a = child_named(&graph, &node, "a").await;
    assert_eq!(graph.load_children(&a).await.unwrap().len(), 1);
}
