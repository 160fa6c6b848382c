#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use common::{container, doc, new_graph, position_of};
use serde_json::json;
use statex_core::graph::{GraphStore, MutationOp};
use statex_core::importer::order_changes;
use statex_core::model::{ChangeKind, ChangeRecord};
use statex_core::{key, Importer, StatexError};

#[tokio::test]
async fn test_pointer_meta_delete_precedes_pointer_put() {
    let graph = new_graph();
    let node = container(&graph).await;
    let importer = Importer::new(&graph).await.unwrap();

    importer
        .apply(
            &node,
            &doc(json!({
                "children": [
                    {"id": "@meta:Old", "attributes": {"name": "Old"}},
                    {"id": "@meta:New", "attributes": {"name": "New"}},
                    {
                        "id": "@meta:Wire",
                        "attributes": {"name": "Wire"},
                        "pointer_meta": {"src": {"min": 0, "max": 1, "@meta:Old": {"min": -1, "max": 1}}},
                        "pointers": {"src": "@meta:Old"}
                    }
                ]
            })),
        )
        .await
        .unwrap();
    graph.take_journal().unwrap();

    let wire = common::meta_named(&graph, "Wire").await;
    let old = common::meta_named(&graph, "Old").await;
    let new = common::meta_named(&graph, "New").await;

    importer
        .apply(
            &wire,
            &doc(json!({
                "pointer_meta": {"src": {"min": 0, "max": 1, new.path(): {"min": -1, "max": 1}}},
                "pointers": {"base": "/1", "src": new.path()}
            })),
        )
        .await
        .unwrap();

    let journal = graph.take_journal().unwrap();
    let meta_delete = position_of(&journal, MutationOp::DelPointerMetaTarget);
    let meta_put = position_of(&journal, MutationOp::SetPointerMetaTarget);
    let pointer_put = position_of(&journal, MutationOp::SetPointer);
    assert!(meta_delete < meta_put, "{journal:?}");
    assert!(meta_put < pointer_put, "{journal:?}");

    let meta = graph.pointer_meta(&wire, "src").await.unwrap().unwrap();
    assert!(!meta.targets.contains_key(old.path()));
    assert!(meta.targets.contains_key(new.path()));
    assert_eq!(
        graph.pointer_path(&wire, "src").await.unwrap(),
        Some(new.path().to_string())
    );
}

#[test]
fn test_reversed_diff_output_is_reordered() {
    let changes = vec![
        ChangeRecord::put(key!["pointers", "src"], json!("/3")),
        ChangeRecord::delete(key!["pointer_meta", "src", "/2"]),
    ];
    let ordered = order_changes(changes).unwrap();
    assert_eq!(ordered[0].kind, ChangeKind::Delete);
    assert_eq!(ordered[0].key_string(), "pointer_meta.src./2");
    assert_eq!(ordered[1].key_string(), "pointers.src");
}

#[tokio::test]
async fn test_membership_precedes_member_data() {
    let graph = new_graph();
    let node = container(&graph).await;
    let importer = Importer::new(&graph).await.unwrap();

    importer
        .apply(
            &node,
            &doc(json!({
                "member_registry": {"items": {"/1": {"slot": 1}}},
                "member_attributes": {"items": {"/1": {"weight": 2}}},
                "sets": {"items": ["/1"]},
                "attributes": {"name": "box"}
            })),
        )
        .await
        .unwrap();

    let journal = graph.take_journal().unwrap();
    let attribute = position_of(&journal, MutationOp::SetAttribute);
    let add = position_of(&journal, MutationOp::AddMember);
    let member_attribute = position_of(&journal, MutationOp::SetMemberAttribute);
    let member_registry = position_of(&journal, MutationOp::SetMemberRegistry);
    assert!(attribute < add);
    assert!(add < member_attribute);
    assert!(member_attribute < member_registry);
}

#[tokio::test]
async fn test_nested_attribute_value_is_unsupported() {
    let graph = new_graph();
    let node = container(&graph).await;
    graph
        .set_attribute(&node, "name", json!({"nested": 0}))
        .await
        .unwrap();
    let importer = Importer::new(&graph).await.unwrap();

    let err = importer
        .apply(&node, &doc(json!({"attributes": {"name": {"nested": 1}}})))
        .await
        .unwrap_err();

    match err {
        StatexError::UnsupportedShape { category, key } => {
            assert_eq!(category, "attributes");
            assert_eq!(key, "attributes.name.nested");
        }
        other => panic!("expected UnsupportedShape, got {other:?}"),
    }
    assert_eq!(
        graph.attribute(&node, "name").await.unwrap(),
        Some(json!({"nested": 0}))
    );
}

#[tokio::test]
async fn test_nested_registry_value_is_unsupported() {
    let graph = new_graph();
    let node = container(&graph).await;
    graph
        .set_registry(&node, "position", json!({"x": 1}))
        .await
        .unwrap();
    let importer = Importer::new(&graph).await.unwrap();

    let err = importer
        .apply(&node, &doc(json!({"registry": {"position": {"x": 2}}})))
        .await
        .unwrap_err();
    assert!(matches!(err, StatexError::UnsupportedShape { category, .. } if category == "registry"));
}

#[tokio::test]
async fn test_plan_reports_sorted_changes_without_mutating() {
    let graph = new_graph();
    let node = container(&graph).await;
    let importer = Importer::new(&graph).await.unwrap();

    let plan = importer
        .plan(
            &node,
            &doc(json!({
                "sets": {"s": ["/1"]},
                "pointers": {"base": "/1", "p": "/1"},
                "attributes": {"name": "planned"}
            })),
        )
        .await
        .unwrap();

    let keys: Vec<String> = plan.iter().map(ChangeRecord::key_string).collect();
    assert_eq!(keys, vec!["attributes.name", "pointers.p", "sets.s"]);
    assert!(graph.take_journal().unwrap().is_empty());
}
