#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use common::{container, doc, new_graph};
use serde_json::json;
use statex_core::core_types::RequestId;
use statex_core::{ExError, ExErrorKind, Importer, StatexError};

#[test]
fn test_every_variant_maps_to_a_code() {
    let cases = vec![
        (
            StatexError::UnresolvableReferenceGroup {
                pending: vec!["@id:a".to_string()],
            },
            "ERR_UNRESOLVABLE_REFERENCE_GROUP",
        ),
        (
            StatexError::MissingPrototype {
                selector: "@name:x".to_string(),
                parent_path: "/2".to_string(),
            },
            "ERR_MISSING_PROTOTYPE",
        ),
        (
            StatexError::InvalidSelector {
                selector: "@:x".to_string(),
                reason: "empty tag".to_string(),
            },
            "ERR_INVALID_SELECTOR",
        ),
        (
            StatexError::MetaInconsistent {
                node_path: "/3".to_string(),
                selector: "@meta:A".to_string(),
            },
            "ERR_META_INCONSISTENT",
        ),
        (
            StatexError::NodeNotFound {
                node_path: "/9".to_string(),
            },
            "ERR_NOT_FOUND",
        ),
        (
            StatexError::NoParent {
                selector: "@name:x".to_string(),
                node_path: "".to_string(),
            },
            "ERR_NO_PARENT",
        ),
        (
            StatexError::InvalidDocument {
                key: "children.0".to_string(),
                reason: "missing id".to_string(),
            },
            "ERR_INVALID_DOCUMENT",
        ),
        (
            StatexError::Io {
                message: "disk".to_string(),
            },
            "ERR_IO",
        ),
    ];

    for (err, code) in cases {
        let ex: ExError = err.into();
        assert_eq!(ex.code(), code);
    }
}

#[test]
fn test_missing_prototype_carries_parent_and_selector() {
    let ex: ExError = StatexError::MissingPrototype {
        selector: "@name:x".to_string(),
        parent_path: "/2".to_string(),
    }
    .into();

    assert_eq!(ex.kind(), ExErrorKind::MissingPrototype);
    assert_eq!(ex.op(), Some("create_node"));
    assert_eq!(ex.selector(), Some("@name:x"));
    assert_eq!(ex.node_path(), Some("/2"));
    assert!(ex.to_string().contains("No base provided"));
}

#[test]
fn test_correlation_ids_attach_to_ex_error() {
    let request_id = RequestId::from("req-7".to_string());
    let ex = ExError::new(ExErrorKind::Persistence)
        .with_request_id(request_id.clone())
        .with_message("rename failed");

    assert_eq!(ex.request_id(), Some(&request_id));
    assert_eq!(ex.message(), "rename failed");
    assert_eq!(ex.to_string(), "[ERR_PERSISTENCE]: rename failed");
}

#[test]
fn test_unknown_category_is_reported_with_its_key() {
    let changes = vec![statex_core::ChangeRecord::put(
        statex_core::key!["layout", "x"],
        json!(1),
    )];
    let err = statex_core::importer::order_changes(changes).unwrap_err();
    let ex: ExError = err.into();
    assert_eq!(ex.kind(), ExErrorKind::UnknownCategory);
    assert_eq!(ex.key(), Some("layout.x"));

    // documents cannot name unknown categories at all
    let parsed: Result<statex_core::StateDocument, _> =
        serde_json::from_value(json!({"layout": {"x": 1}}));
    assert!(parsed.is_err());
}

#[tokio::test]
async fn test_apply_error_converts_with_selector_context() {
    let graph = new_graph();
    let node = container(&graph).await;
    let importer = Importer::new(&graph).await.unwrap();

    let err = importer
        .apply(&node, &doc(json!({"pointers": {"owner": "@meta:Ghost"}})))
        .await
        .unwrap_err();
    let ex: ExError = err.into();
    assert_eq!(ex.code(), "ERR_UNRESOLVABLE_SELECTOR");
    assert_eq!(ex.selector(), Some("@meta:Ghost"));
    assert_eq!(ex.node_path(), Some(node.path()));
}
