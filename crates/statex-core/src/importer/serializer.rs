//! Canonical serializer: live node → [`StateDocument`]

use crate::errors::Result;
use crate::graph::GraphStore;
use crate::model::{Cardinality, MemberData, PointerMetaDoc, StateDocument};
use futures::future::BoxFuture;
use std::collections::BTreeMap;

/// Serialize `node`, and its subtree unless `shallow`.
///
/// Every category is present in the output (possibly empty), so the result
/// can be diffed against any desired document. `id` is the node's guid;
/// pointers and set members are written as paths. Every current set member
/// gets a `member_attributes` and `member_registry` entry, empty or not.
///
/// # Errors
///
/// Propagates store failures.
pub fn serialize<'a, S: GraphStore>(
    store: &'a S,
    node: &'a S::Node,
    shallow: bool,
) -> BoxFuture<'a, Result<StateDocument>> {
    Box::pin(async move {
        let mut doc = StateDocument {
            id: Some(store.guid(node).await?),
            path: Some(store.path(node).await?),
            ..StateDocument::default()
        };

        let mut attributes = BTreeMap::new();
        for name in store.own_attribute_names(node).await? {
            if let Some(value) = store.attribute(node, &name).await? {
                attributes.insert(name, value);
            }
        }
        doc.attributes = Some(attributes);

        let mut attribute_meta = BTreeMap::new();
        for name in store.own_attribute_meta_names(node).await? {
            if let Some(meta) = store.attribute_meta(node, &name).await? {
                attribute_meta.insert(name, meta);
            }
        }
        doc.attribute_meta = Some(attribute_meta);

        let mut pointers = BTreeMap::new();
        if let Some(base) = store.pointer_path(node, "base").await? {
            pointers.insert("base".to_string(), base);
        }
        for name in store.own_pointer_names(node).await? {
            if let Some(target) = store.pointer_path(node, &name).await? {
                pointers.insert(name, target);
            }
        }
        doc.pointers = Some(pointers);

        let mut pointer_meta = BTreeMap::new();
        for name in store.own_pointer_meta_names(node).await? {
            if let Some(meta) = store.pointer_meta(node, &name).await? {
                let mut entry = PointerMetaDoc::new(meta.min, meta.max);
                for (target, cardinality) in meta.targets {
                    entry = entry.target(target, Cardinality::new(cardinality.min, cardinality.max));
                }
                pointer_meta.insert(name, entry);
            }
        }
        doc.pointer_meta = Some(pointer_meta);

        let mut registry = BTreeMap::new();
        for name in store.own_registry_names(node).await? {
            if let Some(value) = store.registry(node, &name).await? {
                registry.insert(name, value);
            }
        }
        doc.registry = Some(registry);

        let mut sets = BTreeMap::new();
        let mut member_attributes: MemberData = BTreeMap::new();
        let mut member_registry: MemberData = BTreeMap::new();
        for set in store.own_set_names(node).await? {
            let members = store.member_paths(node, &set).await?;
            let set_attributes = member_attributes.entry(set.clone()).or_default();
            let set_registry = member_registry.entry(set.clone()).or_default();
            for member in &members {
                let mut entries = BTreeMap::new();
                for name in store.member_attribute_names(node, &set, member).await? {
                    if let Some(value) = store.member_attribute(node, &set, member, &name).await? {
                        entries.insert(name, value);
                    }
                }
                set_attributes.insert(member.clone(), entries);

                let mut entries = BTreeMap::new();
                for name in store.member_registry_names(node, &set, member).await? {
                    if let Some(value) = store.member_registry(node, &set, member, &name).await? {
                        entries.insert(name, value);
                    }
                }
                set_registry.insert(member.clone(), entries);
            }
            sets.insert(set, members);
        }
        doc.sets = Some(sets);
        doc.member_attributes = Some(member_attributes);
        doc.member_registry = Some(member_registry);

        if !shallow {
            let mut children = Vec::new();
            for child in store.load_children(node).await? {
                children.push(serialize(store, &child, false).await?);
            }
            doc.children = Some(children);
        }

        Ok(doc)
    })
}
