//! Change dispatch: one put and one delete handler per category

use super::resolver::{ResolutionCache, Resolver};
use crate::diff::{remove_nested, set_nested};
use crate::errors::{Result, StatexError};
use crate::graph::GraphStore;
use crate::model::{Cardinality, Category, ChangeKind, ChangeRecord, PointerMetaDoc, Selector};
use serde_json::{Map, Value};
use std::collections::HashMap;

/// Member data saved while a set member is moved
#[derive(Default)]
struct MemberEntries {
    attributes: Vec<(String, Value)>,
    registry: Vec<(String, Value)>,
}

/// Apply one change record to `node`.
///
/// # Errors
///
/// `UnknownCategory` for an unrecognized first key segment,
/// `UnsupportedShape` for a key the category cannot address, and any
/// resolution or store failure.
pub async fn dispatch<S: GraphStore>(
    resolver: &Resolver<'_, S>,
    node: &S::Node,
    change: &ChangeRecord,
    cache: &mut ResolutionCache<S::Node>,
) -> Result<()> {
    let category = change.category()?;
    let ctx = Dispatch {
        resolver,
        store: resolver.store(),
        node,
        change,
        category,
    };
    match (category, change.kind) {
        (Category::Attributes, ChangeKind::Put) => ctx.put_attribute().await,
        (Category::Attributes, ChangeKind::Delete) => ctx.delete_attribute().await,
        (Category::Registry, ChangeKind::Put) => ctx.put_registry().await,
        (Category::Registry, ChangeKind::Delete) => ctx.delete_registry().await,
        (Category::AttributeMeta, ChangeKind::Put) => ctx.put_attribute_meta().await,
        (Category::AttributeMeta, ChangeKind::Delete) => ctx.delete_attribute_meta().await,
        (Category::Pointers, ChangeKind::Put) => ctx.put_pointer(cache).await,
        (Category::Pointers, ChangeKind::Delete) => ctx.delete_pointer().await,
        (Category::PointerMeta, ChangeKind::Put) => ctx.put_pointer_meta(cache).await,
        (Category::PointerMeta, ChangeKind::Delete) => ctx.delete_pointer_meta(cache).await,
        (Category::Sets, ChangeKind::Put) => ctx.put_set(cache).await,
        (Category::Sets, ChangeKind::Delete) => ctx.delete_set().await,
        (Category::MemberAttributes | Category::MemberRegistry, ChangeKind::Put) => {
            ctx.put_member_data(cache).await
        }
        (Category::MemberAttributes | Category::MemberRegistry, ChangeKind::Delete) => {
            ctx.delete_member_data(cache).await
        }
    }
}

struct Dispatch<'c, 'r, S: GraphStore> {
    resolver: &'c Resolver<'r, S>,
    store: &'r S,
    node: &'c S::Node,
    change: &'c ChangeRecord,
    category: Category,
}

impl<'c, 'r, S: GraphStore> Dispatch<'c, 'r, S> {
    fn len(&self) -> usize {
        self.change.key.len()
    }

    fn name(&self, index: usize) -> Result<&'c str> {
        self.change.field(index).ok_or_else(|| StatexError::InvalidDocument {
            key: self.change.key_string(),
            reason: format!("expected a name at position {}", index),
        })
    }

    fn unsupported(&self) -> StatexError {
        StatexError::UnsupportedShape {
            category: self.category.to_string(),
            key: self.change.key_string(),
        }
    }

    fn invalid(&self, reason: &str) -> StatexError {
        StatexError::InvalidDocument {
            key: self.change.key_string(),
            reason: reason.to_string(),
        }
    }

    fn value(&self) -> &'c Value {
        self.change.value_or_null()
    }

    fn string_value(&self) -> Result<&'c str> {
        self.value()
            .as_str()
            .ok_or_else(|| self.invalid("expected a selector string"))
    }

    // ----- attributes / registry -----

    async fn put_attribute(&self) -> Result<()> {
        if self.len() != 2 {
            return Err(self.unsupported());
        }
        self.store
            .set_attribute(self.node, self.name(1)?, self.value().clone())
            .await
    }

    async fn delete_attribute(&self) -> Result<()> {
        if self.len() != 2 {
            return Err(self.unsupported());
        }
        self.store.del_attribute(self.node, self.name(1)?).await
    }

    async fn put_registry(&self) -> Result<()> {
        if self.len() != 2 {
            return Err(self.unsupported());
        }
        self.store
            .set_registry(self.node, self.name(1)?, self.value().clone())
            .await
    }

    async fn delete_registry(&self) -> Result<()> {
        if self.len() != 2 {
            return Err(self.unsupported());
        }
        self.store.del_registry(self.node, self.name(1)?).await
    }

    // ----- attribute meta -----

    async fn put_attribute_meta(&self) -> Result<()> {
        let name = self.name(1)?;
        if self.len() == 2 {
            return self
                .store
                .set_attribute_meta(self.node, name, self.value().clone())
                .await;
        }
        let mut meta = self
            .store
            .attribute_meta(self.node, name)
            .await?
            .unwrap_or_else(|| Value::Object(Map::new()));
        set_nested(&mut meta, &self.change.key[2..], self.value().clone())?;
        self.store.set_attribute_meta(self.node, name, meta).await
    }

    async fn delete_attribute_meta(&self) -> Result<()> {
        let name = self.name(1)?;
        if self.len() == 2 {
            return self.store.del_attribute_meta(self.node, name).await;
        }
        if let Some(mut meta) = self.store.attribute_meta(self.node, name).await? {
            remove_nested(&mut meta, &self.change.key[2..])?;
            self.store.set_attribute_meta(self.node, name, meta).await?;
        }
        Ok(())
    }

    // ----- pointers -----

    async fn put_pointer(&self, cache: &mut ResolutionCache<S::Node>) -> Result<()> {
        if self.len() != 2 {
            return Err(self.unsupported());
        }
        let name = self.name(1)?;
        let target = self
            .resolver
            .get_node(self.node, self.string_value()?, cache)
            .await?;
        let target_path = self.store.path(&target).await?;
        let current = self.store.pointer_path(self.node, name).await?;
        if current.as_deref() != Some(target_path.as_str()) {
            self.store.set_pointer(self.node, name, &target).await?;
        }
        Ok(())
    }

    async fn delete_pointer(&self) -> Result<()> {
        if self.len() != 2 {
            return Err(self.unsupported());
        }
        self.store.del_pointer(self.node, self.name(1)?).await
    }

    // ----- pointer meta -----

    async fn put_pointer_meta(&self, cache: &mut ResolutionCache<S::Node>) -> Result<()> {
        let name = self.name(1)?;
        let limit = self.change.field(2).filter(|f| is_limit(f));
        match self.len() {
            2 => {
                let meta: PointerMetaDoc = serde_json::from_value(self.value().clone())
                    .map_err(|e| self.invalid(&format!("not a pointer meta entry: {}", e)))?;
                self.store
                    .set_pointer_meta_limits(self.node, name, meta.min, meta.max)
                    .await?;
                for (selector, cardinality) in &meta.targets {
                    let target = self.resolver.get_node(self.node, selector, cache).await?;
                    self.store
                        .set_pointer_meta_target(
                            self.node,
                            name,
                            &target,
                            cardinality.min,
                            cardinality.max,
                        )
                        .await?;
                }
                Ok(())
            }
            3 if limit.is_some() => {
                let bound = self
                    .value()
                    .as_i64()
                    .ok_or_else(|| self.invalid("cardinality bound must be an integer"))?;
                let current = self.store.pointer_meta(self.node, name).await?;
                let (mut min, mut max) = current
                    .map(|m| (m.min, m.max))
                    .unwrap_or((Cardinality::UNBOUNDED, Cardinality::UNBOUNDED));
                if limit == Some("min") {
                    min = bound;
                } else {
                    max = bound;
                }
                self.store
                    .set_pointer_meta_limits(self.node, name, min, max)
                    .await
            }
            3 | 4 => {
                let target_selector = self.name(2)?;
                let mut meta = self.current_pointer_meta(name).await?;
                set_nested(&mut meta, &self.change.key[2..], self.value().clone())?;
                let cardinality: Cardinality = meta
                    .get(target_selector)
                    .cloned()
                    .map(serde_json::from_value)
                    .transpose()
                    .map_err(|e| self.invalid(&format!("not a cardinality: {}", e)))?
                    .unwrap_or_default();
                let target = self
                    .resolver
                    .get_node(self.node, target_selector, cache)
                    .await?;
                self.store
                    .set_pointer_meta_target(
                        self.node,
                        name,
                        &target,
                        cardinality.min,
                        cardinality.max,
                    )
                    .await
            }
            _ => Err(self.unsupported()),
        }
    }

    async fn delete_pointer_meta(&self, cache: &mut ResolutionCache<S::Node>) -> Result<()> {
        let name = self.name(1)?;
        match self.len() {
            2 => self.store.del_pointer_meta(self.node, name).await,
            3 => {
                let field = self.name(2)?;
                if is_limit(field) {
                    let Some(current) = self.store.pointer_meta(self.node, name).await? else {
                        return Ok(());
                    };
                    let (min, max) = if field == "min" {
                        (Cardinality::UNBOUNDED, current.max)
                    } else {
                        (current.min, Cardinality::UNBOUNDED)
                    };
                    return self
                        .store
                        .set_pointer_meta_limits(self.node, name, min, max)
                        .await;
                }
                let target_path = self.member_path(field, cache).await?;
                self.store
                    .del_pointer_meta_target(self.node, name, &target_path)
                    .await
            }
            _ => Err(self.unsupported()),
        }
    }

    async fn current_pointer_meta(&self, name: &str) -> Result<Value> {
        let doc = match self.store.pointer_meta(self.node, name).await? {
            Some(meta) => {
                let mut doc = PointerMetaDoc::new(meta.min, meta.max);
                doc.targets = meta.targets;
                doc
            }
            None => PointerMetaDoc::new(Cardinality::UNBOUNDED, Cardinality::UNBOUNDED),
        };
        Ok(serde_json::to_value(doc)?)
    }

    // ----- sets -----

    /// A two-segment put reconciles the set's membership to the desired list.
    /// Members present on both sides stay in place with their member data;
    /// members that have to move are re-added with their data carried over.
    async fn put_set(&self, cache: &mut ResolutionCache<S::Node>) -> Result<()> {
        let set = self.name(1)?;
        match self.len() {
            2 => self.reconcile_members(set, cache).await,
            3 => {
                let target = self
                    .resolver
                    .get_node(self.node, self.string_value()?, cache)
                    .await?;
                self.store.add_member(self.node, set, &target).await
            }
            _ => Err(self.unsupported()),
        }
    }

    async fn reconcile_members(
        &self,
        set: &str,
        cache: &mut ResolutionCache<S::Node>,
    ) -> Result<()> {
        let selectors = self
            .value()
            .as_array()
            .ok_or_else(|| self.invalid("set members must be a list"))?;

        let mut desired: Vec<(String, S::Node)> = Vec::with_capacity(selectors.len());
        for member in selectors {
            let selector = member
                .as_str()
                .ok_or_else(|| self.invalid("set member must be a selector string"))?;
            let target = self.resolver.get_node(self.node, selector, cache).await?;
            let path = self.store.path(&target).await?;
            if !desired.iter().any(|(p, _)| *p == path) {
                desired.push((path, target));
            }
        }

        if !self
            .store
            .own_set_names(self.node)
            .await?
            .iter()
            .any(|name| name == set)
        {
            self.store.create_set(self.node, set).await?;
        }

        let mut kept = Vec::new();
        for path in self.store.member_paths(self.node, set).await? {
            if desired.iter().any(|(p, _)| *p == path) {
                kept.push(path);
            } else {
                self.store.del_member(self.node, set, &path).await?;
            }
        }

        let in_place = kept
            .iter()
            .zip(&desired)
            .take_while(|(current, (path, _))| *current == path)
            .count();

        let mut moved = HashMap::new();
        for path in &kept[in_place..] {
            moved.insert(path.clone(), self.member_entries(set, path).await?);
            self.store.del_member(self.node, set, path).await?;
        }
        for (path, target) in &desired[in_place..] {
            self.store.add_member(self.node, set, target).await?;
            if let Some(entries) = moved.remove(path) {
                self.restore_member_entries(set, path, entries).await?;
            }
        }
        Ok(())
    }

    async fn member_entries(&self, set: &str, member_path: &str) -> Result<MemberEntries> {
        let mut entries = MemberEntries::default();
        for name in self
            .store
            .member_attribute_names(self.node, set, member_path)
            .await?
        {
            if let Some(value) = self
                .store
                .member_attribute(self.node, set, member_path, &name)
                .await?
            {
                entries.attributes.push((name, value));
            }
        }
        for name in self
            .store
            .member_registry_names(self.node, set, member_path)
            .await?
        {
            if let Some(value) = self
                .store
                .member_registry(self.node, set, member_path, &name)
                .await?
            {
                entries.registry.push((name, value));
            }
        }
        Ok(entries)
    }

    async fn restore_member_entries(
        &self,
        set: &str,
        member_path: &str,
        entries: MemberEntries,
    ) -> Result<()> {
        for (name, value) in entries.attributes {
            self.store
                .set_member_attribute(self.node, set, member_path, &name, value)
                .await?;
        }
        for (name, value) in entries.registry {
            self.store
                .set_member_registry(self.node, set, member_path, &name, value)
                .await?;
        }
        Ok(())
    }

    async fn delete_set(&self) -> Result<()> {
        let set = self.name(1)?;
        match self.len() {
            2 => self.store.del_set(self.node, set).await,
            3 => {
                let index = self.change.key[2]
                    .as_index()
                    .ok_or_else(|| self.invalid("set member key must be an index"))?;
                let members = self.store.member_paths(self.node, set).await?;
                let member = members
                    .get(index)
                    .ok_or_else(|| self.invalid("set member index out of range"))?;
                self.store.del_member(self.node, set, member).await
            }
            _ => Err(self.unsupported()),
        }
    }

    // ----- member attributes / member registry -----

    async fn put_member_data(&self, cache: &mut ResolutionCache<S::Node>) -> Result<()> {
        let set = self.name(1)?;
        match self.len() {
            2 => {
                let members = self
                    .value()
                    .as_object()
                    .ok_or_else(|| self.invalid("expected member → entries map"))?;
                for (member, entries) in members {
                    self.put_member_entries(set, member, entries, cache).await?;
                }
                Ok(())
            }
            3 => {
                let member = self.name(2)?;
                self.put_member_entries(set, member, self.value(), cache)
                    .await
            }
            4 => {
                let member = self.member_path(self.name(2)?, cache).await?;
                self.write_member_entry(set, &member, self.name(3)?, self.value().clone())
                    .await
            }
            _ if self.category == Category::MemberRegistry => {
                let member = self.member_path(self.name(2)?, cache).await?;
                let entry = self.name(3)?;
                let mut current = self
                    .store
                    .member_registry(self.node, set, &member, entry)
                    .await?
                    .unwrap_or_else(|| Value::Object(Map::new()));
                set_nested(&mut current, &self.change.key[4..], self.value().clone())?;
                self.store
                    .set_member_registry(self.node, set, &member, entry, current)
                    .await
            }
            _ => Err(self.unsupported()),
        }
    }

    async fn put_member_entries(
        &self,
        set: &str,
        member: &str,
        entries: &Value,
        cache: &mut ResolutionCache<S::Node>,
    ) -> Result<()> {
        let entries = entries
            .as_object()
            .ok_or_else(|| self.invalid("expected entry name → value map"))?;
        let member_path = self.member_path(member, cache).await?;
        for (entry, value) in entries {
            self.write_member_entry(set, &member_path, entry, value.clone())
                .await?;
        }
        Ok(())
    }

    async fn write_member_entry(
        &self,
        set: &str,
        member_path: &str,
        entry: &str,
        value: Value,
    ) -> Result<()> {
        if self.category == Category::MemberRegistry {
            self.store
                .set_member_registry(self.node, set, member_path, entry, value)
                .await
        } else {
            self.store
                .set_member_attribute(self.node, set, member_path, entry, value)
                .await
        }
    }

    async fn delete_member_data(&self, cache: &mut ResolutionCache<S::Node>) -> Result<()> {
        let set = self.name(1)?;
        match self.len() {
            2 => {
                for member in self.store.member_paths(self.node, set).await? {
                    self.clear_member(set, &member).await?;
                }
                Ok(())
            }
            3 => {
                let member = self.member_path(self.name(2)?, cache).await?;
                self.clear_member(set, &member).await
            }
            4 => {
                let member = self.member_path(self.name(2)?, cache).await?;
                self.remove_member_entry(set, &member, self.name(3)?).await
            }
            _ if self.category == Category::MemberRegistry => {
                let member = self.member_path(self.name(2)?, cache).await?;
                let entry = self.name(3)?;
                if let Some(mut current) = self
                    .store
                    .member_registry(self.node, set, &member, entry)
                    .await?
                {
                    remove_nested(&mut current, &self.change.key[4..])?;
                    self.store
                        .set_member_registry(self.node, set, &member, entry, current)
                        .await?;
                }
                Ok(())
            }
            _ => Err(self.unsupported()),
        }
    }

    async fn clear_member(&self, set: &str, member_path: &str) -> Result<()> {
        let names = if self.category == Category::MemberRegistry {
            self.store
                .member_registry_names(self.node, set, member_path)
                .await?
        } else {
            self.store
                .member_attribute_names(self.node, set, member_path)
                .await?
        };
        for name in names {
            self.remove_member_entry(set, member_path, &name).await?;
        }
        Ok(())
    }

    async fn remove_member_entry(&self, set: &str, member_path: &str, entry: &str) -> Result<()> {
        if self.category == Category::MemberRegistry {
            self.store
                .del_member_registry(self.node, set, member_path, entry)
                .await
        } else {
            self.store
                .del_member_attribute(self.node, set, member_path, entry)
                .await
        }
    }

    /// Path named by a member key: paths are used as-is (the member may
    /// already be gone), other selectors resolve from this node.
    async fn member_path(
        &self,
        selector: &str,
        cache: &mut ResolutionCache<S::Node>,
    ) -> Result<String> {
        if let Selector::Path(path) = Selector::parse(selector)? {
            return Ok(path);
        }
        let member = self.resolver.get_node(self.node, selector, cache).await?;
        self.store.path(&member).await
    }
}

fn is_limit(field: &str) -> bool {
    field == "min" || field == "max"
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::MemoryGraph;
    use crate::importer::ImporterConfig;
    use crate::key;
    use serde_json::json;

    async fn run(graph: &MemoryGraph, node: &crate::graph::MemoryNode, change: ChangeRecord) -> Result<()> {
        let root = graph.root().await?;
        let config = ImporterConfig::default();
        let resolver = Resolver::new(graph, &root, &config);
        let mut cache = ResolutionCache::new();
        dispatch(&resolver, node, &change, &mut cache).await
    }

    async fn fresh(graph: &MemoryGraph) -> crate::graph::MemoryNode {
        let root = graph.root().await.unwrap();
        graph
            .create_node(&root, &MemoryGraph::node("/1"))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_nested_attribute_put_is_unsupported() {
        let graph = MemoryGraph::new();
        let node = fresh(&graph).await;
        let err = run(
            &graph,
            &node,
            ChangeRecord::put(key!["attributes", "name", "nested"], json!(1)),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, StatexError::UnsupportedShape { category, .. } if category == "attributes"));
    }

    #[tokio::test]
    async fn test_unknown_category_fails() {
        let graph = MemoryGraph::new();
        let node = fresh(&graph).await;
        let err = run(&graph, &node, ChangeRecord::put(key!["layout", "x"], json!(1)))
            .await
            .unwrap_err();
        assert!(matches!(err, StatexError::UnknownCategory { .. }));
    }

    #[tokio::test]
    async fn test_attribute_meta_nested_update_and_delete() {
        let graph = MemoryGraph::new();
        let node = fresh(&graph).await;
        run(
            &graph,
            &node,
            ChangeRecord::put(key!["attribute_meta", "r"], json!({"type": "float", "unit": "ohm"})),
        )
        .await
        .unwrap();
        run(
            &graph,
            &node,
            ChangeRecord::put(key!["attribute_meta", "r", "unit"], json!("kohm")),
        )
        .await
        .unwrap();
        run(
            &graph,
            &node,
            ChangeRecord::delete(key!["attribute_meta", "r", "type"]),
        )
        .await
        .unwrap();

        assert_eq!(
            graph.attribute_meta(&node, "r").await.unwrap(),
            Some(json!({"unit": "kohm"}))
        );
    }

    #[tokio::test]
    async fn test_pointer_put_requires_resolvable_target() {
        let graph = MemoryGraph::new();
        let node = fresh(&graph).await;
        let err = run(
            &graph,
            &node,
            ChangeRecord::put(key!["pointers", "src"], json!("@meta:Nope")),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, StatexError::UnresolvableSelector { selector, .. } if selector == "@meta:Nope"));
    }

    #[tokio::test]
    async fn test_pointer_meta_new_entry_then_limit_update() {
        let graph = MemoryGraph::new();
        let node = fresh(&graph).await;
        run(
            &graph,
            &node,
            ChangeRecord::put(
                key!["pointer_meta", "src"],
                json!({"min": 0, "max": 1, "@meta:FCO": {"min": -1, "max": 1}}),
            ),
        )
        .await
        .unwrap();
        run(
            &graph,
            &node,
            ChangeRecord::put(key!["pointer_meta", "src", "max"], json!(3)),
        )
        .await
        .unwrap();

        let meta = graph.pointer_meta(&node, "src").await.unwrap().unwrap();
        assert_eq!((meta.min, meta.max), (0, 3));
        assert_eq!(meta.targets["/1"], Cardinality::new(-1, 1));

        run(
            &graph,
            &node,
            ChangeRecord::delete(key!["pointer_meta", "src", "/1"]),
        )
        .await
        .unwrap();
        let meta = graph.pointer_meta(&node, "src").await.unwrap().unwrap();
        assert!(meta.targets.is_empty());
    }

    #[tokio::test]
    async fn test_pointer_meta_target_bound_update() {
        let graph = MemoryGraph::new();
        let node = fresh(&graph).await;
        run(
            &graph,
            &node,
            ChangeRecord::put(
                key!["pointer_meta", "src"],
                json!({"min": 0, "max": 1, "/1": {"min": 0, "max": 1}}),
            ),
        )
        .await
        .unwrap();
        run(
            &graph,
            &node,
            ChangeRecord::put(key!["pointer_meta", "src", "/1", "max"], json!(5)),
        )
        .await
        .unwrap();

        let meta = graph.pointer_meta(&node, "src").await.unwrap().unwrap();
        assert_eq!(meta.targets["/1"], Cardinality::new(0, 5));
    }

    #[tokio::test]
    async fn test_set_put_reorders_and_keeps_member_data() {
        let graph = MemoryGraph::new();
        let node = fresh(&graph).await;
        let own = node.path().to_string();
        run(
            &graph,
            &node,
            ChangeRecord::put(key!["sets", "s"], json!(["/1", own.clone()])),
        )
        .await
        .unwrap();
        graph
            .set_member_attribute(&node, "s", "/1", "w", json!(1))
            .await
            .unwrap();
        graph
            .set_member_registry(&node, "s", &own, "position", json!({"x": 3}))
            .await
            .unwrap();

        run(
            &graph,
            &node,
            ChangeRecord::put(key!["sets", "s"], json!([own.clone(), "/1"])),
        )
        .await
        .unwrap();

        assert_eq!(
            graph.member_paths(&node, "s").await.unwrap(),
            vec![own.clone(), "/1".to_string()]
        );
        assert_eq!(
            graph.member_attribute(&node, "s", "/1", "w").await.unwrap(),
            Some(json!(1))
        );
        assert_eq!(
            graph
                .member_registry(&node, "s", &own, "position")
                .await
                .unwrap(),
            Some(json!({"x": 3}))
        );
    }

    #[tokio::test]
    async fn test_set_put_removes_unlisted_members_only() {
        let graph = MemoryGraph::new();
        let node = fresh(&graph).await;
        let own = node.path().to_string();
        run(
            &graph,
            &node,
            ChangeRecord::put(key!["sets", "s"], json!(["/1", own.clone()])),
        )
        .await
        .unwrap();
        graph
            .set_member_attribute(&node, "s", &own, "w", json!(2))
            .await
            .unwrap();

        run(&graph, &node, ChangeRecord::put(key!["sets", "s"], json!([own.clone()])))
            .await
            .unwrap();

        assert_eq!(graph.member_paths(&node, "s").await.unwrap(), vec![own.clone()]);
        assert_eq!(
            graph.member_attribute(&node, "s", &own, "w").await.unwrap(),
            Some(json!(2))
        );
    }

    #[tokio::test]
    async fn test_set_member_append_and_delete_by_position() {
        let graph = MemoryGraph::new();
        let node = fresh(&graph).await;
        run(&graph, &node, ChangeRecord::put(key!["sets", "s"], json!(["/1"])))
            .await
            .unwrap();
        run(
            &graph,
            &node,
            ChangeRecord::put(key!["sets", "s", 1usize], json!(node.path())),
        )
        .await
        .unwrap();
        run(&graph, &node, ChangeRecord::delete(key!["sets", "s", 0usize]))
            .await
            .unwrap();

        assert_eq!(
            graph.member_paths(&node, "s").await.unwrap(),
            vec![node.path().to_string()]
        );

        let err = run(&graph, &node, ChangeRecord::delete(key!["sets", "s", 4usize]))
            .await
            .unwrap_err();
        assert!(matches!(err, StatexError::InvalidDocument { .. }));
    }

    #[tokio::test]
    async fn test_member_data_put_expands_and_delete_clears() {
        let graph = MemoryGraph::new();
        let node = fresh(&graph).await;
        run(&graph, &node, ChangeRecord::put(key!["sets", "s"], json!(["/1"])))
            .await
            .unwrap();
        run(
            &graph,
            &node,
            ChangeRecord::put(
                key!["member_registry", "s"],
                json!({"@meta:FCO": {"position": {"x": 1, "y": 2}}}),
            ),
        )
        .await
        .unwrap();
        run(
            &graph,
            &node,
            ChangeRecord::put(key!["member_registry", "s", "/1", "position", "x"], json!(9)),
        )
        .await
        .unwrap();
        assert_eq!(
            graph.member_registry(&node, "s", "/1", "position").await.unwrap(),
            Some(json!({"x": 9, "y": 2}))
        );

        run(&graph, &node, ChangeRecord::delete(key!["member_registry", "s"]))
            .await
            .unwrap();
        assert!(graph
            .member_registry_names(&node, "s", "/1")
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_nested_member_attribute_is_unsupported() {
        let graph = MemoryGraph::new();
        let node = fresh(&graph).await;
        let err = run(
            &graph,
            &node,
            ChangeRecord::put(key!["member_attributes", "s", "/1", "a", "b"], json!(1)),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, StatexError::UnsupportedShape { .. }));
    }
}
