//! In-memory graph store
//!
//! Reference implementation of [`GraphStore`] backed by a `BTreeMap` of node
//! records keyed by path. Used by the CLI (through snapshot files) and by
//! tests. Not optimized: every call takes the lock once and works on plain
//! maps.

use super::{GraphStore, PointerMeta, META_ASPECT_SET};
use crate::errors::{Result, StatexError};
use crate::model::Cardinality;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::RwLock;
use uuid::Uuid;

/// Path of the canonical default prototype in a fresh graph
pub const FCO_PATH: &str = "/1";

/// Handle to a node of a [`MemoryGraph`]; wraps the node path
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MemoryNode(String);

impl MemoryNode {
    pub fn path(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationOp {
    CreateNode,
    DeleteNode,
    SetAttribute,
    DelAttribute,
    SetAttributeMeta,
    DelAttributeMeta,
    SetPointer,
    DelPointer,
    SetPointerMetaLimits,
    SetPointerMetaTarget,
    DelPointerMeta,
    DelPointerMetaTarget,
    CreateSet,
    DelSet,
    AddMember,
    DelMember,
    SetMemberAttribute,
    DelMemberAttribute,
    SetMemberRegistry,
    DelMemberRegistry,
    SetRegistry,
    DelRegistry,
}

/// Journal entry written by every mutating call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphMutation {
    pub op: MutationOp,
    /// Path of the node that was mutated (the new node for `CreateNode`)
    pub node: String,
    /// Attribute, pointer, set or registry name the call addressed
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SetMember {
    pub path: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, Value>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub registry: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct NodeRecord {
    pub guid: String,
    #[serde(default)]
    pub parent: Option<String>,
    #[serde(default)]
    pub base: Option<String>,
    #[serde(default)]
    pub children: Vec<String>,
    #[serde(default)]
    pub next_relid: u64,
    #[serde(default)]
    pub attributes: BTreeMap<String, Value>,
    #[serde(default)]
    pub attribute_meta: BTreeMap<String, Value>,
    #[serde(default)]
    pub pointers: BTreeMap<String, String>,
    #[serde(default)]
    pub pointer_meta: BTreeMap<String, PointerMeta>,
    #[serde(default)]
    pub registry: BTreeMap<String, Value>,
    #[serde(default)]
    pub sets: BTreeMap<String, Vec<SetMember>>,
}

impl NodeRecord {
    fn new(parent: Option<String>, base: Option<String>) -> Self {
        Self {
            guid: Uuid::now_v7().to_string(),
            parent,
            base,
            ..Self::default()
        }
    }

    fn member(&self, set: &str, member_path: &str) -> Option<&SetMember> {
        self.sets
            .get(set)
            .and_then(|members| members.iter().find(|m| m.path == member_path))
    }
}

/// Serializable image of a whole graph, keyed by node path (root is `""`)
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GraphSnapshot {
    pub nodes: BTreeMap<String, NodeRecord>,
}

#[derive(Debug, Default)]
struct GraphState {
    nodes: BTreeMap<String, NodeRecord>,
    journal: Vec<GraphMutation>,
}

impl GraphState {
    fn node(&self, path: &str) -> Result<&NodeRecord> {
        self.nodes.get(path).ok_or_else(|| not_found(path))
    }

    fn node_mut(&mut self, path: &str) -> Result<&mut NodeRecord> {
        self.nodes.get_mut(path).ok_or_else(|| not_found(path))
    }

    fn record(&mut self, op: MutationOp, node: &str, name: Option<&str>) {
        self.journal.push(GraphMutation {
            op,
            node: node.to_string(),
            name: name.map(str::to_string),
        });
    }

    /// Walk `path` and its base chain, returning the first hit of `pick`
    fn inherited<T>(
        &self,
        path: &str,
        pick: impl Fn(&NodeRecord) -> Option<T>,
    ) -> Result<Option<T>> {
        let mut visited = BTreeSet::new();
        let mut current = Some(path.to_string());
        while let Some(p) = current {
            if !visited.insert(p.clone()) {
                break;
            }
            let record = self.node(&p)?;
            if let Some(found) = pick(record) {
                return Ok(Some(found));
            }
            current = record.base.clone();
        }
        Ok(None)
    }

    fn create(&mut self, parent: &str, base: &str) -> Result<String> {
        self.node(base)?;
        let parent_record = self.node_mut(parent)?;
        parent_record.next_relid += 1;
        let path = format!("{}/{}", parent, parent_record.next_relid);
        parent_record.children.push(path.clone());
        self.nodes.insert(
            path.clone(),
            NodeRecord::new(Some(parent.to_string()), Some(base.to_string())),
        );
        self.record(MutationOp::CreateNode, &path, None);
        Ok(path)
    }

    /// Remove a subtree together with every instance of a removed node,
    /// then purge dangling references to them.
    fn delete(&mut self, path: &str) -> Result<()> {
        if path.is_empty() {
            return Err(StatexError::Internal {
                message: "cannot delete the project root".to_string(),
            });
        }
        self.node(path)?;

        let mut doomed = BTreeSet::new();
        let mut queue = vec![path.to_string()];
        while let Some(next) = queue.pop() {
            if !doomed.insert(next.clone()) {
                continue;
            }
            if let Some(record) = self.nodes.get(&next) {
                queue.extend(record.children.iter().cloned());
            }
            queue.extend(
                self.nodes
                    .iter()
                    .filter(|(_, r)| r.base.as_deref() == Some(next.as_str()))
                    .map(|(p, _)| p.clone()),
            );
        }

        for gone in &doomed {
            self.nodes.remove(gone);
        }
        for record in self.nodes.values_mut() {
            record.children.retain(|c| !doomed.contains(c));
            record.pointers.retain(|_, target| !doomed.contains(target));
            for meta in record.pointer_meta.values_mut() {
                meta.targets.retain(|target, _| !doomed.contains(target));
            }
            for members in record.sets.values_mut() {
                members.retain(|m| !doomed.contains(&m.path));
            }
        }

        self.record(MutationOp::DeleteNode, path, None);
        Ok(())
    }

    fn set_base(&mut self, path: &str, base: &str) -> Result<()> {
        let mut cursor = Some(base.to_string());
        while let Some(p) = cursor {
            if p == path {
                return Err(StatexError::Internal {
                    message: format!("setting base of {} to {} would form a cycle", path, base),
                });
            }
            cursor = self.node(&p)?.base.clone();
        }
        self.node_mut(path)?.base = Some(base.to_string());
        Ok(())
    }

    fn member_mut(&mut self, path: &str, set: &str, member_path: &str) -> Result<&mut SetMember> {
        self.node_mut(path)?
            .sets
            .get_mut(set)
            .and_then(|members| members.iter_mut().find(|m| m.path == member_path))
            .ok_or_else(|| StatexError::NodeNotFound {
                node_path: format!("{} (member of {} in {})", member_path, set, path),
            })
    }
}

fn not_found(path: &str) -> StatexError {
    StatexError::NodeNotFound {
        node_path: path.to_string(),
    }
}

fn poisoned() -> StatexError {
    StatexError::Internal {
        message: "graph lock poisoned".to_string(),
    }
}

/// Thread-safe in-memory [`GraphStore`]
#[derive(Debug)]
pub struct MemoryGraph {
    state: RwLock<GraphState>,
}

impl Default for MemoryGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryGraph {
    /// Fresh project: root plus the `FCO` prototype at `/1`, registered as meta
    pub fn new() -> Self {
        let mut root = NodeRecord::new(None, None);
        root.next_relid = 1;
        root.children.push(FCO_PATH.to_string());
        root.sets.insert(
            META_ASPECT_SET.to_string(),
            vec![SetMember {
                path: FCO_PATH.to_string(),
                ..SetMember::default()
            }],
        );

        let mut fco = NodeRecord::new(Some(String::new()), None);
        fco.attributes
            .insert("name".to_string(), Value::String("FCO".to_string()));

        let mut nodes = BTreeMap::new();
        nodes.insert(String::new(), root);
        nodes.insert(FCO_PATH.to_string(), fco);

        Self {
            state: RwLock::new(GraphState {
                nodes,
                journal: Vec::new(),
            }),
        }
    }

    /// Rebuild a graph from a snapshot
    ///
    /// # Errors
    ///
    /// `NodeNotFound` if the snapshot has no root node.
    pub fn from_snapshot(snapshot: GraphSnapshot) -> Result<Self> {
        if !snapshot.nodes.contains_key("") {
            return Err(not_found(""));
        }
        Ok(Self {
            state: RwLock::new(GraphState {
                nodes: snapshot.nodes,
                journal: Vec::new(),
            }),
        })
    }

    /// # Errors
    ///
    /// `Internal` if the lock is poisoned.
    pub fn snapshot(&self) -> Result<GraphSnapshot> {
        self.read(|s| {
            Ok(GraphSnapshot {
                nodes: s.nodes.clone(),
            })
        })
    }

    /// Drain the mutation journal
    ///
    /// # Errors
    ///
    /// `Internal` if the lock is poisoned.
    pub fn take_journal(&self) -> Result<Vec<GraphMutation>> {
        self.write(|s| Ok(std::mem::take(&mut s.journal)))
    }

    /// Number of nodes including the root
    ///
    /// # Errors
    ///
    /// `Internal` if the lock is poisoned.
    pub fn node_count(&self) -> Result<usize> {
        self.read(|s| Ok(s.nodes.len()))
    }

    /// Handle for `path` without an existence check
    pub fn node(path: impl Into<String>) -> MemoryNode {
        MemoryNode(path.into())
    }

    fn read<T>(&self, f: impl FnOnce(&GraphState) -> Result<T>) -> Result<T> {
        let state = self.state.read().map_err(|_| poisoned())?;
        f(&state)
    }

    fn write<T>(&self, f: impl FnOnce(&mut GraphState) -> Result<T>) -> Result<T> {
        let mut state = self.state.write().map_err(|_| poisoned())?;
        f(&mut state)
    }
}

#[async_trait]
impl GraphStore for MemoryGraph {
    type Node = MemoryNode;

    async fn root(&self) -> Result<MemoryNode> {
        self.read(|s| s.node("").map(|_| MemoryNode(String::new())))
    }

    async fn create_node(&self, parent: &MemoryNode, base: &MemoryNode) -> Result<MemoryNode> {
        self.write(|s| s.create(&parent.0, &base.0).map(MemoryNode))
    }

    async fn delete_node(&self, node: &MemoryNode) -> Result<()> {
        self.write(|s| s.delete(&node.0))
    }

    async fn load_children(&self, node: &MemoryNode) -> Result<Vec<MemoryNode>> {
        self.read(|s| {
            Ok(s.node(&node.0)?
                .children
                .iter()
                .cloned()
                .map(MemoryNode)
                .collect())
        })
    }

    async fn load_by_path(&self, path: &str) -> Result<Option<MemoryNode>> {
        self.read(|s| {
            Ok(s.nodes
                .contains_key(path)
                .then(|| MemoryNode(path.to_string())))
        })
    }

    async fn parent(&self, node: &MemoryNode) -> Result<Option<MemoryNode>> {
        self.read(|s| Ok(s.node(&node.0)?.parent.clone().map(MemoryNode)))
    }

    async fn path(&self, node: &MemoryNode) -> Result<String> {
        self.read(|s| s.node(&node.0).map(|_| node.0.clone()))
    }

    async fn guid(&self, node: &MemoryNode) -> Result<String> {
        self.read(|s| Ok(s.node(&node.0)?.guid.clone()))
    }

    async fn meta_nodes(&self) -> Result<Vec<MemoryNode>> {
        self.read(|s| {
            Ok(s.node("")?
                .sets
                .get(META_ASPECT_SET)
                .map(|members| {
                    members
                        .iter()
                        .map(|m| MemoryNode(m.path.clone()))
                        .collect()
                })
                .unwrap_or_default())
        })
    }

    async fn own_attribute_names(&self, node: &MemoryNode) -> Result<Vec<String>> {
        self.read(|s| Ok(s.node(&node.0)?.attributes.keys().cloned().collect()))
    }

    async fn attribute(&self, node: &MemoryNode, name: &str) -> Result<Option<Value>> {
        self.read(|s| s.inherited(&node.0, |r| r.attributes.get(name).cloned()))
    }

    async fn set_attribute(&self, node: &MemoryNode, name: &str, value: Value) -> Result<()> {
        self.write(|s| {
            s.node_mut(&node.0)?
                .attributes
                .insert(name.to_string(), value);
            s.record(MutationOp::SetAttribute, &node.0, Some(name));
            Ok(())
        })
    }

    async fn del_attribute(&self, node: &MemoryNode, name: &str) -> Result<()> {
        self.write(|s| {
            s.node_mut(&node.0)?.attributes.remove(name);
            s.record(MutationOp::DelAttribute, &node.0, Some(name));
            Ok(())
        })
    }

    async fn own_attribute_meta_names(&self, node: &MemoryNode) -> Result<Vec<String>> {
        self.read(|s| Ok(s.node(&node.0)?.attribute_meta.keys().cloned().collect()))
    }

    async fn attribute_meta(&self, node: &MemoryNode, name: &str) -> Result<Option<Value>> {
        self.read(|s| Ok(s.node(&node.0)?.attribute_meta.get(name).cloned()))
    }

    async fn set_attribute_meta(&self, node: &MemoryNode, name: &str, meta: Value) -> Result<()> {
        self.write(|s| {
            s.node_mut(&node.0)?
                .attribute_meta
                .insert(name.to_string(), meta);
            s.record(MutationOp::SetAttributeMeta, &node.0, Some(name));
            Ok(())
        })
    }

    async fn del_attribute_meta(&self, node: &MemoryNode, name: &str) -> Result<()> {
        self.write(|s| {
            s.node_mut(&node.0)?.attribute_meta.remove(name);
            s.record(MutationOp::DelAttributeMeta, &node.0, Some(name));
            Ok(())
        })
    }

    async fn own_pointer_names(&self, node: &MemoryNode) -> Result<Vec<String>> {
        self.read(|s| Ok(s.node(&node.0)?.pointers.keys().cloned().collect()))
    }

    async fn pointer_path(&self, node: &MemoryNode, name: &str) -> Result<Option<String>> {
        self.read(|s| {
            if name == "base" {
                return Ok(s.node(&node.0)?.base.clone());
            }
            s.inherited(&node.0, |r| r.pointers.get(name).cloned())
        })
    }

    async fn set_pointer(&self, node: &MemoryNode, name: &str, target: &MemoryNode) -> Result<()> {
        self.write(|s| {
            s.node(&target.0)?;
            if name == "base" {
                s.set_base(&node.0, &target.0)?;
            } else {
                s.node_mut(&node.0)?
                    .pointers
                    .insert(name.to_string(), target.0.clone());
            }
            s.record(MutationOp::SetPointer, &node.0, Some(name));
            Ok(())
        })
    }

    async fn del_pointer(&self, node: &MemoryNode, name: &str) -> Result<()> {
        self.write(|s| {
            let record = s.node_mut(&node.0)?;
            if name == "base" {
                record.base = None;
            } else {
                record.pointers.remove(name);
            }
            s.record(MutationOp::DelPointer, &node.0, Some(name));
            Ok(())
        })
    }

    async fn own_pointer_meta_names(&self, node: &MemoryNode) -> Result<Vec<String>> {
        self.read(|s| Ok(s.node(&node.0)?.pointer_meta.keys().cloned().collect()))
    }

    async fn pointer_meta(&self, node: &MemoryNode, name: &str) -> Result<Option<PointerMeta>> {
        self.read(|s| Ok(s.node(&node.0)?.pointer_meta.get(name).cloned()))
    }

    async fn set_pointer_meta_limits(
        &self,
        node: &MemoryNode,
        name: &str,
        min: i64,
        max: i64,
    ) -> Result<()> {
        self.write(|s| {
            let meta = s
                .node_mut(&node.0)?
                .pointer_meta
                .entry(name.to_string())
                .or_default();
            meta.min = min;
            meta.max = max;
            s.record(MutationOp::SetPointerMetaLimits, &node.0, Some(name));
            Ok(())
        })
    }

    async fn set_pointer_meta_target(
        &self,
        node: &MemoryNode,
        name: &str,
        target: &MemoryNode,
        min: i64,
        max: i64,
    ) -> Result<()> {
        self.write(|s| {
            s.node(&target.0)?;
            s.node_mut(&node.0)?
                .pointer_meta
                .entry(name.to_string())
                .or_insert_with(|| PointerMeta {
                    min: Cardinality::UNBOUNDED,
                    max: Cardinality::UNBOUNDED,
                    targets: BTreeMap::new(),
                })
                .targets
                .insert(target.0.clone(), Cardinality::new(min, max));
            s.record(MutationOp::SetPointerMetaTarget, &node.0, Some(name));
            Ok(())
        })
    }

    async fn del_pointer_meta(&self, node: &MemoryNode, name: &str) -> Result<()> {
        self.write(|s| {
            s.node_mut(&node.0)?.pointer_meta.remove(name);
            s.record(MutationOp::DelPointerMeta, &node.0, Some(name));
            Ok(())
        })
    }

    async fn del_pointer_meta_target(
        &self,
        node: &MemoryNode,
        name: &str,
        target_path: &str,
    ) -> Result<()> {
        self.write(|s| {
            if let Some(meta) = s.node_mut(&node.0)?.pointer_meta.get_mut(name) {
                meta.targets.remove(target_path);
            }
            s.record(MutationOp::DelPointerMetaTarget, &node.0, Some(name));
            Ok(())
        })
    }

    async fn own_set_names(&self, node: &MemoryNode) -> Result<Vec<String>> {
        self.read(|s| Ok(s.node(&node.0)?.sets.keys().cloned().collect()))
    }

    async fn create_set(&self, node: &MemoryNode, set: &str) -> Result<()> {
        self.write(|s| {
            s.node_mut(&node.0)?.sets.entry(set.to_string()).or_default();
            s.record(MutationOp::CreateSet, &node.0, Some(set));
            Ok(())
        })
    }

    async fn del_set(&self, node: &MemoryNode, set: &str) -> Result<()> {
        self.write(|s| {
            s.node_mut(&node.0)?.sets.remove(set);
            s.record(MutationOp::DelSet, &node.0, Some(set));
            Ok(())
        })
    }

    async fn add_member(&self, node: &MemoryNode, set: &str, member: &MemoryNode) -> Result<()> {
        self.write(|s| {
            s.node(&member.0)?;
            let members = s.node_mut(&node.0)?.sets.entry(set.to_string()).or_default();
            if !members.iter().any(|m| m.path == member.0) {
                members.push(SetMember {
                    path: member.0.clone(),
                    ..SetMember::default()
                });
            }
            s.record(MutationOp::AddMember, &node.0, Some(set));
            Ok(())
        })
    }

    async fn del_member(&self, node: &MemoryNode, set: &str, member_path: &str) -> Result<()> {
        self.write(|s| {
            if let Some(members) = s.node_mut(&node.0)?.sets.get_mut(set) {
                members.retain(|m| m.path != member_path);
            }
            s.record(MutationOp::DelMember, &node.0, Some(set));
            Ok(())
        })
    }

    async fn member_paths(&self, node: &MemoryNode, set: &str) -> Result<Vec<String>> {
        self.read(|s| {
            Ok(s.node(&node.0)?
                .sets
                .get(set)
                .map(|members| members.iter().map(|m| m.path.clone()).collect())
                .unwrap_or_default())
        })
    }

    async fn member_attribute_names(
        &self,
        node: &MemoryNode,
        set: &str,
        member_path: &str,
    ) -> Result<Vec<String>> {
        self.read(|s| {
            Ok(s.node(&node.0)?
                .member(set, member_path)
                .map(|m| m.attributes.keys().cloned().collect())
                .unwrap_or_default())
        })
    }

    async fn member_attribute(
        &self,
        node: &MemoryNode,
        set: &str,
        member_path: &str,
        name: &str,
    ) -> Result<Option<Value>> {
        self.read(|s| {
            Ok(s.node(&node.0)?
                .member(set, member_path)
                .and_then(|m| m.attributes.get(name).cloned()))
        })
    }

    async fn set_member_attribute(
        &self,
        node: &MemoryNode,
        set: &str,
        member_path: &str,
        name: &str,
        value: Value,
    ) -> Result<()> {
        self.write(|s| {
            s.member_mut(&node.0, set, member_path)?
                .attributes
                .insert(name.to_string(), value);
            s.record(MutationOp::SetMemberAttribute, &node.0, Some(name));
            Ok(())
        })
    }

    async fn del_member_attribute(
        &self,
        node: &MemoryNode,
        set: &str,
        member_path: &str,
        name: &str,
    ) -> Result<()> {
        self.write(|s| {
            if let Ok(member) = s.member_mut(&node.0, set, member_path) {
                member.attributes.remove(name);
            }
            s.record(MutationOp::DelMemberAttribute, &node.0, Some(name));
            Ok(())
        })
    }

    async fn member_registry_names(
        &self,
        node: &MemoryNode,
        set: &str,
        member_path: &str,
    ) -> Result<Vec<String>> {
        self.read(|s| {
            Ok(s.node(&node.0)?
                .member(set, member_path)
                .map(|m| m.registry.keys().cloned().collect())
                .unwrap_or_default())
        })
    }

    async fn member_registry(
        &self,
        node: &MemoryNode,
        set: &str,
        member_path: &str,
        name: &str,
    ) -> Result<Option<Value>> {
        self.read(|s| {
            Ok(s.node(&node.0)?
                .member(set, member_path)
                .and_then(|m| m.registry.get(name).cloned()))
        })
    }

    async fn set_member_registry(
        &self,
        node: &MemoryNode,
        set: &str,
        member_path: &str,
        name: &str,
        value: Value,
    ) -> Result<()> {
        self.write(|s| {
            s.member_mut(&node.0, set, member_path)?
                .registry
                .insert(name.to_string(), value);
            s.record(MutationOp::SetMemberRegistry, &node.0, Some(name));
            Ok(())
        })
    }

    async fn del_member_registry(
        &self,
        node: &MemoryNode,
        set: &str,
        member_path: &str,
        name: &str,
    ) -> Result<()> {
        self.write(|s| {
            if let Ok(member) = s.member_mut(&node.0, set, member_path) {
                member.registry.remove(name);
            }
            s.record(MutationOp::DelMemberRegistry, &node.0, Some(name));
            Ok(())
        })
    }

    async fn own_registry_names(&self, node: &MemoryNode) -> Result<Vec<String>> {
        self.read(|s| Ok(s.node(&node.0)?.registry.keys().cloned().collect()))
    }

    async fn registry(&self, node: &MemoryNode, name: &str) -> Result<Option<Value>> {
        self.read(|s| s.inherited(&node.0, |r| r.registry.get(name).cloned()))
    }

    async fn set_registry(&self, node: &MemoryNode, name: &str, value: Value) -> Result<()> {
        self.write(|s| {
            s.node_mut(&node.0)?
                .registry
                .insert(name.to_string(), value);
            s.record(MutationOp::SetRegistry, &node.0, Some(name));
            Ok(())
        })
    }

    async fn del_registry(&self, node: &MemoryNode, name: &str) -> Result<()> {
        self.write(|s| {
            s.node_mut(&node.0)?.registry.remove(name);
            s.record(MutationOp::DelRegistry, &node.0, Some(name));
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn block_on<F: std::future::Future>(future: F) -> F::Output {
        futures::executor::block_on(future)
    }

    #[test]
    fn test_new_graph_has_registered_fco() {
        let graph = MemoryGraph::new();
        let meta = block_on(graph.meta_nodes()).unwrap();
        assert_eq!(meta, vec![MemoryGraph::node(FCO_PATH)]);
        let name = block_on(graph.attribute(&meta[0], "name")).unwrap();
        assert_eq!(name, Some(json!("FCO")));
    }

    #[test]
    fn test_create_allocates_child_paths() {
        let graph = MemoryGraph::new();
        let root = block_on(graph.root()).unwrap();
        let fco = MemoryGraph::node(FCO_PATH);
        let a = block_on(graph.create_node(&root, &fco)).unwrap();
        let b = block_on(graph.create_node(&a, &fco)).unwrap();
        assert_eq!(a.path(), "/2");
        assert_eq!(b.path(), "/2/1");
        assert_eq!(block_on(graph.parent(&b)).unwrap(), Some(a));
    }

    #[test]
    fn test_attributes_inherit_through_base() {
        let graph = MemoryGraph::new();
        let root = block_on(graph.root()).unwrap();
        let fco = MemoryGraph::node(FCO_PATH);
        let proto = block_on(graph.create_node(&root, &fco)).unwrap();
        block_on(graph.set_attribute(&proto, "color", json!("red"))).unwrap();
        let instance = block_on(graph.create_node(&root, &proto)).unwrap();

        assert_eq!(
            block_on(graph.attribute(&instance, "color")).unwrap(),
            Some(json!("red"))
        );
        assert!(block_on(graph.own_attribute_names(&instance))
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_delete_purges_references() {
        let graph = MemoryGraph::new();
        let root = block_on(graph.root()).unwrap();
        let fco = MemoryGraph::node(FCO_PATH);
        let src = block_on(graph.create_node(&root, &fco)).unwrap();
        let dst = block_on(graph.create_node(&root, &fco)).unwrap();
        block_on(graph.set_pointer(&src, "next", &dst)).unwrap();
        block_on(graph.add_member(&src, "peers", &dst)).unwrap();

        block_on(graph.delete_node(&dst)).unwrap();

        assert_eq!(block_on(graph.pointer_path(&src, "next")).unwrap(), None);
        assert!(block_on(graph.member_paths(&src, "peers"))
            .unwrap()
            .is_empty());
        assert_eq!(block_on(graph.load_by_path(dst.path())).unwrap(), None);
    }

    #[test]
    fn test_base_cycle_rejected() {
        let graph = MemoryGraph::new();
        let root = block_on(graph.root()).unwrap();
        let fco = MemoryGraph::node(FCO_PATH);
        let a = block_on(graph.create_node(&root, &fco)).unwrap();
        let b = block_on(graph.create_node(&root, &a)).unwrap();
        assert!(block_on(graph.set_pointer(&a, "base", &b)).is_err());
    }

    #[test]
    fn test_journal_records_mutations_in_order() {
        let graph = MemoryGraph::new();
        let root = block_on(graph.root()).unwrap();
        let fco = MemoryGraph::node(FCO_PATH);
        let a = block_on(graph.create_node(&root, &fco)).unwrap();
        block_on(graph.set_attribute(&a, "name", json!("a"))).unwrap();

        let journal = graph.take_journal().unwrap();
        let ops: Vec<_> = journal.iter().map(|m| m.op).collect();
        assert_eq!(ops, vec![MutationOp::CreateNode, MutationOp::SetAttribute]);
        assert!(graph.take_journal().unwrap().is_empty());
    }

    #[test]
    fn test_snapshot_round_trip() {
        let graph = MemoryGraph::new();
        let snapshot = graph.snapshot().unwrap();
        let restored = MemoryGraph::from_snapshot(snapshot.clone()).unwrap();
        assert_eq!(restored.snapshot().unwrap(), snapshot);
        assert!(MemoryGraph::from_snapshot(GraphSnapshot::default()).is_err());
    }
}
