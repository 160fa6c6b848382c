//! Graph store contract
//!
//! The importer only ever talks to the object graph through [`GraphStore`].
//! Every method may suspend (the backing store can be remote or disk
//! resident); none of them are called concurrently by one importer.

pub mod memory;

use crate::errors::Result;
use crate::model::Cardinality;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

pub use memory::{GraphMutation, GraphSnapshot, MemoryGraph, MemoryNode, MutationOp};

/// Name of the root set holding meta-registered nodes
pub const META_ASPECT_SET: &str = "MetaAspectSet";

/// Pointer meta as stored: overall limits plus allowed targets keyed by path
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PointerMeta {
    pub min: i64,
    pub max: i64,
    pub targets: BTreeMap<String, Cardinality>,
}

#[async_trait]
pub trait GraphStore: Send + Sync {
    /// Opaque node handle
    type Node: Clone + PartialEq + fmt::Debug + Send + Sync;

    // ----- structure -----

    async fn root(&self) -> Result<Self::Node>;
    /// Create a child of `parent` that inherits from `base`
    async fn create_node(&self, parent: &Self::Node, base: &Self::Node) -> Result<Self::Node>;
    async fn delete_node(&self, node: &Self::Node) -> Result<()>;
    /// Children in creation order
    async fn load_children(&self, node: &Self::Node) -> Result<Vec<Self::Node>>;
    async fn load_by_path(&self, path: &str) -> Result<Option<Self::Node>>;
    async fn parent(&self, node: &Self::Node) -> Result<Option<Self::Node>>;
    async fn path(&self, node: &Self::Node) -> Result<String>;
    async fn guid(&self, node: &Self::Node) -> Result<String>;
    /// All nodes registered in the meta-aspect set of the root
    async fn meta_nodes(&self) -> Result<Vec<Self::Node>>;

    // ----- attributes -----

    async fn own_attribute_names(&self, node: &Self::Node) -> Result<Vec<String>>;
    /// Attribute value, inherited through the base chain
    async fn attribute(&self, node: &Self::Node, name: &str) -> Result<Option<Value>>;
    async fn set_attribute(&self, node: &Self::Node, name: &str, value: Value) -> Result<()>;
    async fn del_attribute(&self, node: &Self::Node, name: &str) -> Result<()>;

    async fn own_attribute_meta_names(&self, node: &Self::Node) -> Result<Vec<String>>;
    async fn attribute_meta(&self, node: &Self::Node, name: &str) -> Result<Option<Value>>;
    async fn set_attribute_meta(&self, node: &Self::Node, name: &str, meta: Value) -> Result<()>;
    async fn del_attribute_meta(&self, node: &Self::Node, name: &str) -> Result<()>;

    // ----- pointers -----

    /// Own pointer names, excluding `base`
    async fn own_pointer_names(&self, node: &Self::Node) -> Result<Vec<String>>;
    /// Target path of a pointer; `base` answers the prototype
    async fn pointer_path(&self, node: &Self::Node, name: &str) -> Result<Option<String>>;
    async fn set_pointer(&self, node: &Self::Node, name: &str, target: &Self::Node)
        -> Result<()>;
    async fn del_pointer(&self, node: &Self::Node, name: &str) -> Result<()>;

    async fn own_pointer_meta_names(&self, node: &Self::Node) -> Result<Vec<String>>;
    async fn pointer_meta(&self, node: &Self::Node, name: &str) -> Result<Option<PointerMeta>>;
    async fn set_pointer_meta_limits(
        &self,
        node: &Self::Node,
        name: &str,
        min: i64,
        max: i64,
    ) -> Result<()>;
    async fn set_pointer_meta_target(
        &self,
        node: &Self::Node,
        name: &str,
        target: &Self::Node,
        min: i64,
        max: i64,
    ) -> Result<()>;
    async fn del_pointer_meta(&self, node: &Self::Node, name: &str) -> Result<()>;
    async fn del_pointer_meta_target(
        &self,
        node: &Self::Node,
        name: &str,
        target_path: &str,
    ) -> Result<()>;

    // ----- sets -----

    async fn own_set_names(&self, node: &Self::Node) -> Result<Vec<String>>;
    async fn create_set(&self, node: &Self::Node, set: &str) -> Result<()>;
    async fn del_set(&self, node: &Self::Node, set: &str) -> Result<()>;
    /// Add a member; adding an existing member is a no-op
    async fn add_member(&self, node: &Self::Node, set: &str, member: &Self::Node) -> Result<()>;
    async fn del_member(&self, node: &Self::Node, set: &str, member_path: &str) -> Result<()>;
    /// Member paths in insertion order
    async fn member_paths(&self, node: &Self::Node, set: &str) -> Result<Vec<String>>;

    async fn member_attribute_names(
        &self,
        node: &Self::Node,
        set: &str,
        member_path: &str,
    ) -> Result<Vec<String>>;
    async fn member_attribute(
        &self,
        node: &Self::Node,
        set: &str,
        member_path: &str,
        name: &str,
    ) -> Result<Option<Value>>;
    async fn set_member_attribute(
        &self,
        node: &Self::Node,
        set: &str,
        member_path: &str,
        name: &str,
        value: Value,
    ) -> Result<()>;
    async fn del_member_attribute(
        &self,
        node: &Self::Node,
        set: &str,
        member_path: &str,
        name: &str,
    ) -> Result<()>;

    async fn member_registry_names(
        &self,
        node: &Self::Node,
        set: &str,
        member_path: &str,
    ) -> Result<Vec<String>>;
    async fn member_registry(
        &self,
        node: &Self::Node,
        set: &str,
        member_path: &str,
        name: &str,
    ) -> Result<Option<Value>>;
    async fn set_member_registry(
        &self,
        node: &Self::Node,
        set: &str,
        member_path: &str,
        name: &str,
        value: Value,
    ) -> Result<()>;
    async fn del_member_registry(
        &self,
        node: &Self::Node,
        set: &str,
        member_path: &str,
        name: &str,
    ) -> Result<()>;

    // ----- registry -----

    async fn own_registry_names(&self, node: &Self::Node) -> Result<Vec<String>>;
    /// Registry value, inherited through the base chain
    async fn registry(&self, node: &Self::Node, name: &str) -> Result<Option<Value>>;
    async fn set_registry(&self, node: &Self::Node, name: &str, value: Value) -> Result<()>;
    async fn del_registry(&self, node: &Self::Node, name: &str) -> Result<()>;
}
