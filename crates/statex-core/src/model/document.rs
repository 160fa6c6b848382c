use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Per-set, per-member values: set name → member selector → entry name → value
pub type MemberData = BTreeMap<String, BTreeMap<String, BTreeMap<String, Value>>>;

/// Declarative description of the desired (or, when produced by the
/// serializer, the current) state of one node and optionally its subtree.
///
/// Every category is optional. An absent category is left untouched by
/// reconciliation; a present one is converged exactly, including deletion of
/// live entries it does not list. The same holds for `children`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StateDocument {
    /// Selector naming this node; absent means "create a fresh node"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Path of the live node (informational; written by the serializer, never diffed)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attributes: Option<BTreeMap<String, Value>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attribute_meta: Option<BTreeMap<String, Value>>,

    /// Pointer name → target selector. `base` names the prototype.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pointers: Option<BTreeMap<String, String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pointer_meta: Option<BTreeMap<String, PointerMetaDoc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registry: Option<BTreeMap<String, Value>>,

    /// Set name → ordered member selectors
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sets: Option<BTreeMap<String, Vec<String>>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub member_attributes: Option<MemberData>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub member_registry: Option<MemberData>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<StateDocument>>,
}

impl StateDocument {
    pub fn new() -> Self {
        Self::default()
    }

    /// Document addressed by `selector`
    pub fn with_id(selector: impl Into<String>) -> Self {
        Self {
            id: Some(selector.into()),
            ..Self::default()
        }
    }

    pub fn attribute(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes
            .get_or_insert_with(BTreeMap::new)
            .insert(name.into(), value.into());
        self
    }

    pub fn pointer(mut self, name: impl Into<String>, target: impl Into<String>) -> Self {
        self.pointers
            .get_or_insert_with(BTreeMap::new)
            .insert(name.into(), target.into());
        self
    }

    pub fn set(mut self, name: impl Into<String>, members: Vec<String>) -> Self {
        self.sets
            .get_or_insert_with(BTreeMap::new)
            .insert(name.into(), members);
        self
    }

    pub fn child(mut self, child: StateDocument) -> Self {
        self.children.get_or_insert_with(Vec::new).push(child);
        self
    }

    /// Base selector this document names, if any
    pub fn base(&self) -> Option<&str> {
        self.pointers
            .as_ref()
            .and_then(|p| p.get("base"))
            .map(String::as_str)
    }

    /// Child documents, empty when `children` is absent
    pub fn child_documents(&self) -> &[StateDocument] {
        self.children.as_deref().unwrap_or(&[])
    }

    /// The diffable projection: everything except `id`, `path` and `children`
    pub fn to_comparable(&self) -> serde_json::Result<Value> {
        let mut value = serde_json::to_value(self)?;
        if let Value::Object(map) = &mut value {
            map.remove("id");
            map.remove("path");
            map.remove("children");
        }
        Ok(value)
    }
}

/// Cardinality bound; `-1` means unbounded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cardinality {
    #[serde(default = "unbounded")]
    pub min: i64,
    #[serde(default = "unbounded")]
    pub max: i64,
}

impl Cardinality {
    pub const UNBOUNDED: i64 = -1;

    pub fn new(min: i64, max: i64) -> Self {
        Self { min, max }
    }
}

impl Default for Cardinality {
    fn default() -> Self {
        Self::new(Self::UNBOUNDED, Self::UNBOUNDED)
    }
}

fn unbounded() -> i64 {
    Cardinality::UNBOUNDED
}

/// Pointer meta as it appears in a document: overall limits plus one entry
/// per allowed target, keyed by target selector.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PointerMetaDoc {
    #[serde(default = "unbounded")]
    pub min: i64,
    #[serde(default = "unbounded")]
    pub max: i64,
    #[serde(flatten)]
    pub targets: BTreeMap<String, Cardinality>,
}

impl PointerMetaDoc {
    pub fn new(min: i64, max: i64) -> Self {
        Self {
            min,
            max,
            targets: BTreeMap::new(),
        }
    }

    pub fn target(mut self, selector: impl Into<String>, cardinality: Cardinality) -> Self {
        self.targets.insert(selector.into(), cardinality);
        self
    }
}
