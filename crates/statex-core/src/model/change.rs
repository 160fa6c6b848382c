use crate::errors::{Result, StatexError};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    Put,
    Delete,
}

/// One step of a path into a document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum KeySegment {
    Index(usize),
    Field(String),
}

impl KeySegment {
    pub fn as_field(&self) -> Option<&str> {
        match self {
            KeySegment::Field(name) => Some(name),
            KeySegment::Index(_) => None,
        }
    }

    pub fn as_index(&self) -> Option<usize> {
        match self {
            KeySegment::Index(i) => Some(*i),
            KeySegment::Field(_) => None,
        }
    }
}

impl fmt::Display for KeySegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeySegment::Index(i) => write!(f, "{}", i),
            KeySegment::Field(name) => f.write_str(name),
        }
    }
}

impl From<&str> for KeySegment {
    fn from(value: &str) -> Self {
        KeySegment::Field(value.to_string())
    }
}

impl From<String> for KeySegment {
    fn from(value: String) -> Self {
        KeySegment::Field(value)
    }
}

impl From<usize> for KeySegment {
    fn from(value: usize) -> Self {
        KeySegment::Index(value)
    }
}

/// A single typed difference between two documents
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeRecord {
    pub kind: ChangeKind,
    pub key: Vec<KeySegment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
}

impl ChangeRecord {
    pub fn put(key: Vec<KeySegment>, value: Value) -> Self {
        Self {
            kind: ChangeKind::Put,
            key,
            value: Some(value),
        }
    }

    pub fn delete(key: Vec<KeySegment>) -> Self {
        Self {
            kind: ChangeKind::Delete,
            key,
            value: None,
        }
    }

    /// Key rendered as `a.b.0` for messages
    pub fn key_string(&self) -> String {
        self.key
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(".")
    }

    /// Field segment at `index`, if present and not an array index
    pub fn field(&self, index: usize) -> Option<&str> {
        self.key.get(index).and_then(KeySegment::as_field)
    }

    /// Category named by the first key segment
    ///
    /// # Errors
    ///
    /// `UnknownCategory` if the first segment is missing or unrecognized.
    pub fn category(&self) -> Result<Category> {
        self.field(0)
            .and_then(Category::from_key)
            .ok_or_else(|| StatexError::UnknownCategory {
                key: self.key_string(),
            })
    }

    /// Put value, or `Null` for deletes
    pub fn value_or_null(&self) -> &Value {
        self.value.as_ref().unwrap_or(&Value::Null)
    }
}

/// Top-level document categories that changes are dispatched on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Attributes,
    AttributeMeta,
    Pointers,
    PointerMeta,
    Sets,
    MemberAttributes,
    MemberRegistry,
    Registry,
}

impl Category {
    pub const ALL: [Category; 8] = [
        Category::Attributes,
        Category::AttributeMeta,
        Category::Pointers,
        Category::PointerMeta,
        Category::Sets,
        Category::MemberAttributes,
        Category::MemberRegistry,
        Category::Registry,
    ];

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.key() == key)
    }

    pub fn key(&self) -> &'static str {
        match self {
            Category::Attributes => "attributes",
            Category::AttributeMeta => "attribute_meta",
            Category::Pointers => "pointers",
            Category::PointerMeta => "pointer_meta",
            Category::Sets => "sets",
            Category::MemberAttributes => "member_attributes",
            Category::MemberRegistry => "member_registry",
            Category::Registry => "registry",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Build a key from string-like and index segments: `key!["sets", "s", 0]`
#[macro_export]
macro_rules! key {
    ($($segment:expr),* $(,)?) => {
        vec![$($crate::model::KeySegment::from($segment)),*]
    };
}
