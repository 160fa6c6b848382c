//! Document model: declarative state, selectors and change records

pub mod change;
pub mod document;
pub mod selector;

pub use change::{Category, ChangeKind, ChangeRecord, KeySegment};
pub use document::{Cardinality, MemberData, PointerMetaDoc, StateDocument};
pub use selector::Selector;
