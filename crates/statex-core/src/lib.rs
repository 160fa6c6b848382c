//! Statex Core - declarative state reconciliation for object graphs
//!
//! This crate turns a declarative description of desired node state into
//! mutations against a live graph:
//! - Document model: state documents, selectors and change records
//! - Graph store contract plus an in-memory reference store
//! - Canonical serializer, selector resolver and structural differencer
//! - Reconciliation engine ([`Importer`]) with ordered change dispatch
//! - Error and logging facilities shared by the store and CLI crates

pub mod diff;
pub mod errors;
pub mod graph;
pub mod importer;
pub mod logging_facility;
pub mod model;

pub use statex_core_types as core_types;

// Re-export commonly used types
pub use errors::{ExError, ExErrorKind, Result, StatexError};
pub use graph::{GraphStore, MemoryGraph, MemoryNode};
pub use importer::{Importer, ImporterConfig};
pub use model::{ChangeRecord, Selector, StateDocument};
