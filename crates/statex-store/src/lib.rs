//! statex store - file persistence for the statex importer
//!
//! Provides:
//! - Atomic JSON snapshots of an in-memory graph
//! - Desired-state document parsing (JSON and YAML) with selector validation

pub mod document;
pub mod errors;
pub mod snapshot;

// Re-export key types
pub use document::{parse_document_file, parse_document_str, validate_document, DocumentFormat};
pub use errors::Result;
pub use snapshot::{load_graph, load_snapshot, save_graph, save_snapshot};
