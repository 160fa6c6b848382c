//! Structural differencer.
//!
//! Compares two canonical documents (as JSON values) and produces an ordered
//! list of [`ChangeRecord`](crate::model::ChangeRecord)s.
//!
//! ```
//! use serde_json::json;
//! use statex_core::diff::diff;
//!
//! let changes = diff(&json!({"attributes": {"name": "a"}}), &json!({"attributes": {"name": "b"}}));
//! assert_eq!(changes.len(), 1);
//! assert_eq!(changes[0].key_string(), "attributes.name");
//! ```
//!
//! ## Guarantees
//!
//! - **Determinism**: objects are walked in sorted key order, so identical
//!   inputs produce identical change lists.
//! - **Invertibility**: `apply_changes(a, &diff(&a, &b)) == b`.

pub mod engine;
pub mod human_summary;

pub use engine::{apply_changes, diff, remove_nested, set_nested};
pub use human_summary::render_human_summary;
