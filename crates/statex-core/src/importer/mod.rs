//! Declarative-state importer
//!
//! - [`serializer`]: live node → canonical [`StateDocument`](crate::model::StateDocument)
//! - [`resolver`]: selector lookup, node creation, subtree fixed point
//! - [`dispatch`]: per-category change handlers
//! - [`engine`]: [`Importer`] tying them together

pub mod config;
pub mod dispatch;
pub mod engine;
pub mod resolver;
pub mod serializer;

pub use config::ImporterConfig;
pub use engine::{order_changes, Importer};
pub use resolver::{ResolutionCache, Resolver};
pub use serializer::serialize;
