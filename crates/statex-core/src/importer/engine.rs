//! Reconciliation engine
//!
//! [`Importer`] is the entry point: `apply` converges a live node (and the
//! parts of its subtree the document describes) to a [`StateDocument`].
//!
//! ## Example
//!
//! ```
//! use statex_core::graph::{GraphStore, MemoryGraph};
//! use statex_core::importer::Importer;
//! use statex_core::model::StateDocument;
//!
//! futures::executor::block_on(async {
//!     let graph = MemoryGraph::new();
//!     let importer = Importer::new(&graph).await.unwrap();
//!     let root = graph.root().await.unwrap();
//!
//!     let doc = StateDocument::new().attribute("name", "Circuit");
//!     let node = importer.import(&root, &doc).await.unwrap();
//!     assert!(importer.plan(&node, &doc).await.unwrap().is_empty());
//! });
//! ```
//!
//! ## Ordering
//!
//! Within one node, changes are applied in this order (stable within a
//! bucket): attributes, attribute meta and registry in diff order; then
//! deletes before puts for pointer meta, pointers, sets, member attributes
//! and member registry, in that order.

use super::config::ImporterConfig;
use super::dispatch::dispatch;
use super::resolver::{identity, ResolutionCache, Resolver};
use super::serializer;
use crate::core_types::RequestContext;
use crate::diff::diff;
use crate::errors::{Result, StatexError};
use crate::graph::GraphStore;
use crate::model::{Category, ChangeKind, ChangeRecord, KeySegment, Selector, StateDocument};
use crate::{log_op_end, log_op_error, log_op_start};
use futures::future::BoxFuture;
use serde_json::Value;
use std::time::Instant;
use tracing::debug;

/// Declarative-state importer over a [`GraphStore`]
pub struct Importer<'a, S: GraphStore> {
    store: &'a S,
    root: S::Node,
    config: ImporterConfig,
    context: Option<RequestContext>,
}

impl<'a, S: GraphStore> Importer<'a, S> {
    /// Importer with the default configuration
    ///
    /// # Errors
    ///
    /// Fails if the store cannot produce its root.
    pub async fn new(store: &'a S) -> Result<Self> {
        Self::with_config(store, ImporterConfig::default()).await
    }

    /// # Errors
    ///
    /// Fails if the store cannot produce its root.
    pub async fn with_config(store: &'a S, config: ImporterConfig) -> Result<Self> {
        let root = store.root().await?;
        Ok(Self {
            store,
            root,
            config,
            context: None,
        })
    }

    /// Attach a request context; its request id is logged with every operation
    pub fn with_context(mut self, context: RequestContext) -> Self {
        self.context = Some(context);
        self
    }

    fn resolver(&self) -> Resolver<'_, S> {
        Resolver::new(self.store, &self.root, &self.config)
    }

    fn request_id(&self) -> String {
        self.context
            .as_ref()
            .map(|c| c.request_id.to_string())
            .unwrap_or_default()
    }

    /// Canonical document for `node`, deep unless `shallow`
    ///
    /// # Errors
    ///
    /// Propagates store failures.
    pub async fn serialize(&self, node: &S::Node, shallow: bool) -> Result<StateDocument> {
        let start = Instant::now();
        let request_id = self.request_id();
        log_op_start!("serialize", request_id = %request_id, shallow);

        let result = serializer::serialize(self.store, node, shallow).await;
        let duration_ms = start.elapsed().as_millis() as u64;
        match &result {
            Ok(_) => {
                log_op_end!("serialize", duration_ms = duration_ms);
            }
            Err(e) => {
                log_op_error!("serialize", e, duration_ms = duration_ms);
            }
        }
        result
    }

    /// Converge `node` to `document`.
    ///
    /// Resolves (creating where needed) every node the document's subtree
    /// names, then reconciles depth-first in child order. Mutations already
    /// made are not rolled back on failure.
    ///
    /// # Errors
    ///
    /// `UnresolvableReferenceGroup`, `UnresolvableSelector`,
    /// `MissingPrototype`, `UnsupportedShape`, `UnknownCategory`, selector
    /// and document validation errors, and store failures.
    pub async fn apply(&self, node: &S::Node, document: &StateDocument) -> Result<()> {
        let start = Instant::now();
        let request_id = self.request_id();
        let node_path = self.store.path(node).await?;
        log_op_start!("apply", request_id = %request_id, node_path = %node_path);

        let document = with_placeholders(document);
        let mut cache = ResolutionCache::new();
        let result = self.apply_node(node, &document, &mut cache).await;

        let duration_ms = start.elapsed().as_millis() as u64;
        match &result {
            Ok(_) => {
                log_op_end!("apply", duration_ms = duration_ms, resolved = cache.len());
            }
            Err(e) => {
                log_op_error!("apply", e, duration_ms = duration_ms, node_path = %node_path);
            }
        }
        result
    }

    /// Create a node under `parent` from the default prototype, then apply
    /// `document` to it. A `pointers.base` in the document re-bases it.
    ///
    /// # Errors
    ///
    /// As [`apply`](Self::apply), plus `MissingPrototype` if the default
    /// prototype does not exist.
    pub async fn import(&self, parent: &S::Node, document: &StateDocument) -> Result<S::Node> {
        let start = Instant::now();
        let request_id = self.request_id();
        log_op_start!("import", request_id = %request_id);

        let result = self.import_inner(parent, document).await;
        let duration_ms = start.elapsed().as_millis() as u64;
        match &result {
            Ok(_) => {
                log_op_end!("import", duration_ms = duration_ms);
            }
            Err(e) => {
                log_op_error!("import", e, duration_ms = duration_ms);
            }
        }
        result
    }

    async fn import_inner(&self, parent: &S::Node, document: &StateDocument) -> Result<S::Node> {
        let Some(base) = self
            .store
            .load_by_path(&self.config.default_base_path)
            .await?
        else {
            return Err(StatexError::MissingPrototype {
                selector: document.id.clone().unwrap_or_default(),
                parent_path: self.store.path(parent).await?,
            });
        };
        let node = self.store.create_node(parent, &base).await?;
        self.apply(&node, document).await?;
        Ok(node)
    }

    /// Changes `apply` would dispatch to `node` itself, in dispatch order.
    ///
    /// Nothing is resolved or created and children are not visited.
    ///
    /// # Errors
    ///
    /// Store failures and `UnknownCategory`.
    pub async fn plan(
        &self,
        node: &S::Node,
        document: &StateDocument,
    ) -> Result<Vec<ChangeRecord>> {
        self.changes_for(node, document).await
    }

    async fn changes_for(
        &self,
        node: &S::Node,
        document: &StateDocument,
    ) -> Result<Vec<ChangeRecord>> {
        let current = serializer::serialize(self.store, node, true).await?;
        let changes = diff(&current.to_comparable()?, &document.to_comparable()?);
        order_changes(collapse_set_changes(normalize(changes), document))
    }

    fn apply_node<'f>(
        &'f self,
        node: &'f S::Node,
        document: &'f StateDocument,
        cache: &'f mut ResolutionCache<S::Node>,
    ) -> BoxFuture<'f, Result<()>> {
        Box::pin(async move {
            let resolver = self.resolver();

            if let Some(id) = document.id.as_deref() {
                let selector = Selector::parse(id)?;
                match self.store.parent(node).await? {
                    Some(parent) => {
                        let parent_path = self.store.path(&parent).await?;
                        cache.record(identity(&selector, &parent_path), node.clone());
                    }
                    None if !selector.is_absolute() => {
                        return Err(StatexError::NoParent {
                            selector: id.to_string(),
                            node_path: self.store.path(node).await?,
                        });
                    }
                    None => {}
                }
            }

            resolver.resolve_subtree(node, document, cache).await?;

            let mut unmatched = self.store.load_children(node).await?;
            for child_document in document.child_documents() {
                let id = child_document.id.as_deref().unwrap_or_default();
                let child = resolver.get_node(node, id, cache).await?;
                unmatched.retain(|live| live != &child);
                self.apply_node(&child, child_document, cache).await?;
            }

            let path = self.store.path(node).await?;
            for change in self.changes_for(node, document).await? {
                debug!(
                    node_path = %path,
                    change_key = %change.key_string(),
                    kind = ?change.kind,
                    "dispatch change"
                );
                dispatch(&resolver, node, &change, cache).await?;
            }

            if document.children.is_some() {
                for stray in unmatched {
                    debug!(node_path = %path, "delete unmatched child");
                    self.store.delete_node(&stray).await?;
                }
            }
            Ok(())
        })
    }
}

/// Copy of `document` where every descendant without an `id` gets a fresh
/// `@id:` placeholder, so the node created for it can be found again.
fn with_placeholders(document: &StateDocument) -> StateDocument {
    fn fill(children: &mut [StateDocument]) {
        for child in children {
            if child.id.is_none() {
                child.id = Some(Selector::fresh_placeholder().to_string());
            }
            if let Some(grandchildren) = child.children.as_mut() {
                fill(grandchildren);
            }
        }
    }

    let mut document = document.clone();
    if let Some(children) = document.children.as_mut() {
        fill(children);
    }
    document
}

/// Drop changes that address a whole category or the implicit `base`
/// pointer's removal; a whole-category put becomes one put per entry.
fn normalize(changes: Vec<ChangeRecord>) -> Vec<ChangeRecord> {
    let mut normalized = Vec::with_capacity(changes.len());
    for change in changes {
        if change.key.len() >= 2 {
            let base_delete = change.kind == ChangeKind::Delete
                && change.field(0) == Some(Category::Pointers.key())
                && change.field(1) == Some("base");
            if !base_delete {
                normalized.push(change);
            }
            continue;
        }
        if let (ChangeKind::Put, Some(Value::Object(entries))) = (change.kind, &change.value) {
            for (name, value) in entries {
                let mut key = change.key.clone();
                key.push(KeySegment::Field(name.clone()));
                normalized.push(ChangeRecord::put(key, value.clone()));
            }
        }
    }
    normalized
}

/// Replace positional changes inside a set with a single put of the set's
/// full desired member list. Sets are reconciled as membership so that kept
/// members keep their member data.
fn collapse_set_changes(
    changes: Vec<ChangeRecord>,
    document: &StateDocument,
) -> Vec<ChangeRecord> {
    let mut collapsed = Vec::with_capacity(changes.len());
    let mut seen: Vec<String> = Vec::new();
    for change in changes {
        let positional = change.key.len() > 2 && change.field(0) == Some(Category::Sets.key());
        let set = change.field(1).filter(|_| positional).map(str::to_string);
        let Some(set) = set else {
            collapsed.push(change);
            continue;
        };
        if seen.contains(&set) {
            continue;
        }
        let members = document
            .sets
            .as_ref()
            .and_then(|sets| sets.get(&set))
            .cloned()
            .unwrap_or_default();
        collapsed.push(ChangeRecord::put(
            vec![
                KeySegment::Field(Category::Sets.key().to_string()),
                KeySegment::Field(set.clone()),
            ],
            Value::from(members),
        ));
        seen.push(set);
    }
    collapsed
}

fn priority(change: &ChangeRecord) -> Result<u8> {
    let delete = change.kind == ChangeKind::Delete;
    let rank = match change.category()? {
        Category::Attributes | Category::AttributeMeta | Category::Registry => return Ok(0),
        Category::PointerMeta => 1,
        Category::Pointers => 3,
        Category::Sets => 5,
        Category::MemberAttributes => 7,
        Category::MemberRegistry => 9,
    };
    Ok(if delete { rank } else { rank + 1 })
}

/// Sort changes into dispatch order. The sort is stable.
///
/// # Errors
///
/// `UnknownCategory` if any change has an unrecognized first key segment.
pub fn order_changes(changes: Vec<ChangeRecord>) -> Result<Vec<ChangeRecord>> {
    let mut ranked = changes
        .into_iter()
        .map(|change| priority(&change).map(|p| (p, change)))
        .collect::<Result<Vec<_>>>()?;
    ranked.sort_by_key(|(p, _)| *p);
    Ok(ranked.into_iter().map(|(_, change)| change).collect())
}
