//! Selector resolution, node creation and the subtree fixed point

use super::config::ImporterConfig;
use crate::errors::{Result, StatexError};
use crate::graph::GraphStore;
use crate::model::{Selector, StateDocument};
use serde_json::Value;
use std::collections::HashMap;
use tracing::trace;

/// Selector identities resolved during one `apply`
///
/// Absolute selectors are keyed by their canonical string; attribute
/// selectors by `<parent path>:<selector>`. An identity, once recorded, is
/// never searched for again.
#[derive(Debug)]
pub struct ResolutionCache<N> {
    entries: HashMap<String, N>,
}

impl<N> Default for ResolutionCache<N> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }
}

impl<N: Clone> ResolutionCache<N> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, identity: &str) -> Option<&N> {
        self.entries.get(identity)
    }

    /// Record a resolution; an existing entry wins
    pub fn record(&mut self, identity: String, node: N) {
        self.entries.entry(identity).or_insert(node);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Cache identity of `selector` when looked up from `parent_path`
pub fn identity(selector: &Selector, parent_path: &str) -> String {
    if selector.is_absolute() {
        selector.to_string()
    } else {
        format!("{}:{}", parent_path, selector)
    }
}

/// Resolves selectors against a store and creates nodes for those that
/// have no live target.
pub struct Resolver<'a, S: GraphStore> {
    store: &'a S,
    root: &'a S::Node,
    config: &'a ImporterConfig,
}

impl<'a, S: GraphStore> Resolver<'a, S> {
    pub fn new(store: &'a S, root: &'a S::Node, config: &'a ImporterConfig) -> Self {
        Self {
            store,
            root,
            config,
        }
    }

    pub fn store(&self) -> &'a S {
        self.store
    }

    /// Resolve `selector` as seen from `parent`: cache first, then search.
    ///
    /// Placeholders never search. A successful search is recorded.
    ///
    /// # Errors
    ///
    /// Propagates store failures.
    pub async fn find(
        &self,
        selector: &Selector,
        parent: &S::Node,
        cache: &mut ResolutionCache<S::Node>,
    ) -> Result<Option<S::Node>> {
        let parent_path = self.store.path(parent).await?;
        let key = identity(selector, &parent_path);
        if let Some(node) = cache.get(&key) {
            return Ok(Some(node.clone()));
        }
        let found = self.search(selector, parent).await?;
        if let Some(node) = &found {
            cache.record(key, node.clone());
        }
        Ok(found)
    }

    /// Like [`find`](Self::find) but for a selector string, failing when
    /// nothing matches.
    ///
    /// # Errors
    ///
    /// `InvalidSelector` for a malformed string, `UnresolvableSelector` when
    /// no node matches.
    pub async fn get_node(
        &self,
        scope: &S::Node,
        selector: &str,
        cache: &mut ResolutionCache<S::Node>,
    ) -> Result<S::Node> {
        let parsed = Selector::parse(selector)?;
        match self.find(&parsed, scope, cache).await? {
            Some(node) => Ok(node),
            None => Err(StatexError::UnresolvableSelector {
                selector: selector.to_string(),
                scope_path: self.store.path(scope).await?,
            }),
        }
    }

    /// Search the store for `selector` without consulting any cache.
    ///
    /// # Errors
    ///
    /// Propagates store failures.
    pub async fn search(&self, selector: &Selector, parent: &S::Node) -> Result<Option<S::Node>> {
        match selector {
            Selector::Path(path) => self.store.load_by_path(path).await,
            Selector::Guid(guid) => self.search_guid(guid).await,
            Selector::Meta(name) => {
                for candidate in self.store.meta_nodes().await? {
                    let value = self
                        .store
                        .attribute(&candidate, &self.config.name_attribute)
                        .await?;
                    if value_matches(value.as_ref(), name) {
                        return Ok(Some(candidate));
                    }
                }
                Ok(None)
            }
            Selector::Attribute { name, value } => {
                for child in self.store.load_children(parent).await? {
                    let actual = self.store.attribute(&child, name).await?;
                    if value_matches(actual.as_ref(), value) {
                        return Ok(Some(child));
                    }
                }
                Ok(None)
            }
            Selector::Placeholder(_) => Ok(None),
        }
    }

    /// Depth-first from the root, first match wins
    async fn search_guid(&self, guid: &str) -> Result<Option<S::Node>> {
        let mut stack = vec![self.root.clone()];
        while let Some(node) = stack.pop() {
            if self.store.guid(&node).await? == guid {
                return Ok(Some(node));
            }
            let mut children = self.store.load_children(&node).await?;
            children.reverse();
            stack.extend(children);
        }
        Ok(None)
    }

    /// Create the node `document` describes under `parent` and record it.
    ///
    /// Returns `None` when the document's base selector does not resolve
    /// yet; the fixed point retries it on a later pass.
    ///
    /// # Errors
    ///
    /// `MissingPrototype` when no prototype can be determined,
    /// `MetaInconsistent` when a fresh `@meta:` node is not found by the meta
    /// lookup after registration.
    pub async fn create_and_register(
        &self,
        parent: &S::Node,
        document: &StateDocument,
        selector: &Selector,
        cache: &mut ResolutionCache<S::Node>,
    ) -> Result<Option<S::Node>> {
        let parent_path = self.store.path(parent).await?;

        let base = match document.base() {
            Some(base) => {
                let base_selector = Selector::parse(base)?;
                match self.find(&base_selector, parent, cache).await? {
                    Some(node) => node,
                    None => return Ok(None),
                }
            }
            None if self.config.require_explicit_base
                && document.pointers.is_some()
                && !matches!(selector, Selector::Placeholder(_)) =>
            {
                return Err(StatexError::MissingPrototype {
                    selector: selector.to_string(),
                    parent_path,
                });
            }
            None => self
                .store
                .load_by_path(&self.config.default_base_path)
                .await?
                .ok_or_else(|| StatexError::MissingPrototype {
                    selector: selector.to_string(),
                    parent_path: parent_path.clone(),
                })?,
        };

        let node = self.store.create_node(parent, &base).await?;
        self.prepare(&node, selector).await?;
        cache.record(identity(selector, &parent_path), node.clone());
        Ok(Some(node))
    }

    /// Make a fresh node answer its own selector
    async fn prepare(&self, node: &S::Node, selector: &Selector) -> Result<()> {
        match selector {
            Selector::Attribute { name, value } => {
                self.store
                    .set_attribute(node, name, Value::String(value.clone()))
                    .await
            }
            Selector::Meta(name) => {
                self.store
                    .set_attribute(node, &self.config.name_attribute, Value::String(name.clone()))
                    .await?;
                self.store
                    .add_member(self.root, &self.config.meta_set_name, node)
                    .await?;
                if self.store.meta_nodes().await?.contains(node) {
                    Ok(())
                } else {
                    Err(StatexError::MetaInconsistent {
                        node_path: self.store.path(node).await?,
                        selector: selector.to_string(),
                    })
                }
            }
            Selector::Path(_) | Selector::Guid(_) | Selector::Placeholder(_) => Ok(()),
        }
    }

    /// Resolve or create every document below `document`, whose node is
    /// `node`.
    ///
    /// Works through `(document, parent)` pairs in document order. A resolved
    /// pair is replaced by its own children; unresolved pairs wait for the
    /// next pass. Stops when the list is empty or a pass resolves nothing.
    ///
    /// # Errors
    ///
    /// `UnresolvableReferenceGroup` listing the stuck selectors when a pass
    /// makes no progress.
    pub async fn resolve_subtree(
        &self,
        node: &S::Node,
        document: &StateDocument,
        cache: &mut ResolutionCache<S::Node>,
    ) -> Result<()> {
        let mut pending: Vec<(&StateDocument, S::Node)> = document
            .child_documents()
            .iter()
            .map(|child| (child, node.clone()))
            .collect();
        let mut pass = 0usize;

        while !pending.is_empty() {
            pass += 1;
            let mut progressed = false;
            let mut next = Vec::with_capacity(pending.len());

            for (child, parent) in pending {
                match self.resolve_one(child, &parent, cache).await? {
                    Some(resolved) => {
                        progressed = true;
                        next.extend(
                            child
                                .child_documents()
                                .iter()
                                .map(|grandchild| (grandchild, resolved.clone())),
                        );
                    }
                    None => next.push((child, parent)),
                }
            }

            trace!(pass, pending = next.len(), progressed, "selector resolution pass");

            if !progressed {
                return Err(StatexError::UnresolvableReferenceGroup {
                    pending: next
                        .iter()
                        .map(|(doc, _)| doc.id.clone().unwrap_or_default())
                        .collect(),
                });
            }
            pending = next;
        }
        Ok(())
    }

    async fn resolve_one(
        &self,
        document: &StateDocument,
        parent: &S::Node,
        cache: &mut ResolutionCache<S::Node>,
    ) -> Result<Option<S::Node>> {
        let selector = match document.id.as_deref() {
            Some(id) => Selector::parse(id)?,
            None => {
                return Err(StatexError::InvalidDocument {
                    key: "id".to_string(),
                    reason: "child document has no id".to_string(),
                })
            }
        };
        if let Some(node) = self.find(&selector, parent, cache).await? {
            return Ok(Some(node));
        }
        self.create_and_register(parent, document, &selector, cache)
            .await
    }
}

fn value_matches(actual: Option<&Value>, expected: &str) -> bool {
    match actual {
        Some(Value::String(s)) => s == expected,
        Some(other) => other.to_string() == expected,
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::MemoryGraph;
    use serde_json::json;

    struct Fixture {
        graph: MemoryGraph,
        config: ImporterConfig,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                graph: MemoryGraph::new(),
                config: ImporterConfig::default(),
            }
        }
    }

    #[tokio::test]
    async fn test_meta_lookup_matches_name() {
        let fx = Fixture::new();
        let root = fx.graph.root().await.unwrap();
        let resolver = Resolver::new(&fx.graph, &root, &fx.config);

        let found = resolver
            .search(&Selector::Meta("FCO".to_string()), &root)
            .await
            .unwrap();
        assert_eq!(found, Some(MemoryGraph::node("/1")));
    }

    #[tokio::test]
    async fn test_guid_lookup_walks_tree() {
        let fx = Fixture::new();
        let root = fx.graph.root().await.unwrap();
        let fco = MemoryGraph::node("/1");
        let a = fx.graph.create_node(&root, &fco).await.unwrap();
        let b = fx.graph.create_node(&a, &fco).await.unwrap();
        let guid = fx.graph.guid(&b).await.unwrap();

        let resolver = Resolver::new(&fx.graph, &root, &fx.config);
        let found = resolver.search(&Selector::Guid(guid), &root).await.unwrap();
        assert_eq!(found, Some(b));
    }

    #[tokio::test]
    async fn test_attribute_lookup_is_scoped_to_parent() {
        let fx = Fixture::new();
        let root = fx.graph.root().await.unwrap();
        let fco = MemoryGraph::node("/1");
        let a = fx.graph.create_node(&root, &fco).await.unwrap();
        let nested = fx.graph.create_node(&a, &fco).await.unwrap();
        fx.graph.set_attribute(&nested, "name", json!("R1")).await.unwrap();

        let resolver = Resolver::new(&fx.graph, &root, &fx.config);
        let selector = Selector::parse("@name:R1").unwrap();
        assert_eq!(resolver.search(&selector, &root).await.unwrap(), None);
        assert_eq!(resolver.search(&selector, &a).await.unwrap(), Some(nested));
    }

    #[tokio::test]
    async fn test_placeholder_only_resolves_from_cache() {
        let fx = Fixture::new();
        let root = fx.graph.root().await.unwrap();
        let resolver = Resolver::new(&fx.graph, &root, &fx.config);
        let mut cache = ResolutionCache::new();
        let selector = Selector::parse("@id:tmp").unwrap();

        assert_eq!(resolver.find(&selector, &root, &mut cache).await.unwrap(), None);

        cache.record(identity(&selector, ""), MemoryGraph::node("/1"));
        assert_eq!(
            resolver.find(&selector, &root, &mut cache).await.unwrap(),
            Some(MemoryGraph::node("/1"))
        );
    }

    #[tokio::test]
    async fn test_create_meta_node_registers_it() {
        let fx = Fixture::new();
        let root = fx.graph.root().await.unwrap();
        let resolver = Resolver::new(&fx.graph, &root, &fx.config);
        let mut cache = ResolutionCache::new();
        let selector = Selector::parse("@meta:Pin").unwrap();
        let doc = StateDocument::with_id("@meta:Pin");

        let node = resolver
            .create_and_register(&root, &doc, &selector, &mut cache)
            .await
            .unwrap()
            .unwrap();

        assert!(fx.graph.meta_nodes().await.unwrap().contains(&node));
        assert_eq!(cache.get("@meta:Pin"), Some(&node));
        assert_eq!(
            fx.graph.pointer_path(&node, "base").await.unwrap().as_deref(),
            Some("/1")
        );
    }

    #[tokio::test]
    async fn test_meta_registration_in_wrong_set_is_inconsistent() {
        let fx = Fixture {
            graph: MemoryGraph::new(),
            config: ImporterConfig {
                meta_set_name: "Elsewhere".to_string(),
                ..ImporterConfig::default()
            },
        };
        let root = fx.graph.root().await.unwrap();
        let resolver = Resolver::new(&fx.graph, &root, &fx.config);
        let mut cache = ResolutionCache::new();
        let selector = Selector::parse("@meta:Pin").unwrap();

        let err = resolver
            .create_and_register(&root, &StateDocument::new(), &selector, &mut cache)
            .await
            .unwrap_err();
        assert!(matches!(err, StatexError::MetaInconsistent { .. }));
    }

    #[tokio::test]
    async fn test_strict_base_rejects_pointers_without_base() {
        let fx = Fixture {
            graph: MemoryGraph::new(),
            config: ImporterConfig {
                require_explicit_base: true,
                ..ImporterConfig::default()
            },
        };
        let root = fx.graph.root().await.unwrap();
        let resolver = Resolver::new(&fx.graph, &root, &fx.config);
        let mut cache = ResolutionCache::new();
        let doc = StateDocument::with_id("@meta:X").pointer("p", "/1");
        let selector = Selector::parse("@meta:X").unwrap();

        let err = resolver
            .create_and_register(&root, &doc, &selector, &mut cache)
            .await
            .unwrap_err();
        assert!(matches!(err, StatexError::MissingPrototype { .. }));
    }

    #[tokio::test]
    async fn test_unresolved_base_defers_creation() {
        let fx = Fixture::new();
        let root = fx.graph.root().await.unwrap();
        let resolver = Resolver::new(&fx.graph, &root, &fx.config);
        let mut cache = ResolutionCache::new();
        let doc = StateDocument::with_id("@id:a").pointer("base", "@id:b");
        let selector = Selector::parse("@id:a").unwrap();

        let created = resolver
            .create_and_register(&root, &doc, &selector, &mut cache)
            .await
            .unwrap();
        assert!(created.is_none());
        assert!(cache.is_empty());
    }
}
