use statex_core_types::{RequestId, TraceId};
use thiserror::Error;

/// Result type alias using StatexError
pub type Result<T> = std::result::Result<T, StatexError>;

// ========== Error Facility ==========

/// Canonical error kind taxonomy
///
/// Each kind maps to a stable error code usable for programmatic handling,
/// test assertions and CLI exit reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExErrorKind {
    // Resolution
    UnresolvableSelector,
    UnresolvableReferenceGroup,
    MissingPrototype,
    InvalidSelector,
    MetaInconsistent,
    NotFound,
    NoParent,

    // Change application
    UnsupportedShape,
    UnknownCategory,
    InvalidDocument,

    // Integration/IO
    InvalidInput,
    Io,
    Serialization,
    Persistence,

    // Internal
    Internal,
}

impl ExErrorKind {
    /// Get the stable error code for this kind
    pub fn code(&self) -> &'static str {
        match self {
            ExErrorKind::UnresolvableSelector => "ERR_UNRESOLVABLE_SELECTOR",
            ExErrorKind::UnresolvableReferenceGroup => "ERR_UNRESOLVABLE_REFERENCE_GROUP",
            ExErrorKind::MissingPrototype => "ERR_MISSING_PROTOTYPE",
            ExErrorKind::InvalidSelector => "ERR_INVALID_SELECTOR",
            ExErrorKind::MetaInconsistent => "ERR_META_INCONSISTENT",
            ExErrorKind::NotFound => "ERR_NOT_FOUND",
            ExErrorKind::NoParent => "ERR_NO_PARENT",
            ExErrorKind::UnsupportedShape => "ERR_UNSUPPORTED_SHAPE",
            ExErrorKind::UnknownCategory => "ERR_UNKNOWN_CATEGORY",
            ExErrorKind::InvalidDocument => "ERR_INVALID_DOCUMENT",
            ExErrorKind::InvalidInput => "ERR_INVALID_INPUT",
            ExErrorKind::Io => "ERR_IO",
            ExErrorKind::Serialization => "ERR_SERIALIZATION",
            ExErrorKind::Persistence => "ERR_PERSISTENCE",
            ExErrorKind::Internal => "ERR_INTERNAL",
        }
    }
}

/// Canonical structured error type
///
/// Carries a classification plus enough context (operation, node path,
/// selector, change key) to locate the failing element of a document.
#[derive(Debug, Clone)]
pub struct ExError {
    kind: ExErrorKind,
    op: Option<String>,
    node_path: Option<String>,
    selector: Option<String>,
    key: Option<String>,
    request_id: Option<RequestId>,
    trace_id: Option<TraceId>,
    message: String,
}

impl ExError {
    /// Create a new error with the specified kind
    pub fn new(kind: ExErrorKind) -> Self {
        Self {
            kind,
            op: None,
            node_path: None,
            selector: None,
            key: None,
            request_id: None,
            trace_id: None,
            message: String::new(),
        }
    }

    /// Add operation context
    pub fn with_op(mut self, op: impl Into<String>) -> Self {
        self.op = Some(op.into());
        self
    }

    /// Add the path of the node being reconciled
    pub fn with_node_path(mut self, path: impl Into<String>) -> Self {
        self.node_path = Some(path.into());
        self
    }

    /// Add the selector string that failed
    pub fn with_selector(mut self, selector: impl Into<String>) -> Self {
        self.selector = Some(selector.into());
        self
    }

    /// Add the offending change key (rendered as `a.b.0`)
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    pub fn with_request_id(mut self, request_id: RequestId) -> Self {
        self.request_id = Some(request_id);
        self
    }

    pub fn with_trace_id(mut self, trace_id: TraceId) -> Self {
        self.trace_id = Some(trace_id);
        self
    }

    /// Add custom message
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    pub fn kind(&self) -> ExErrorKind {
        self.kind
    }

    /// Get the stable error code
    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    pub fn op(&self) -> Option<&str> {
        self.op.as_deref()
    }

    pub fn node_path(&self) -> Option<&str> {
        self.node_path.as_deref()
    }

    pub fn selector(&self) -> Option<&str> {
        self.selector.as_deref()
    }

    pub fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    pub fn request_id(&self) -> Option<&RequestId> {
        self.request_id.as_ref()
    }

    pub fn trace_id(&self) -> Option<&TraceId> {
        self.trace_id.as_ref()
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for ExError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", self.code())?;
        if let Some(op) = &self.op {
            write!(f, " in operation '{}'", op)?;
        }
        if !self.message.is_empty() {
            write!(f, ": {}", self.message)?;
        }
        if let Some(path) = &self.node_path {
            write!(f, " (node: {})", path)?;
        }
        if let Some(selector) = &self.selector {
            write!(f, " (selector: {})", selector)?;
        }
        if let Some(key) = &self.key {
            write!(f, " (key: {})", key)?;
        }
        Ok(())
    }
}

impl std::error::Error for ExError {}

// ========== End Error Facility ==========

/// Error taxonomy for reconciliation and graph store operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StatexError {
    // ===== Resolution Errors =====
    /// A selector that must name a live node could not be matched
    #[error("Could not resolve {selector} to an existing node (scope: {scope_path})")]
    UnresolvableSelector { selector: String, scope_path: String },

    /// The fixed-point resolution loop stalled with work pending.
    /// Covers circular references and dangling ones alike.
    #[error("Cannot resolve all node selectors (circular references): {pending:?}")]
    UnresolvableReferenceGroup { pending: Vec<String> },

    /// A node must be created but the document names no usable prototype
    #[error("No base provided for {selector} under {parent_path}")]
    MissingPrototype {
        selector: String,
        parent_path: String,
    },

    /// Selector string does not follow the selector grammar
    #[error("Invalid selector {selector:?}: {reason}")]
    InvalidSelector { selector: String, reason: String },

    /// A node registered as meta could not be found through the meta lookup
    #[error("New node {node_path} not in the meta (selector {selector})")]
    MetaInconsistent { node_path: String, selector: String },

    /// Node not present in the graph
    #[error("Node not found: {node_path}")]
    NodeNotFound { node_path: String },

    /// Operation requires a parent but the node is the project root
    #[error("Cannot resolve selector {selector}: node {node_path} has no parent")]
    NoParent { selector: String, node_path: String },

    // ===== Change Application Errors =====
    /// A flat category received a nested key
    #[error("Complex {category} values not currently supported: {key}")]
    UnsupportedShape { category: String, key: String },

    /// First key segment does not name a change category
    #[error("Unrecognized key {key}")]
    UnknownCategory { key: String },

    /// A change value or document field has the wrong shape
    #[error("Invalid document at {key}: {reason}")]
    InvalidDocument { key: String, reason: String },

    // ===== Generic Errors =====
    /// Serialization error (JSON/YAML encoding/decoding)
    #[error("Serialization error: {message}")]
    Serialization { message: String },

    /// Underlying store or file I/O failed
    #[error("I/O error: {message}")]
    Io { message: String },

    /// Generic internal error
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl From<serde_json::Error> for StatexError {
    fn from(err: serde_json::Error) -> Self {
        StatexError::Serialization {
            message: err.to_string(),
        }
    }
}

/// Conversion from StatexError to the canonical ExError
impl From<StatexError> for ExError {
    fn from(err: StatexError) -> Self {
        let message = err.to_string();
        match err {
            StatexError::UnresolvableSelector {
                selector,
                scope_path,
            } => ExError::new(ExErrorKind::UnresolvableSelector)
                .with_selector(selector)
                .with_node_path(scope_path)
                .with_message(message),

            StatexError::UnresolvableReferenceGroup { .. } => {
                ExError::new(ExErrorKind::UnresolvableReferenceGroup)
                    .with_op("resolve_selectors")
                    .with_message(message)
            }

            StatexError::MissingPrototype {
                selector,
                parent_path,
            } => ExError::new(ExErrorKind::MissingPrototype)
                .with_op("create_node")
                .with_selector(selector)
                .with_node_path(parent_path)
                .with_message(message),

            StatexError::InvalidSelector { selector, .. } => {
                ExError::new(ExErrorKind::InvalidSelector)
                    .with_op("parse_selector")
                    .with_selector(selector)
                    .with_message(message)
            }

            StatexError::MetaInconsistent {
                node_path,
                selector,
            } => ExError::new(ExErrorKind::MetaInconsistent)
                .with_op("create_node")
                .with_node_path(node_path)
                .with_selector(selector)
                .with_message(message),

            StatexError::NodeNotFound { node_path } => ExError::new(ExErrorKind::NotFound)
                .with_node_path(node_path)
                .with_message(message),

            StatexError::NoParent {
                selector,
                node_path,
            } => ExError::new(ExErrorKind::NoParent)
                .with_selector(selector)
                .with_node_path(node_path)
                .with_message(message),

            StatexError::UnsupportedShape { key, .. } => {
                ExError::new(ExErrorKind::UnsupportedShape)
                    .with_op("dispatch_change")
                    .with_key(key)
                    .with_message(message)
            }

            StatexError::UnknownCategory { key } => ExError::new(ExErrorKind::UnknownCategory)
                .with_op("dispatch_change")
                .with_key(key)
                .with_message(message),

            StatexError::InvalidDocument { key, .. } => {
                ExError::new(ExErrorKind::InvalidDocument)
                    .with_key(key)
                    .with_message(message)
            }

            StatexError::Serialization { .. } => {
                ExError::new(ExErrorKind::Serialization).with_message(message)
            }

            StatexError::Io { .. } => ExError::new(ExErrorKind::Io).with_message(message),

            StatexError::Internal { .. } => {
                ExError::new(ExErrorKind::Internal).with_message(message)
            }
        }
    }
}
