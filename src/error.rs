//! Error types for the stat graph.
//!
//! All fallible operations return `StatGraphError`. Lookups that are
//! expected to miss during normal play (`Node::get_feature`,
//! `Node::get_modifier_by_id`) return `Option` instead.

use crate::hierarchy::ObjectId;
use crate::node::NodeId;
use thiserror::Error;

/// Format a feature selector for display.
fn format_selector(name: &str, category: &str) -> String {
    if category.is_empty() {
        String::from(name)
    } else {
        format!("{}/{}", category, name)
    }
}

/// Errors that can occur while loading catalog data, building nodes or
/// mutating the hierarchy.
///
/// # Examples
///
/// ```rust
/// use statgraph::StatGraphError;
///
/// let err = StatGraphError::UnknownModifier("haste".into());
/// assert_eq!(err.to_string(), "Unknown modifier: haste");
/// ```
#[derive(Debug, Error, Clone, PartialEq)]
pub enum StatGraphError {
    /// No modifier with this id exists in the catalog.
    #[error("Unknown modifier: {0}")]
    UnknownModifier(String),

    /// No feature set with this key exists in the catalog.
    #[error("Unknown feature set: {0}")]
    UnknownFeatureSet(String),

    /// A node does not own a feature matching the selector.
    #[error("Missing feature: {}", format_selector(.name, .category))]
    MissingFeature { name: String, category: String },

    /// The node handle does not refer to a live node.
    #[error("Unknown node: {0}")]
    UnknownNode(NodeId),

    /// The object handle does not refer to a live object.
    #[error("Unknown object: {0}")]
    UnknownObject(ObjectId),

    /// An aggregation kind string was not recognized at load time.
    #[error("Invalid aggregation kind: {0:?}")]
    InvalidKind(String),

    /// The catalog document could not be read or parsed.
    #[error("Invalid catalog: {0}")]
    Catalog(String),

    /// Attaching `child` under `parent` would make `child` its own ancestor.
    #[error("Attaching {child} under {parent} would create a cycle")]
    HierarchyCycle { parent: ObjectId, child: ObjectId },

    /// The object already hosts a node.
    #[error("Object {0} already hosts a node")]
    AlreadyHosted(ObjectId),
}

impl From<serde_json::Error> for StatGraphError {
    fn from(err: serde_json::Error) -> Self {
        StatGraphError::Catalog(err.to_string())
    }
}

impl From<std::io::Error> for StatGraphError {
    fn from(err: std::io::Error) -> Self {
        StatGraphError::Catalog(err.to_string())
    }
}
