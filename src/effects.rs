//! Engine-facing outputs of the post-aggregation hook.
//!
//! After a node's features settle, its behavior translates them into
//! engine effects (a rigid-body mass, an attack cooldown, ...). The stat
//! graph does not interpret these values; it stores them per node for
//! collaborators to read, and never feeds them back into aggregation.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Named scalar outputs written by `NodeBehavior::post_process`.
///
/// # Examples
///
/// ```rust
/// use statgraph::EngineEffects;
///
/// let mut effects = EngineEffects::new();
/// effects.set("mass", 82.5);
/// effects.set("cooldown", 0.8);
///
/// assert_eq!(effects.get("mass"), Some(82.5));
/// assert_eq!(effects.get("missing"), None);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineEffects {
    values: BTreeMap<String, f64>,
}

impl EngineEffects {
    /// Create an empty set of effects.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `key`, replacing any previous value.
    pub fn set(&mut self, key: impl Into<String>, value: f64) {
        self.values.insert(key.into(), value);
    }

    /// Value written for `key`, if any.
    pub fn get(&self, key: &str) -> Option<f64> {
        self.values.get(key).copied()
    }

    /// Whether `key` was written.
    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Remove every entry.
    pub fn clear(&mut self) {
        self.values.clear();
    }

    /// Whether no effect has been written.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.values.iter().map(|(k, v)| (k.as_str(), *v))
    }
}
