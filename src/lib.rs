//! # statgraph - Composable Stat Aggregation for Game Parts
//!
//! A stat engine for characters built out of parts (body, weapons,
//! armor, consumables) that provides:
//! - **Aggregated features**: each part exposes named numeric features
//!   that its ancestors fold in, additively or multiplicatively
//! - **Timed modifiers**: buffs and debuffs with durations, refresh-not-stack
//!   re-application and optional activation conditions
//! - **Live composition**: parts can be attached and detached between
//!   ticks; descendants are rediscovered every cycle
//! - **What-if queries**: evaluate a node with hypothetical parts without
//!   touching live state
//!
//! ## Core Concepts
//!
//! ### Aggregation Cycle
//!
//! Every tick, each node runs:
//!
//! ```text
//! [Rediscover] → [Aggregate] → [Prune] → [Apply] → [Post-process]
//! ```
//!
//! 1. **Rediscover** finds the nearest node along every branch of the hierarchy
//! 2. **Aggregate** recomputes each feature from its base value and matching descendant features
//! 3. **Prune** drops expired modifiers
//! 4. **Apply** runs the remaining modifiers in insertion order
//! 5. **Post-process** maps the final values onto engine effects
//!
//! Nodes are updated bottom-up, so ancestors always see same-tick values.
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use statgraph::*;
//!
//! let mut graph = StatGraph::new(Arc::new(Catalog::new()));
//!
//! let hero = graph
//!     .spawn_node("Character", Arc::new(StaticFeatures(vec![
//!         Feature::new("Damage", "", AggregationKind::Additive, 10.0),
//!     ])), None)
//!     .unwrap();
//! let sword = graph
//!     .spawn_node("Weapon", Arc::new(StaticFeatures(vec![
//!         Feature::new("Damage", "", AggregationKind::Additive, 5.0),
//!     ])), graph.object_of(hero))
//!     .unwrap();
//!
//! graph.tick(0.0).unwrap();
//! assert_eq!(graph.node(hero).unwrap().feature_value("Damage", ""), Some(15.0));
//!
//! // Unequip the sword.
//! graph.detach(graph.object_of(sword).unwrap()).unwrap();
//! graph.tick(0.0).unwrap();
//! assert_eq!(graph.node(hero).unwrap().feature_value("Damage", ""), Some(10.0));
//! ```
//!
//! ## Modules
//!
//! - [`kind`] - Additive / multiplicative algebra
//! - [`name`] - Feature names and categories
//! - [`feature`] - Features
//! - [`modifier`] - Modifiers
//! - [`catalog`] - Static feature-set and modifier data
//! - [`hierarchy`] - Containment hierarchy and descendant discovery
//! - [`node`] - Nodes and the per-node cycle
//! - [`effects`] - Post-process outputs
//! - [`graph`] - The stat graph
//! - [`error`] - Error types

pub mod catalog;
pub mod effects;
pub mod error;
pub mod feature;
pub mod graph;
pub mod hierarchy;
pub mod kind;
pub mod modifier;
pub mod name;
pub mod node;

// Re-export main types for convenience
pub use catalog::Catalog;
pub use effects::EngineEffects;
pub use error::StatGraphError;
pub use feature::{Feature, FeatureDef};
pub use graph::StatGraph;
pub use hierarchy::{Hierarchy, ObjectId};
pub use kind::AggregationKind;
pub use modifier::{ActivationPredicate, Modifier, ModifierDef};
pub use name::{Category, FeatureName};
pub use node::{CatalogFeatures, ModifierAdded, Node, NodeBehavior, NodeId, StaticFeatures};
