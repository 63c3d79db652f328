//! Stat graph module.
//!
//! Provides the `StatGraph` type, the main entry point. It owns the
//! containment hierarchy, the arena of nodes and the catalog they are
//! built from, and drives the per-tick aggregation cycle.
//!
//! ## Update order
//!
//! `tick` updates nodes strictly bottom-up: every node settles after all
//! of the nodes beneath it. An ancestor therefore reads its descendants'
//! values from the same tick, however deep the composition is, and there
//! is no one-tick lag. `update_node` runs a single node's cycle and reads
//! whatever its descendants last settled to.

use crate::catalog::Catalog;
use crate::error::StatGraphError;
use crate::feature::Feature;
use crate::hierarchy::{Hierarchy, ObjectId};
use crate::modifier::ActivationPredicate;
use crate::name::Category;
use crate::node::{ModifierAdded, Node, NodeBehavior, NodeId};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, trace};

/// A tree of composable parts exposing aggregated features.
///
/// # Examples
///
/// ```rust
/// use std::sync::Arc;
/// use statgraph::{Catalog, CatalogFeatures, StatGraph};
///
/// let catalog = Catalog::from_json_str(r#"{
///     "feature_sets": {
///         "hero":  [{ "name": "Damage", "kind": "additive", "base_value": 10.0 }],
///         "sword": [{ "name": "Damage", "kind": "additive", "base_value": 5.0 }]
///     },
///     "modifiers": [
///         { "id": "rage", "feature_name": "Damage", "factor": 2.0,
///           "kind": "multiplicative", "duration": 3.0 }
///     ]
/// }"#).unwrap();
///
/// let mut graph = StatGraph::new(Arc::new(catalog));
/// let hero = graph.spawn_node("Character", Arc::new(CatalogFeatures::new("hero")), None).unwrap();
/// let hero_obj = graph.object_of(hero).unwrap();
/// let hand = graph.spawn_object(Some(hero_obj)).unwrap();
/// graph.spawn_node("Weapon", Arc::new(CatalogFeatures::new("sword")), Some(hand)).unwrap();
///
/// graph.grant_modifier(hero, "rage").unwrap();
/// graph.tick(0.016).unwrap();
///
/// let hero = graph.node(hero).unwrap();
/// assert_eq!(hero.feature_value("Damage", ""), Some(30.0)); // (10 + 5) * 2
/// ```
pub struct StatGraph {
    catalog: Arc<Catalog>,
    hierarchy: Hierarchy,
    nodes: HashMap<NodeId, Node>,
    objects: HashMap<NodeId, ObjectId>,
}

impl StatGraph {
    /// Create an empty graph reading from `catalog`.
    pub fn new(catalog: Arc<Catalog>) -> Self {
        Self {
            catalog,
            hierarchy: Hierarchy::new(),
            nodes: HashMap::new(),
            objects: HashMap::new(),
        }
    }

    /// Catalog nodes and modifiers are built from.
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Read-only view of the containment hierarchy.
    pub fn hierarchy(&self) -> &Hierarchy {
        &self.hierarchy
    }

    /// Spawn a transparent object, optionally under `parent`.
    pub fn spawn_object(&mut self, parent: Option<ObjectId>) -> Result<ObjectId, StatGraphError> {
        if let Some(parent) = parent {
            if !self.hierarchy.contains(parent) {
                return Err(StatGraphError::UnknownObject(parent));
            }
        }
        let object = self.hierarchy.spawn();
        if let Some(parent) = parent {
            self.hierarchy.attach(object, parent)?;
        }
        Ok(object)
    }

    /// Spawn an object hosting a new node, optionally under `parent`.
    ///
    /// The node's features are built first; if that fails nothing is
    /// added to the graph.
    pub fn spawn_node(
        &mut self,
        category: impl Into<Category>,
        behavior: Arc<dyn NodeBehavior>,
        parent: Option<ObjectId>,
    ) -> Result<NodeId, StatGraphError> {
        let node = Node::new(category, behavior, &self.catalog)?;
        let object = self.spawn_object(parent)?;
        self.insert(object, node)
    }

    /// Turn an existing transparent object into a node host.
    pub fn host_node(
        &mut self,
        object: ObjectId,
        category: impl Into<Category>,
        behavior: Arc<dyn NodeBehavior>,
    ) -> Result<NodeId, StatGraphError> {
        if !self.hierarchy.contains(object) {
            return Err(StatGraphError::UnknownObject(object));
        }
        if self.hierarchy.hosted(object).is_some() {
            return Err(StatGraphError::AlreadyHosted(object));
        }
        let node = Node::new(category, behavior, &self.catalog)?;
        self.insert(object, node)
    }

    fn insert(&mut self, object: ObjectId, node: Node) -> Result<NodeId, StatGraphError> {
        let id = node.id();
        self.hierarchy.host(object, id)?;
        debug!(node = %id, %object, category = %node.category(), "node spawned");
        self.objects.insert(id, object);
        self.nodes.insert(id, node);
        Ok(id)
    }

    /// Build a node that is not part of the graph, for use as a
    /// hypothetical part in [`features_with_hypothetical_nodes`](Self::features_with_hypothetical_nodes).
    pub fn build_detached_node(
        &self,
        category: impl Into<Category>,
        behavior: Arc<dyn NodeBehavior>,
    ) -> Result<Node, StatGraphError> {
        Node::new(category, behavior, &self.catalog)
    }

    /// Attach `child` under `parent` (equip, pick up).
    pub fn attach(&mut self, child: ObjectId, parent: ObjectId) -> Result<(), StatGraphError> {
        self.hierarchy.attach(child, parent)?;
        debug!(%child, %parent, "object attached");
        Ok(())
    }

    /// Detach `child` from its parent (unequip, drop).
    pub fn detach(&mut self, child: ObjectId) -> Result<Option<ObjectId>, StatGraphError> {
        let previous = self.hierarchy.detach(child)?;
        debug!(%child, "object detached");
        Ok(previous)
    }

    /// Remove an object, its subtree and every node hosted in it.
    pub fn despawn(&mut self, object: ObjectId) -> Result<(), StatGraphError> {
        for id in self.hierarchy.remove_subtree(object)? {
            self.nodes.remove(&id);
            self.objects.remove(&id);
            debug!(node = %id, "node despawned");
        }
        Ok(())
    }

    /// Object hosting `node`.
    pub fn object_of(&self, node: NodeId) -> Option<ObjectId> {
        self.objects.get(&node).copied()
    }

    /// Node hosted by `object`, if any.
    pub fn node_at(&self, object: ObjectId) -> Option<NodeId> {
        self.hierarchy.hosted(object)
    }

    /// Parent of `object`, or `None` for a root or stale handle.
    pub fn parent_of(&self, object: ObjectId) -> Option<ObjectId> {
        self.hierarchy.parent(object)
    }

    /// Direct children of `object` in attach order.
    pub fn children_of(&self, object: ObjectId) -> Vec<ObjectId> {
        self.hierarchy.children(object)
    }

    /// Borrow a node.
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    /// Borrow a node mutably.
    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(&id)
    }

    /// Like [`node`](Self::node), failing with `UnknownNode` for a stale handle.
    pub fn try_node(&self, id: NodeId) -> Result<&Node, StatGraphError> {
        self.nodes.get(&id).ok_or(StatGraphError::UnknownNode(id))
    }

    /// Like [`node_mut`](Self::node_mut), failing with `UnknownNode` for a stale handle.
    pub fn try_node_mut(&mut self, id: NodeId) -> Result<&mut Node, StatGraphError> {
        self.nodes.get_mut(&id).ok_or(StatGraphError::UnknownNode(id))
    }

    /// All node ids in ascending order.
    pub fn node_ids(&self) -> Vec<NodeId> {
        let mut ids: Vec<NodeId> = self.nodes.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Number of live nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the graph has no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Build a modifier from the catalog and add it to `node`.
    ///
    /// # Arguments
    ///
    /// * `node` - The node receiving the modifier
    /// * `id` - Catalog id of the modifier
    ///
    /// # Returns
    ///
    /// What `Node::add_modifier` did, `UnknownModifier` if the catalog has
    /// no such id, or `UnknownNode` for a stale handle.
    pub fn grant_modifier(&mut self, node: NodeId, id: &str) -> Result<ModifierAdded, StatGraphError> {
        let modifier = self.catalog.modifier(id)?;
        Ok(self.try_node_mut(node)?.add_modifier(modifier))
    }

    /// Like [`grant_modifier`](Self::grant_modifier), with an activation
    /// predicate attached.
    pub fn grant_modifier_with(
        &mut self,
        node: NodeId,
        id: &str,
        predicate: ActivationPredicate,
    ) -> Result<ModifierAdded, StatGraphError> {
        let modifier = self.catalog.modifier(id)?.with_shared_predicate(predicate);
        Ok(self.try_node_mut(node)?.add_modifier(modifier))
    }

    /// Nearest node along every branch beneath `node`, from the live
    /// hierarchy.
    pub fn discover(&self, node: NodeId) -> Result<Vec<NodeId>, StatGraphError> {
        let object = self.object_of(node).ok_or(StatGraphError::UnknownNode(node))?;
        Ok(self.hierarchy.discover(object))
    }

    /// First node with exactly this category among `node` itself followed
    /// by its discovered descendants.
    pub fn component_by_category(
        &self,
        node: NodeId,
        category: &str,
    ) -> Result<Option<NodeId>, StatGraphError> {
        let descendants = self.discover(node)?;
        Ok(std::iter::once(node)
            .chain(descendants)
            .find(|id| {
                self.nodes
                    .get(id)
                    .is_some_and(|n| n.category().as_str() == category)
            }))
    }

    fn lookup_all(&self, ids: &[NodeId]) -> Result<Vec<&Node>, StatGraphError> {
        ids.iter().map(|id| self.try_node(*id)).collect()
    }

    /// Run one node's full cycle: rediscover, aggregate, prune, apply,
    /// post-process.
    pub fn update_node(&mut self, id: NodeId, elapsed: f64) -> Result<(), StatGraphError> {
        let descendants = self.discover(id)?;
        let accumulators = {
            let node = self.try_node(id)?;
            let evaluated = self.lookup_all(&descendants)?;
            node.accumulators(&evaluated)
        };

        let node = self.try_node_mut(id)?;
        node.set_descendants(descendants);
        node.settle(&accumulators, elapsed);
        Ok(())
    }

    /// Update every node once, bottom-up.
    pub fn tick(&mut self, elapsed: f64) -> Result<(), StatGraphError> {
        let order = self.hierarchy.update_order()?;
        trace!(nodes = order.len(), elapsed, "tick");
        for id in order {
            self.update_node(id, elapsed)?;
        }
        Ok(())
    }

    /// Features `node` would have if the nodes in `extras` were attached
    /// beneath it. Nothing in the graph is modified.
    ///
    /// # Arguments
    ///
    /// * `node` - The node to evaluate
    /// * `extras` - Nodes in the graph (typically unattached) to treat as
    ///   additional descendants
    ///
    /// # Returns
    ///
    /// A copy of the node's features after a single simulated pass, or
    /// `UnknownNode` if any handle is stale.
    pub fn features_with_simulated_components(
        &self,
        node: NodeId,
        extras: &[NodeId],
    ) -> Result<Vec<Feature>, StatGraphError> {
        let extras = self.lookup_all(extras)?;
        self.features_with_hypothetical_nodes(node, &extras)
    }

    /// Same as [`features_with_simulated_components`](Self::features_with_simulated_components)
    /// for nodes that live outside the graph.
    ///
    /// Extras already hosted anywhere beneath `node` are skipped; they
    /// contribute through the live composition.
    pub fn features_with_hypothetical_nodes(
        &self,
        node: NodeId,
        extras: &[&Node],
    ) -> Result<Vec<Feature>, StatGraphError> {
        let target = self.try_node(node)?;
        let root = self.object_of(node).ok_or(StatGraphError::UnknownNode(node))?;
        let descendants = self.lookup_all(&self.hierarchy.discover(root))?;
        let extras: Vec<&Node> = extras
            .iter()
            .copied()
            .filter(|extra| match self.object_of(extra.id()) {
                Some(object) if self.hierarchy.is_ancestor(root, object) => {
                    debug!(node = %node, extra = %extra.id(), "extra already attached, skipped");
                    false
                }
                _ => true,
            })
            .collect();
        Ok(target.simulate(&descendants, &extras))
    }
}

impl std::fmt::Debug for StatGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StatGraph")
            .field("hierarchy", &self.hierarchy)
            .field("nodes", &self.node_ids())
            .finish_non_exhaustive()
    }
}
