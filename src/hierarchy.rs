//! Containment hierarchy module.
//!
//! Provides the `Hierarchy` type, the structural tree of game objects
//! (a character, its hands, the sword in a hand, a gem in the sword).
//! Some objects host a stat node; the rest are transparent containers.
//! The stat graph only reads this tree: descendant discovery and update
//! order are both derived from it on demand, never cached.

use crate::error::StatGraphError;
use crate::node::NodeId;
use petgraph::algo::{has_path_connecting, toposort};
use petgraph::stable_graph::{NodeIndex, StableDiGraph};
use petgraph::visit::{Dfs, EdgeRef};
use petgraph::Direction;
use std::fmt;

/// Handle to an object in the hierarchy.
///
/// Graph indices are recycled after removal, so a handle also carries the
/// generation of the object it was issued for. A handle to a removed
/// object never resolves to whatever was spawned into its slot later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId {
    index: NodeIndex,
    generation: u32,
}

impl ObjectId {
    /// Slot index in the underlying graph.
    pub fn index(self) -> usize {
        self.index.index()
    }

    /// Spawn generation this handle was issued for.
    pub fn generation(self) -> u32 {
        self.generation
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "object#{}v{}", self.index.index(), self.generation)
    }
}

#[derive(Debug)]
struct Slot {
    generation: u32,
    node: Option<NodeId>,
}

/// A forest of objects. Edges point from parent to child and carry the
/// attach sequence number, so children are always visited in the order
/// they were attached.
///
/// # Examples
///
/// ```rust
/// use statgraph::hierarchy::Hierarchy;
///
/// let mut hierarchy = Hierarchy::new();
/// let body = hierarchy.spawn();
/// let hand = hierarchy.spawn();
/// hierarchy.attach(hand, body).unwrap();
///
/// assert_eq!(hierarchy.parent(hand), Some(body));
/// assert_eq!(hierarchy.children(body), vec![hand]);
///
/// // A parent cannot be attached under its own child.
/// assert!(hierarchy.attach(body, hand).is_err());
/// ```
#[derive(Debug, Default)]
pub struct Hierarchy {
    graph: StableDiGraph<Slot, u64>,
    next_seq: u64,
    next_generation: u32,
}

impl Hierarchy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a detached, transparent object.
    pub fn spawn(&mut self) -> ObjectId {
        let generation = self.next_generation;
        self.next_generation = self.next_generation.wrapping_add(1);
        let index = self.graph.add_node(Slot {
            generation,
            node: None,
        });
        ObjectId { index, generation }
    }

    /// Whether `object` is live. Handles to removed objects are rejected
    /// even when their slot has been reused.
    pub fn contains(&self, object: ObjectId) -> bool {
        self.slot(object).is_some()
    }

    fn slot(&self, object: ObjectId) -> Option<&Slot> {
        self.graph
            .node_weight(object.index)
            .filter(|slot| slot.generation == object.generation)
    }

    fn object_at(&self, index: NodeIndex) -> ObjectId {
        ObjectId {
            index,
            generation: self.graph[index].generation,
        }
    }

    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    fn check(&self, object: ObjectId) -> Result<(), StatGraphError> {
        if self.contains(object) {
            Ok(())
        } else {
            Err(StatGraphError::UnknownObject(object))
        }
    }

    /// Make `object` host `node`. An object hosts at most one node.
    pub fn host(&mut self, object: ObjectId, node: NodeId) -> Result<(), StatGraphError> {
        let slot = self
            .graph
            .node_weight_mut(object.index)
            .filter(|slot| slot.generation == object.generation)
            .ok_or(StatGraphError::UnknownObject(object))?;
        if slot.node.is_some() {
            return Err(StatGraphError::AlreadyHosted(object));
        }
        slot.node = Some(node);
        Ok(())
    }

    /// The node hosted by `object`, if any.
    pub fn hosted(&self, object: ObjectId) -> Option<NodeId> {
        self.slot(object).and_then(|slot| slot.node)
    }

    pub fn parent(&self, object: ObjectId) -> Option<ObjectId> {
        if !self.contains(object) {
            return None;
        }
        self.graph
            .neighbors_directed(object.index, Direction::Incoming)
            .next()
            .map(|idx| self.object_at(idx))
    }

    /// Direct children in attach order.
    pub fn children(&self, object: ObjectId) -> Vec<ObjectId> {
        if !self.contains(object) {
            return Vec::new();
        }
        let mut edges: Vec<(u64, NodeIndex)> = self
            .graph
            .edges_directed(object.index, Direction::Outgoing)
            .map(|edge| (*edge.weight(), edge.target()))
            .collect();
        edges.sort_unstable_by_key(|(seq, _)| *seq);
        edges.into_iter().map(|(_, idx)| self.object_at(idx)).collect()
    }

    /// Attach `child` under `parent`, detaching it from its previous
    /// parent first.
    ///
    /// Fails with `HierarchyCycle` if `child` is `parent` or one of its
    /// ancestors.
    pub fn attach(&mut self, child: ObjectId, parent: ObjectId) -> Result<(), StatGraphError> {
        self.check(child)?;
        self.check(parent)?;
        if child == parent || self.is_ancestor(child, parent) {
            return Err(StatGraphError::HierarchyCycle { parent, child });
        }
        self.detach(child)?;
        let seq = self.next_seq;
        self.next_seq += 1;
        self.graph.add_edge(parent.index, child.index, seq);
        Ok(())
    }

    /// Detach `child` from its parent. Returns the previous parent.
    pub fn detach(&mut self, child: ObjectId) -> Result<Option<ObjectId>, StatGraphError> {
        self.check(child)?;
        let incoming: Vec<_> = self
            .graph
            .edges_directed(child.index, Direction::Incoming)
            .map(|edge| (edge.id(), edge.source()))
            .collect();
        let mut previous = None;
        for (edge, source) in incoming {
            self.graph.remove_edge(edge);
            previous = Some(self.object_at(source));
        }
        Ok(previous)
    }

    /// Whether `descendant` sits somewhere beneath `ancestor`. An object
    /// is not its own ancestor.
    pub fn is_ancestor(&self, ancestor: ObjectId, descendant: ObjectId) -> bool {
        ancestor != descendant
            && self.contains(ancestor)
            && self.contains(descendant)
            && has_path_connecting(&self.graph, ancestor.index, descendant.index, None)
    }

    /// Remove `object` and everything beneath it. Returns the nodes that
    /// were hosted in the removed subtree.
    pub fn remove_subtree(&mut self, object: ObjectId) -> Result<Vec<NodeId>, StatGraphError> {
        self.check(object)?;
        let mut doomed = Vec::new();
        let mut dfs = Dfs::new(&self.graph, object.index);
        while let Some(idx) = dfs.next(&self.graph) {
            doomed.push(idx);
        }

        let mut hosted = Vec::new();
        for idx in doomed {
            if let Some(slot) = self.graph.remove_node(idx) {
                hosted.extend(slot.node);
            }
        }
        Ok(hosted)
    }

    /// Nearest hosting node along every branch beneath `root`.
    ///
    /// Transparent objects are looked through; the first object that
    /// hosts a node is collected and its subtree is not entered. `root`
    /// itself is not part of the result.
    pub fn discover(&self, root: ObjectId) -> Vec<NodeId> {
        let mut found = Vec::new();
        if self.contains(root) {
            self.discover_into(root, &mut found);
        }
        found
    }

    fn discover_into(&self, object: ObjectId, found: &mut Vec<NodeId>) {
        for child in self.children(object) {
            match self.hosted(child) {
                Some(node) => found.push(node),
                None => self.discover_into(child, found),
            }
        }
    }

    /// Hosted nodes ordered so that every node comes after all of the
    /// nodes beneath it.
    pub fn update_order(&self) -> Result<Vec<NodeId>, StatGraphError> {
        match toposort(&self.graph, None) {
            Ok(indices) => Ok(indices
                .into_iter()
                .rev()
                .filter_map(|idx| self.graph[idx].node)
                .collect()),
            Err(cycle) => {
                // attach() rejects cycles, so this means the graph was corrupted
                let object = self.object_at(cycle.node_id());
                Err(StatGraphError::HierarchyCycle {
                    parent: object,
                    child: object,
                })
            }
        }
    }
}
