//! Stat nodes.
//!
//! A `Node` is a participant in the stat graph: a character, a weapon,
//! a piece of armor. It owns its features and modifiers, and holds the
//! descendant set found by the last discovery pass. That set is a
//! per-cycle cache and is replaced every time the node is updated.
//!
//! Each cycle runs, in order:
//!
//! ```text
//! Rediscover -> Aggregate -> Prune -> Apply -> Post-process
//! ```
//!
//! Rediscovery needs the hierarchy and is driven by `StatGraph`; the
//! remaining stages live here so that a detached working copy can run
//! them for what-if queries.

use crate::catalog::Catalog;
use crate::effects::EngineEffects;
use crate::error::StatGraphError;
use crate::feature::Feature;
use crate::modifier::Modifier;
use crate::name::Category;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, trace};

static NEXT_NODE_ID: AtomicU64 = AtomicU64::new(1);

/// Opaque node identity. Used for equality and hashing only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u64);

impl NodeId {
    /// Allocate a process-wide unique id.
    pub fn next() -> Self {
        NodeId(NEXT_NODE_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node#{}", self.0)
    }
}

/// Per-subtype strategy supplied when a node is built.
///
/// `initial_features` runs once at construction. `post_process` runs at
/// the end of every cycle and translates settled feature values into
/// engine effects; it cannot write features.
///
/// # Examples
///
/// ```rust
/// use statgraph::{AggregationKind, Catalog, EngineEffects, Feature, NodeBehavior, StatGraphError};
///
/// struct Armor;
///
/// impl NodeBehavior for Armor {
///     fn initial_features(&self, _catalog: &Catalog) -> Result<Vec<Feature>, StatGraphError> {
///         Ok(vec![Feature::new("Weight", "", AggregationKind::Additive, 12.0)])
///     }
///
///     fn post_process(&self, features: &[Feature], effects: &mut EngineEffects) {
///         if let Some(weight) = features.iter().find(|f| f.name().matches("Weight")) {
///             effects.set("mass", weight.current_value());
///         }
///     }
/// }
/// ```
pub trait NodeBehavior: Send + Sync {
    /// Build the node's feature list.
    fn initial_features(&self, catalog: &Catalog) -> Result<Vec<Feature>, StatGraphError>;

    /// Map final feature values onto engine effects.
    fn post_process(&self, _features: &[Feature], _effects: &mut EngineEffects) {}
}

/// Behavior that loads a named feature set from the catalog and has no
/// post-processing.
#[derive(Debug, Clone)]
pub struct CatalogFeatures {
    key: String,
}

impl CatalogFeatures {
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }
}

impl NodeBehavior for CatalogFeatures {
    fn initial_features(&self, catalog: &Catalog) -> Result<Vec<Feature>, StatGraphError> {
        catalog.feature_set(&self.key)
    }
}

/// Behavior with a fixed feature list, mostly useful for tests and
/// hypothetical parts built on the fly.
#[derive(Debug, Clone, Default)]
pub struct StaticFeatures(pub Vec<Feature>);

impl NodeBehavior for StaticFeatures {
    fn initial_features(&self, _catalog: &Catalog) -> Result<Vec<Feature>, StatGraphError> {
        Ok(self.0.clone())
    }
}

/// What `Node::add_modifier` did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModifierAdded {
    /// No active modifier had this id; the new one was appended.
    Appended,
    /// An active modifier with this id had its duration reset.
    Refreshed,
    /// An infinite modifier with this id was already present.
    Unchanged,
}

/// A stat graph participant.
pub struct Node {
    id: NodeId,
    category: Category,
    features: Vec<Feature>,
    modifiers: Vec<Modifier>,
    descendants: Vec<NodeId>,
    effects: EngineEffects,
    behavior: Arc<dyn NodeBehavior>,
}

impl Node {
    /// Build a node, running the behavior's feature initializer.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use std::sync::Arc;
    /// use statgraph::{AggregationKind, Catalog, Feature, Node, StaticFeatures};
    ///
    /// let behavior = StaticFeatures(vec![Feature::new("Damage", "", AggregationKind::Additive, 10.0)]);
    /// let node = Node::new("Weapon", Arc::new(behavior), &Catalog::new()).unwrap();
    /// assert_eq!(node.feature_value("Damage", ""), Some(10.0));
    /// ```
    pub fn new(
        category: impl Into<Category>,
        behavior: Arc<dyn NodeBehavior>,
        catalog: &Catalog,
    ) -> Result<Self, StatGraphError> {
        let features = behavior.initial_features(catalog)?;
        Ok(Self {
            id: NodeId::next(),
            category: category.into(),
            features,
            modifiers: Vec::new(),
            descendants: Vec::new(),
            effects: EngineEffects::new(),
            behavior,
        })
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn category(&self) -> &Category {
        &self.category
    }

    pub fn features(&self) -> &[Feature] {
        &self.features
    }

    pub fn modifiers(&self) -> &[Modifier] {
        &self.modifiers
    }

    /// Descendants found by the most recent cycle. Stale as soon as the
    /// hierarchy changes; do not rely on it across cycles.
    pub fn descendants(&self) -> &[NodeId] {
        &self.descendants
    }

    /// Effects written by the most recent post-process.
    pub fn effects(&self) -> &EngineEffects {
        &self.effects
    }

    /// First feature matching `name` (case-insensitive) and a compatible
    /// category. Pass `""` to match any category.
    pub fn get_feature(&self, name: &str, category: &str) -> Option<&Feature> {
        let category = Category::from_str(category);
        self.features.iter().find(|f| f.matches(name, &category))
    }

    pub fn feature_value(&self, name: &str, category: &str) -> Option<f64> {
        self.get_feature(name, category).map(Feature::current_value)
    }

    fn feature_mut(&mut self, name: &str, category: &str) -> Result<&mut Feature, StatGraphError> {
        let selector = Category::from_str(category);
        self.features
            .iter_mut()
            .find(|f| f.matches(name, &selector))
            .ok_or_else(|| StatGraphError::MissingFeature {
                name: name.to_string(),
                category: category.to_string(),
            })
    }

    /// Force a feature's current value. The next cycle recomputes it
    /// from the base value.
    pub fn set_feature_current_value(
        &mut self,
        name: &str,
        value: f64,
        category: &str,
    ) -> Result<(), StatGraphError> {
        self.feature_mut(name, category)?.set_current_value(value);
        Ok(())
    }

    pub fn set_feature_base_value(
        &mut self,
        name: &str,
        value: f64,
        category: &str,
    ) -> Result<(), StatGraphError> {
        self.feature_mut(name, category)?.set_base_value(value);
        Ok(())
    }

    pub fn get_modifier_by_id(&self, id: &str) -> Option<&Modifier> {
        self.modifiers.iter().find(|m| m.id() == id)
    }

    pub fn has_modifier(&self, id: &str) -> bool {
        self.get_modifier_by_id(id).is_some()
    }

    /// Add a modifier with refresh-not-stack semantics.
    ///
    /// If a still-valid modifier with the same id is present, its duration
    /// is reset (infinite ones are left alone) and `modifier` is dropped.
    /// Otherwise `modifier` is appended, after every existing modifier.
    pub fn add_modifier(&mut self, modifier: Modifier) -> ModifierAdded {
        let node = self.id;
        if let Some(existing) = self
            .modifiers
            .iter_mut()
            .find(|m| m.id() == modifier.id() && m.is_valid())
        {
            if existing.is_infinite() {
                return ModifierAdded::Unchanged;
            }
            existing.reset_duration();
            debug!(%node, id = existing.id(), duration = existing.duration(), "modifier refreshed");
            return ModifierAdded::Refreshed;
        }

        debug!(%node, id = modifier.id(), "modifier appended");
        self.modifiers.push(modifier);
        ModifierAdded::Appended
    }

    pub fn add_more_modifiers<I>(&mut self, modifiers: I) -> Vec<ModifierAdded>
    where
        I: IntoIterator<Item = Modifier>,
    {
        modifiers
            .into_iter()
            .map(|m| self.add_modifier(m))
            .collect()
    }

    /// Remove the first modifier with this id.
    pub fn remove_modifier(&mut self, id: &str) -> Option<Modifier> {
        let pos = self.modifiers.iter().position(|m| m.id() == id)?;
        debug!(node = %self.id, id, "modifier removed");
        Some(self.modifiers.remove(pos))
    }

    pub(crate) fn set_descendants(&mut self, descendants: Vec<NodeId>) {
        self.descendants = descendants;
    }

    /// Fold matching descendant features into one accumulator per owned
    /// feature, using the owned feature's kind.
    pub fn accumulators(&self, descendants: &[&Node]) -> Vec<f64> {
        self.features
            .iter()
            .map(|feature| {
                let kind = feature.kind();
                descendants
                    .iter()
                    .flat_map(|d| d.features.iter())
                    .filter(|g| g.matches_feature(feature))
                    .fold(kind.identity(), |acc, g| kind.chain(acc, g.current_value()))
            })
            .collect()
    }

    /// Aggregate, prune, apply and post-process, given the accumulators
    /// produced by [`accumulators`](Self::accumulators).
    pub fn settle(&mut self, accumulators: &[f64], elapsed: f64) {
        for (feature, acc) in self.features.iter_mut().zip(accumulators) {
            feature.aggregate(*acc);
        }

        let node = self.id;
        self.modifiers.retain(|m| {
            if m.is_expired() {
                debug!(%node, id = m.id(), "modifier expired");
                false
            } else {
                true
            }
        });

        for modifier in &mut self.modifiers {
            modifier.apply(&mut self.features, elapsed);
        }

        self.effects.clear();
        self.behavior.post_process(&self.features, &mut self.effects);

        trace!(
            %node,
            descendants = self.descendants.len(),
            modifiers = self.modifiers.len(),
            "cycle settled"
        );
    }

    /// Run stages 2 to 5 against an explicit descendant list.
    pub fn run_cycle(&mut self, descendants: &[&Node], elapsed: f64) {
        let accumulators = self.accumulators(descendants);
        self.settle(&accumulators, elapsed);
    }

    /// Independent value copy: features, modifiers, descendant list and
    /// effects are all owned by the copy. Only the stateless behavior is
    /// shared.
    fn snapshot(&self) -> Node {
        Node {
            id: self.id,
            category: self.category.clone(),
            features: self.features.clone(),
            modifiers: self.modifiers.clone(),
            descendants: self.descendants.clone(),
            effects: EngineEffects::new(),
            behavior: Arc::clone(&self.behavior),
        }
    }

    /// Features this node would have with `extras` attached beneath it.
    ///
    /// Runs a single pass on a working copy with zero elapsed time, so no
    /// modifier duration is consumed. `self` is not touched. Extras that
    /// are already among `descendants`, or are this node, are ignored.
    pub fn simulate(&self, descendants: &[&Node], extras: &[&Node]) -> Vec<Feature> {
        let mut copy = self.snapshot();
        let mut evaluated: Vec<&Node> = descendants.to_vec();
        for &extra in extras {
            if extra.id != self.id && !evaluated.iter().any(|d| d.id == extra.id) {
                evaluated.push(extra);
            }
        }
        copy.descendants = evaluated.iter().map(|d| d.id).collect();
        copy.run_cycle(&evaluated, 0.0);
        copy.features
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("id", &self.id)
            .field("category", &self.category)
            .field("features", &self.features)
            .field("modifiers", &self.modifiers)
            .field("descendants", &self.descendants)
            .field("effects", &self.effects)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kind::AggregationKind;

    fn node(category: &str, features: Vec<Feature>) -> Node {
        Node::new(category, Arc::new(StaticFeatures(features)), &Catalog::new()).unwrap()
    }

    fn damage(category: &str, base: f64) -> Feature {
        Feature::new("Damage", category, AggregationKind::Additive, base)
    }

    fn buff(id: &str, factor: f64, kind: AggregationKind) -> Modifier {
        Modifier::timed(id, "Damage", "", factor, kind, 10.0)
    }

    #[test]
    fn test_node_ids_are_unique() {
        let a = node("A", vec![]);
        let b = node("A", vec![]);
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn test_get_feature_missing_returns_none() {
        let n = node("Character", vec![damage("", 10.0)]);
        assert!(n.get_feature("Speed", "").is_none());
        assert!(n.get_feature("damage", "").is_some());
    }

    #[test]
    fn test_set_feature_current_value() {
        let mut n = node("Character", vec![damage("", 10.0)]);
        n.set_feature_current_value("Damage", 42.0, "").unwrap();
        assert_eq!(n.feature_value("Damage", ""), Some(42.0));

        // Overwritten by the next cycle.
        n.run_cycle(&[], 0.0);
        assert_eq!(n.feature_value("Damage", ""), Some(10.0));

        assert_eq!(
            n.set_feature_current_value("Speed", 1.0, ""),
            Err(StatGraphError::MissingFeature {
                name: "Speed".into(),
                category: String::new(),
            })
        );
    }

    #[test]
    fn test_set_feature_base_value_persists() {
        let mut n = node("Character", vec![damage("", 10.0)]);
        n.set_feature_base_value("Damage", 20.0, "").unwrap();
        n.run_cycle(&[], 0.0);
        assert_eq!(n.feature_value("Damage", ""), Some(20.0));
    }

    #[test]
    fn test_aggregate_from_descendants() {
        let mut parent = node("Character", vec![damage("", 10.0)]);
        let a = node("Weapon", vec![damage("", 5.0)]);
        let b = node("Ring", vec![damage("", 2.0)]);
        parent.run_cycle(&[&a, &b], 0.0);
        assert_eq!(parent.feature_value("Damage", ""), Some(17.0));
    }

    #[test]
    fn test_aggregate_uses_owner_kind() {
        let mut parent = node(
            "Character",
            vec![Feature::new("Speed", "", AggregationKind::Multiplicative, 2.0)],
        );
        let a = node(
            "Boots",
            vec![Feature::new("Speed", "", AggregationKind::Additive, 1.5)],
        );
        let b = node(
            "Cloak",
            vec![Feature::new("Speed", "", AggregationKind::Additive, 2.0)],
        );
        parent.run_cycle(&[&a, &b], 0.0);
        assert_eq!(parent.feature_value("Speed", ""), Some(6.0));
    }

    #[test]
    fn test_add_modifier_refreshes_instead_of_stacking() {
        let mut n = node("Character", vec![damage("", 10.0)]);
        assert_eq!(
            n.add_modifier(Modifier::timed("buff1", "Damage", "", 5.0, AggregationKind::Additive, 2.0)),
            ModifierAdded::Appended
        );
        n.run_cycle(&[], 1.5);
        assert_eq!(n.get_modifier_by_id("buff1").unwrap().duration(), 0.5);

        assert_eq!(
            n.add_modifier(Modifier::timed("buff1", "Damage", "", 5.0, AggregationKind::Additive, 2.0)),
            ModifierAdded::Refreshed
        );
        assert_eq!(n.modifiers().len(), 1);
        assert_eq!(n.get_modifier_by_id("buff1").unwrap().duration(), 2.0);

        n.run_cycle(&[], 0.0);
        assert_eq!(n.feature_value("Damage", ""), Some(15.0));
    }

    #[test]
    fn test_add_infinite_modifier_twice_is_unchanged() {
        let mut n = node("Character", vec![damage("", 10.0)]);
        let aura = Modifier::infinite("aura", "Damage", "", 1.0, AggregationKind::Additive);
        assert_eq!(n.add_modifier(aura.clone()), ModifierAdded::Appended);
        assert_eq!(n.add_modifier(aura), ModifierAdded::Unchanged);
        assert_eq!(n.modifiers().len(), 1);
    }

    #[test]
    fn test_add_more_and_remove_modifiers() {
        let mut n = node("Character", vec![damage("", 10.0)]);
        let outcomes = n.add_more_modifiers(vec![
            buff("a", 1.0, AggregationKind::Additive),
            buff("b", 2.0, AggregationKind::Additive),
            buff("a", 1.0, AggregationKind::Additive),
        ]);
        assert_eq!(
            outcomes,
            vec![
                ModifierAdded::Appended,
                ModifierAdded::Appended,
                ModifierAdded::Refreshed
            ]
        );
        assert!(n.has_modifier("b"));
        assert_eq!(n.remove_modifier("b").map(|m| m.factor()), Some(2.0));
        assert!(!n.has_modifier("b"));
        assert!(n.remove_modifier("b").is_none());
    }

    #[test]
    fn test_modifiers_apply_in_insertion_order() {
        let mut add_first = node("Character", vec![damage("", 10.0)]);
        add_first.add_modifier(buff("plus", 5.0, AggregationKind::Additive));
        add_first.add_modifier(buff("double", 2.0, AggregationKind::Multiplicative));
        add_first.run_cycle(&[], 0.0);
        assert_eq!(add_first.feature_value("Damage", ""), Some(30.0));

        let mut mul_first = node("Character", vec![damage("", 10.0)]);
        mul_first.add_modifier(buff("double", 2.0, AggregationKind::Multiplicative));
        mul_first.add_modifier(buff("plus", 5.0, AggregationKind::Additive));
        mul_first.run_cycle(&[], 0.0);
        assert_eq!(mul_first.feature_value("Damage", ""), Some(25.0));
    }

    #[test]
    fn test_expired_modifier_is_pruned_next_cycle() {
        let mut n = node("Character", vec![damage("", 10.0)]);
        n.add_modifier(Modifier::timed("buff1", "Damage", "", 5.0, AggregationKind::Additive, 2.0));

        n.run_cycle(&[], 2.0);
        assert_eq!(n.feature_value("Damage", ""), Some(15.0));
        assert!(n.has_modifier("buff1"));

        n.run_cycle(&[], 0.0);
        assert_eq!(n.feature_value("Damage", ""), Some(10.0));
        assert!(!n.has_modifier("buff1"));
    }

    struct Weighted;

    impl NodeBehavior for Weighted {
        fn initial_features(&self, _catalog: &Catalog) -> Result<Vec<Feature>, StatGraphError> {
            Ok(vec![Feature::new("Weight", "", AggregationKind::Additive, 3.0)])
        }

        fn post_process(&self, features: &[Feature], effects: &mut EngineEffects) {
            let weight = features
                .iter()
                .find(|f| f.name().matches("weight"))
                .map_or(0.0, Feature::current_value);
            effects.set("mass", weight * 2.0);
        }
    }

    #[test]
    fn test_post_process_writes_effects() {
        let mut n = Node::new("Armor", Arc::new(Weighted), &Catalog::new()).unwrap();
        assert!(n.effects().is_empty());
        let plate = node("Plate", vec![Feature::new("Weight", "", AggregationKind::Additive, 7.0)]);
        n.run_cycle(&[&plate], 0.0);
        assert_eq!(n.effects().get("mass"), Some(20.0));
    }

    #[test]
    fn test_initializer_error_aborts_construction() {
        let err = Node::new(
            "Weapon",
            Arc::new(CatalogFeatures::new("missing")),
            &Catalog::new(),
        )
        .unwrap_err();
        assert_eq!(err, StatGraphError::UnknownFeatureSet("missing".into()));
    }

    #[test]
    fn test_simulate_leaves_node_untouched() {
        let mut n = node("Character", vec![damage("", 10.0)]);
        n.add_modifier(Modifier::timed("buff1", "Damage", "", 5.0, AggregationKind::Additive, 2.0));
        n.run_cycle(&[], 0.5);
        let before_value = n.feature_value("Damage", "");
        let before_duration = n.get_modifier_by_id("buff1").unwrap().duration();

        let sword = node("Weapon", vec![damage("", 7.0)]);
        let simulated = n.simulate(&[], &[&sword]);
        let simulated_damage = simulated
            .iter()
            .find(|f| f.name().matches("Damage"))
            .unwrap();
        assert_eq!(simulated_damage.current_value(), 22.0);

        assert_eq!(n.feature_value("Damage", ""), before_value);
        assert_eq!(
            n.get_modifier_by_id("buff1").unwrap().duration(),
            before_duration
        );
        assert!(n.descendants().is_empty());
    }

    #[test]
    fn test_simulate_ignores_duplicate_extras() {
        let n = node("Character", vec![damage("", 10.0)]);
        let sword = node("Weapon", vec![damage("", 5.0)]);
        let simulated = n.simulate(&[&sword], &[&sword, &n]);
        assert_eq!(simulated[0].current_value(), 15.0);
    }
}
