//! Features: named, categorized scalars.
//!
//! A feature's `current_value` is derived from scratch every cycle:
//! base value combined with descendant contributions, then adjusted by
//! modifiers. Only the base value persists between cycles.

use crate::kind::AggregationKind;
use crate::name::{Category, FeatureName};
use serde::{Deserialize, Serialize};

/// A named, categorized scalar with an aggregation kind.
///
/// # Examples
///
/// ```rust
/// use statgraph::{AggregationKind, Feature};
///
/// let mut damage = Feature::new("Damage", "", AggregationKind::Additive, 10.0);
/// assert_eq!(damage.current_value(), 10.0);
///
/// damage.aggregate(5.0);
/// assert_eq!(damage.current_value(), 15.0);
///
/// damage.apply_modifier_factor(2.0, AggregationKind::Multiplicative);
/// assert_eq!(damage.current_value(), 30.0);
/// assert_eq!(damage.base_value(), 10.0);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    name: FeatureName,
    #[serde(default)]
    category: Category,
    kind: AggregationKind,
    base_value: f64,
    current_value: f64,
}

impl Feature {
    /// Create a feature whose current value starts at its base value.
    pub fn new(
        name: impl Into<FeatureName>,
        category: impl Into<Category>,
        kind: AggregationKind,
        base_value: f64,
    ) -> Self {
        Self {
            name: name.into(),
            category: category.into(),
            kind,
            base_value,
            current_value: base_value,
        }
    }

    /// Feature name, compared case-insensitively.
    pub fn name(&self) -> &FeatureName {
        &self.name
    }

    /// Category tag; empty matches any category.
    pub fn category(&self) -> &Category {
        &self.category
    }

    /// How matching values are folded into this feature.
    pub fn kind(&self) -> AggregationKind {
        self.kind
    }

    /// Value before descendants and modifiers.
    pub fn base_value(&self) -> f64 {
        self.base_value
    }

    /// Value settled by the most recent cycle.
    pub fn current_value(&self) -> f64 {
        self.current_value
    }

    /// Change the base value. Takes effect from the next aggregation pass.
    pub fn set_base_value(&mut self, value: f64) {
        self.base_value = value;
    }

    /// Force the current value. Overwritten by the next aggregation pass.
    pub fn set_current_value(&mut self, value: f64) {
        self.current_value = value;
    }

    /// Restore the current value to the base value.
    pub fn reset(&mut self) {
        self.current_value = self.base_value;
    }

    /// True if `name` is equal ignoring case and the categories are compatible.
    pub fn matches(&self, name: &str, category: &Category) -> bool {
        self.name.matches(name) && self.category.is_compatible(category)
    }

    /// Selector match against another feature's name and category.
    pub fn matches_feature(&self, other: &Feature) -> bool {
        self.name == other.name && self.category.is_compatible(&other.category)
    }

    /// Recombine the current value from the base value and a folded
    /// descendant accumulator.
    pub fn aggregate(&mut self, accumulator: f64) {
        self.current_value = self.kind.combine(self.base_value, accumulator);
    }

    /// Adjust the current value by a modifier factor. The base value is
    /// never touched.
    pub fn apply_modifier_factor(&mut self, factor: f64, kind: AggregationKind) {
        self.current_value = kind.apply(self.current_value, factor);
    }
}

/// Catalog definition of a feature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureDef {
    pub name: FeatureName,
    #[serde(default)]
    pub category: Category,
    pub kind: AggregationKind,
    pub base_value: f64,
}

impl FeatureDef {
    pub fn to_feature(&self) -> Feature {
        Feature::new(&self.name, &self.category, self.kind, self.base_value)
    }
}

impl From<&FeatureDef> for Feature {
    fn from(def: &FeatureDef) -> Self {
        def.to_feature()
    }
}
