//! Modifiers: time-scoped adjustments to features.
//!
//! A modifier selects features by name and category, adjusts their
//! current value by a factor every cycle it is active, and counts its
//! duration down by the cycle's elapsed time unless it is infinite.

use crate::feature::Feature;
use crate::kind::AggregationKind;
use crate::name::{Category, FeatureName};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Condition checked every time a modifier is applied.
///
/// When it returns `false` the modifier does not touch any feature that
/// cycle, but its duration still counts down.
pub type ActivationPredicate = Arc<dyn Fn() -> bool + Send + Sync>;

/// A named, time-scoped adjustment rule.
///
/// Cloning a modifier produces an independent value; only the
/// activation predicate (a stateless condition) is shared.
///
/// # Examples
///
/// ```rust
/// use statgraph::{AggregationKind, Feature, Modifier};
///
/// let mut features = vec![Feature::new("Damage", "", AggregationKind::Additive, 10.0)];
/// let mut buff = Modifier::timed("buff1", "Damage", "", 5.0, AggregationKind::Additive, 2.0);
///
/// assert!(buff.apply(&mut features, 0.5));
/// assert_eq!(features[0].current_value(), 15.0);
/// assert_eq!(buff.duration(), 1.5);
/// ```
#[derive(Clone)]
pub struct Modifier {
    id: String,
    feature_name: FeatureName,
    feature_category: Category,
    factor: f64,
    kind: AggregationKind,
    duration: f64,
    base_duration: f64,
    infinite: bool,
    predicate: Option<ActivationPredicate>,
}

impl Modifier {
    /// A modifier that expires after `duration` seconds.
    pub fn timed(
        id: impl Into<String>,
        feature_name: impl Into<FeatureName>,
        feature_category: impl Into<Category>,
        factor: f64,
        kind: AggregationKind,
        duration: f64,
    ) -> Self {
        Self {
            id: id.into(),
            feature_name: feature_name.into(),
            feature_category: feature_category.into(),
            factor,
            kind,
            duration,
            base_duration: duration,
            infinite: false,
            predicate: None,
        }
    }

    /// A modifier that never expires on its own.
    pub fn infinite(
        id: impl Into<String>,
        feature_name: impl Into<FeatureName>,
        feature_category: impl Into<Category>,
        factor: f64,
        kind: AggregationKind,
    ) -> Self {
        let mut modifier = Self::timed(id, feature_name, feature_category, factor, kind, 0.0);
        modifier.infinite = true;
        modifier
    }

    /// Attach an activation predicate.
    pub fn with_predicate<F>(mut self, predicate: F) -> Self
    where
        F: Fn() -> bool + Send + Sync + 'static,
    {
        self.predicate = Some(Arc::new(predicate));
        self
    }

    pub fn with_shared_predicate(mut self, predicate: ActivationPredicate) -> Self {
        self.predicate = Some(predicate);
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn feature_name(&self) -> &FeatureName {
        &self.feature_name
    }

    pub fn feature_category(&self) -> &Category {
        &self.feature_category
    }

    pub fn factor(&self) -> f64 {
        self.factor
    }

    pub fn kind(&self) -> AggregationKind {
        self.kind
    }

    /// Seconds remaining. Meaningless for infinite modifiers.
    pub fn duration(&self) -> f64 {
        self.duration
    }

    pub fn base_duration(&self) -> f64 {
        self.base_duration
    }

    pub fn is_infinite(&self) -> bool {
        self.infinite
    }

    pub fn has_predicate(&self) -> bool {
        self.predicate.is_some()
    }

    /// Infinite, or time remaining.
    pub fn is_valid(&self) -> bool {
        self.infinite || self.duration > 0.0
    }

    /// Counterpart of [`is_valid`](Self::is_valid) used when pruning.
    pub fn is_expired(&self) -> bool {
        !self.is_valid()
    }

    /// Refresh the remaining time. No-op for infinite modifiers.
    pub fn reset_duration(&mut self) {
        if !self.infinite {
            self.duration = self.base_duration;
        }
    }

    /// True if this modifier's selector matches the feature.
    pub fn targets(&self, feature: &Feature) -> bool {
        feature.matches(self.feature_name.as_str(), &self.feature_category)
    }

    /// True if the modifier would fire right now.
    pub fn is_active(&self) -> bool {
        self.is_valid() && self.predicate.as_ref().map_or(true, |p| p())
    }

    /// Apply to every matching feature, then consume `elapsed` seconds.
    ///
    /// Returns whether the modifier fired. Duration counts down whether
    /// or not it fired.
    pub fn apply(&mut self, features: &mut [Feature], elapsed: f64) -> bool {
        let fired = self.is_active();
        if fired {
            for feature in features.iter_mut().filter(|f| self.targets(f)) {
                feature.apply_modifier_factor(self.factor, self.kind);
            }
        }
        if !self.infinite {
            self.duration -= elapsed;
        }
        fired
    }
}

impl fmt::Debug for Modifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Modifier")
            .field("id", &self.id)
            .field("feature_name", &self.feature_name)
            .field("feature_category", &self.feature_category)
            .field("factor", &self.factor)
            .field("kind", &self.kind)
            .field("duration", &self.duration)
            .field("base_duration", &self.base_duration)
            .field("infinite", &self.infinite)
            .field("predicate", &self.predicate.as_ref().map(|_| "<fn>"))
            .finish()
    }
}

/// Catalog definition of a modifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModifierDef {
    pub id: String,
    pub feature_name: FeatureName,
    #[serde(default)]
    pub feature_category: Category,
    pub factor: f64,
    pub kind: AggregationKind,
    #[serde(default)]
    pub duration: f64,
    #[serde(default)]
    pub infinite: bool,
}

impl ModifierDef {
    /// Build a fresh modifier with its full duration.
    pub fn to_modifier(&self) -> Modifier {
        if self.infinite {
            Modifier::infinite(
                self.id.clone(),
                &self.feature_name,
                &self.feature_category,
                self.factor,
                self.kind,
            )
        } else {
            Modifier::timed(
                self.id.clone(),
                &self.feature_name,
                &self.feature_category,
                self.factor,
                self.kind,
                self.duration,
            )
        }
    }
}
