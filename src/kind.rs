//! Aggregation kinds.
//!
//! Every feature and every modifier carries an `AggregationKind` that
//! decides which algebra combines its values: sums for `Additive`,
//! products for `Multiplicative`.

use crate::error::StatGraphError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The combination algebra used by a feature or modifier.
///
/// Kinds are parsed once when catalog data is loaded; any other string
/// is rejected there, so an unknown kind never reaches aggregation.
///
/// # Examples
///
/// ```rust
/// use statgraph::AggregationKind;
///
/// let kind: AggregationKind = "Multiplicative".parse().unwrap();
/// let acc = kind.chain(kind.identity(), 1.2);
/// assert_eq!(kind.combine(10.0, acc), 12.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum AggregationKind {
    /// Contributions are summed.
    Additive,
    /// Contributions are multiplied.
    Multiplicative,
}

impl AggregationKind {
    /// Fold seed for descendant contributions: 0 or 1.
    pub fn identity(self) -> f64 {
        match self {
            AggregationKind::Additive => 0.0,
            AggregationKind::Multiplicative => 1.0,
        }
    }

    /// Fold one contribution into an accumulator.
    pub fn chain(self, accumulator: f64, contribution: f64) -> f64 {
        match self {
            AggregationKind::Additive => accumulator + contribution,
            AggregationKind::Multiplicative => accumulator * contribution,
        }
    }

    /// Combine a base value with the folded accumulator.
    ///
    /// Same arithmetic as [`chain`](Self::chain); kept separate because it is
    /// applied exactly once per cycle, with the base on the left.
    pub fn combine(self, base: f64, accumulator: f64) -> f64 {
        match self {
            AggregationKind::Additive => base + accumulator,
            AggregationKind::Multiplicative => base * accumulator,
        }
    }

    /// Apply a modifier factor to an already aggregated value.
    pub fn apply(self, value: f64, factor: f64) -> f64 {
        match self {
            AggregationKind::Additive => value + factor,
            AggregationKind::Multiplicative => value * factor,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AggregationKind::Additive => "additive",
            AggregationKind::Multiplicative => "multiplicative",
        }
    }
}

impl FromStr for AggregationKind {
    type Err = StatGraphError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("additive") {
            Ok(AggregationKind::Additive)
        } else if s.eq_ignore_ascii_case("multiplicative") {
            Ok(AggregationKind::Multiplicative)
        } else {
            Err(StatGraphError::InvalidKind(s.to_string()))
        }
    }
}

impl TryFrom<String> for AggregationKind {
    type Error = StatGraphError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<AggregationKind> for String {
    fn from(kind: AggregationKind) -> Self {
        kind.as_str().to_string()
    }
}

impl fmt::Display for AggregationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
