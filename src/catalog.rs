//! Static catalog of feature sets and modifiers.
//!
//! The catalog is the read-only data every node is built from: named
//! feature sets (one per part type, e.g. `"sword"` or `"plate_armor"`)
//! and modifier definitions indexed by id. It is handed to the
//! `StatGraph` at construction rather than looked up globally.

use crate::error::StatGraphError;
use crate::feature::{Feature, FeatureDef};
use crate::kind::AggregationKind;
use crate::modifier::{Modifier, ModifierDef};
use crate::name::{Category, FeatureName};
use serde::Deserialize;
use std::collections::HashMap;
use std::io::Read;
use std::path::Path;
use tracing::warn;

/// Keyed lookup of feature sets and modifier definitions.
///
/// # Examples
///
/// ```rust
/// use statgraph::Catalog;
///
/// let catalog = Catalog::from_json_str(r#"{
///     "feature_sets": {
///         "sword": [{ "name": "Damage", "kind": "additive", "base_value": 12.0 }]
///     },
///     "modifiers": [
///         { "id": "rage", "feature_name": "Damage", "factor": 1.5,
///           "kind": "multiplicative", "duration": 4.0 }
///     ]
/// }"#).unwrap();
///
/// assert_eq!(catalog.feature_set("sword").unwrap().len(), 1);
/// assert_eq!(catalog.modifier("rage").unwrap().base_duration(), 4.0);
/// assert!(catalog.modifier("missing").is_err());
/// ```
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    feature_sets: HashMap<String, Vec<FeatureDef>>,
    modifiers: HashMap<String, ModifierDef>,
}

/// On-disk shape. Kinds stay raw strings here so an unknown kind is
/// reported as `InvalidKind` rather than a generic parse error.
#[derive(Deserialize)]
struct CatalogDocument {
    #[serde(default)]
    feature_sets: HashMap<String, Vec<RawFeatureDef>>,
    #[serde(default)]
    modifiers: Vec<RawModifierDef>,
}

#[derive(Deserialize)]
struct RawFeatureDef {
    name: String,
    #[serde(default)]
    category: String,
    kind: String,
    base_value: f64,
}

#[derive(Deserialize)]
struct RawModifierDef {
    id: String,
    feature_name: String,
    #[serde(default)]
    feature_category: String,
    factor: f64,
    kind: String,
    #[serde(default)]
    duration: f64,
    #[serde(default)]
    infinite: bool,
}

impl TryFrom<RawFeatureDef> for FeatureDef {
    type Error = StatGraphError;

    fn try_from(raw: RawFeatureDef) -> Result<Self, Self::Error> {
        Ok(FeatureDef {
            kind: raw.kind.parse::<AggregationKind>()?,
            name: FeatureName::from(raw.name),
            category: Category::from(raw.category),
            base_value: raw.base_value,
        })
    }
}

impl TryFrom<RawModifierDef> for ModifierDef {
    type Error = StatGraphError;

    fn try_from(raw: RawModifierDef) -> Result<Self, Self::Error> {
        Ok(ModifierDef {
            kind: raw.kind.parse::<AggregationKind>()?,
            id: raw.id,
            feature_name: FeatureName::from(raw.feature_name),
            feature_category: Category::from(raw.feature_category),
            factor: raw.factor,
            duration: raw.duration,
            infinite: raw.infinite,
        })
    }
}

impl Catalog {
    /// Create an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a catalog from a JSON document.
    ///
    /// Fails with `InvalidKind` on an unknown aggregation kind and with
    /// `Catalog` on malformed JSON. When two modifiers share an id, the
    /// later definition wins.
    pub fn from_json_str(json: &str) -> Result<Self, StatGraphError> {
        let document: CatalogDocument = serde_json::from_str(json)?;
        Self::from_document(document)
    }

    /// Parse a catalog from any reader producing JSON.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, StatGraphError> {
        let document: CatalogDocument = serde_json::from_reader(reader)?;
        Self::from_document(document)
    }

    /// Read and parse a JSON catalog file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, StatGraphError> {
        let file = std::fs::File::open(path.as_ref())?;
        Self::from_reader(std::io::BufReader::new(file))
    }

    fn from_document(document: CatalogDocument) -> Result<Self, StatGraphError> {
        let mut catalog = Catalog::new();
        for (key, raw_defs) in document.feature_sets {
            let defs = raw_defs
                .into_iter()
                .map(FeatureDef::try_from)
                .collect::<Result<Vec<_>, _>>()?;
            catalog.insert_feature_set(key, defs);
        }
        for raw in document.modifiers {
            catalog.insert_modifier(ModifierDef::try_from(raw)?);
        }
        Ok(catalog)
    }

    /// Register (or replace) a feature set.
    pub fn insert_feature_set(&mut self, key: impl Into<String>, defs: Vec<FeatureDef>) {
        self.feature_sets.insert(key.into(), defs);
    }

    /// Register (or replace) a modifier definition.
    pub fn insert_modifier(&mut self, def: ModifierDef) {
        self.modifiers.insert(def.id.clone(), def);
    }

    /// Fresh features for the set registered under `key`.
    pub fn feature_set(&self, key: &str) -> Result<Vec<Feature>, StatGraphError> {
        match self.feature_sets.get(key) {
            Some(defs) => Ok(defs.iter().map(Feature::from).collect()),
            None => {
                warn!(key, "feature set not found in catalog");
                Err(StatGraphError::UnknownFeatureSet(key.to_string()))
            }
        }
    }

    /// A fresh modifier with its full duration.
    pub fn modifier(&self, id: &str) -> Result<Modifier, StatGraphError> {
        self.modifier_def(id).map(ModifierDef::to_modifier)
    }

    pub fn modifier_def(&self, id: &str) -> Result<&ModifierDef, StatGraphError> {
        self.modifiers.get(id).ok_or_else(|| {
            warn!(id, "modifier not found in catalog");
            StatGraphError::UnknownModifier(id.to_string())
        })
    }

    pub fn has_feature_set(&self, key: &str) -> bool {
        self.feature_sets.contains_key(key)
    }

    pub fn has_modifier(&self, id: &str) -> bool {
        self.modifiers.contains_key(id)
    }

    /// Modifier ids in sorted order.
    pub fn modifier_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.modifiers.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }
}
