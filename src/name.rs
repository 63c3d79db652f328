//! Feature names and categories.
//!
//! Provides `FeatureName` and `Category`, interned string identifiers
//! backed by `Arc<str>` so cloning them into every feature, modifier and
//! simulation copy is cheap.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Interned, case-insensitive feature name.
///
/// Two names are equal when they match ignoring ASCII case, and they
/// hash accordingly, so `"Damage"` and `"damage"` are the same key.
///
/// # Examples
///
/// ```rust
/// use statgraph::FeatureName;
///
/// let a = FeatureName::from_str("Damage");
/// let b: FeatureName = "DAMAGE".into();
/// assert_eq!(a, b);
/// assert_eq!(a.as_str(), "Damage");
/// ```
#[derive(Debug, Clone)]
pub struct FeatureName(Arc<str>);

impl FeatureName {
    /// Create a new `FeatureName` from a string slice.
    pub fn from_str(s: &str) -> Self {
        Self(Arc::from(s))
    }

    /// The name as originally written.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Case-insensitive comparison against a plain string.
    pub fn matches(&self, other: &str) -> bool {
        self.0.eq_ignore_ascii_case(other)
    }
}

impl PartialEq for FeatureName {
    fn eq(&self, other: &Self) -> bool {
        self.matches(&other.0)
    }
}

impl Eq for FeatureName {}

impl Hash for FeatureName {
    fn hash<H: Hasher>(&self, state: &mut H) {
        for b in self.0.bytes() {
            state.write_u8(b.to_ascii_lowercase());
        }
        state.write_u8(0xff);
    }
}

/// Interned category tag. The empty category is a wildcard.
///
/// Categories are compared exactly; only the empty string is special.
///
/// # Examples
///
/// ```rust
/// use statgraph::Category;
///
/// let weapon = Category::from_str("Weapon");
/// let armor = Category::from_str("Armor");
/// let any = Category::wildcard();
///
/// assert!(weapon.is_compatible(&any));
/// assert!(any.is_compatible(&armor));
/// assert!(!weapon.is_compatible(&armor));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Category(Arc<str>);

impl Category {
    /// Create a new `Category` from a string slice.
    pub fn from_str(s: &str) -> Self {
        Self(Arc::from(s))
    }

    /// The empty category, which matches any other category.
    pub fn wildcard() -> Self {
        Self(Arc::from(""))
    }

    /// Get the string representation of this category.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this is the empty, match-anything category.
    pub fn is_wildcard(&self) -> bool {
        self.0.is_empty()
    }

    /// Equal, or either side is the wildcard.
    pub fn is_compatible(&self, other: &Category) -> bool {
        self.is_wildcard() || other.is_wildcard() || self.0 == other.0
    }
}

impl Default for Category {
    fn default() -> Self {
        Self::wildcard()
    }
}

macro_rules! string_conversions {
    ($ty:ident) => {
        impl From<&str> for $ty {
            fn from(s: &str) -> Self {
                Self::from_str(s)
            }
        }

        impl From<String> for $ty {
            fn from(s: String) -> Self {
                Self(Arc::from(s))
            }
        }

        impl From<&$ty> for $ty {
            fn from(s: &$ty) -> Self {
                s.clone()
            }
        }

        impl std::fmt::Display for $ty {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.pad(&self.0)
            }
        }

        impl Serialize for $ty {
            fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
            where
                S: Serializer,
            {
                self.0.as_ref().serialize(serializer)
            }
        }

        impl<'de> Deserialize<'de> for $ty {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: Deserializer<'de>,
            {
                let s = String::deserialize(deserializer)?;
                Ok($ty::from(s))
            }
        }
    };
}

string_conversions!(FeatureName);
string_conversions!(Category);
