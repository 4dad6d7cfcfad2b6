//! Feature toggle data model. This is both the format served by the remote API and the format of
//! the backup file written to local storage.
use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Immutable collection of feature toggles, keyed by toggle name.
///
/// A `ToggleSet` is never modified in place. Every successful fetch produces a new set which
/// replaces the previous one completely (see [`ToggleSnapshot`](crate::ToggleSnapshot)).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "WireToggleSet")]
pub struct ToggleSet {
    version: u32,
    features: Vec<Toggle>,
    /// Toggle name to position in `features`. Rebuilt on deserialization.
    #[serde(skip)]
    index: HashMap<String, usize>,
}

/// Wire representation of [`ToggleSet`] before the lookup index is built.
#[derive(Deserialize)]
struct WireToggleSet {
    #[serde(default = "default_version")]
    version: u32,
    #[serde(default)]
    features: Vec<Toggle>,
}

fn default_version() -> u32 {
    ToggleSet::FORMAT_VERSION
}

impl From<WireToggleSet> for ToggleSet {
    fn from(value: WireToggleSet) -> ToggleSet {
        ToggleSet::with_version(value.version, value.features)
    }
}

impl ToggleSet {
    /// Format version written by this crate.
    pub const FORMAT_VERSION: u32 = 1;

    /// Create a new toggle set from a list of toggles.
    ///
    /// Toggle names are expected to be unique. If a name repeats, lookups resolve to its first
    /// occurrence.
    pub fn new(features: Vec<Toggle>) -> ToggleSet {
        ToggleSet::with_version(ToggleSet::FORMAT_VERSION, features)
    }

    fn with_version(version: u32, features: Vec<Toggle>) -> ToggleSet {
        let mut index = HashMap::with_capacity(features.len());
        for (i, toggle) in features.iter().enumerate() {
            index.entry(toggle.name.clone()).or_insert(i);
        }
        ToggleSet {
            version,
            features,
            index,
        }
    }

    /// Find a toggle by its (case-sensitive) name.
    pub fn get(&self, name: &str) -> Option<&Toggle> {
        self.index.get(name).map(|&i| &self.features[i])
    }

    /// Iterate over toggles in their original order.
    pub fn iter(&self) -> impl Iterator<Item = &Toggle> {
        self.features.iter()
    }

    /// Number of toggles in the set.
    pub fn len(&self) -> usize {
        self.features.len()
    }

    /// Returns `true` if the set holds no toggles.
    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Format version reported by the server (or backup file).
    pub fn version(&self) -> u32 {
        self.version
    }
}

impl Default for ToggleSet {
    fn default() -> ToggleSet {
        ToggleSet::new(Vec::new())
    }
}

impl FromIterator<Toggle> for ToggleSet {
    fn from_iter<I: IntoIterator<Item = Toggle>>(iter: I) -> ToggleSet {
        ToggleSet::new(iter.into_iter().collect())
    }
}

/// A named feature flag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Toggle {
    /// Unique, case-sensitive toggle name.
    pub name: String,
    /// Master switch. A disabled toggle is off regardless of its strategies.
    pub enabled: bool,
    /// Strategy bindings, evaluated in order. The toggle is on if any of them matches.
    #[serde(default)]
    pub strategies: Vec<StrategyBinding>,
}

impl Toggle {
    /// Create a toggle without strategy bindings.
    pub fn new(name: impl Into<String>, enabled: bool) -> Toggle {
        Toggle {
            name: name.into(),
            enabled,
            strategies: Vec::new(),
        }
    }

    /// Append a strategy binding.
    pub fn with_strategy(mut self, binding: StrategyBinding) -> Toggle {
        self.strategies.push(binding);
        self
    }
}

/// A strategy name with the parameters configured for one toggle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StrategyBinding {
    pub name: String,
    #[serde(default)]
    pub parameters: HashMap<String, String>,
}

impl StrategyBinding {
    /// Create a binding without parameters.
    pub fn new(name: impl Into<String>) -> StrategyBinding {
        StrategyBinding {
            name: name.into(),
            parameters: HashMap::new(),
        }
    }

    /// Add a parameter to the binding.
    pub fn with_parameter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.parameters.insert(key.into(), value.into());
        self
    }
}
