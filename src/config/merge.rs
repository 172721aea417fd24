//! Config merge algebra.
//!
//! `merge(incoming, base)` walks `incoming` key by key over a copy of `base`:
//!
//! | base / incoming     | result                                   |
//! |---------------------|------------------------------------------|
//! | hook / hook         | composed hook, base runs first           |
//! | any / any, key vite | [`BundlerConfigMerge::merge`]            |
//! | table / table       | recursive merge                          |
//! | any / null          | base kept                                |
//! | any / other         | incoming                                 |

use std::sync::Arc;

use super::value::{ConfigTable, ConfigValue, Hook};

/// Key of the embedded bundler config sub-tree.
pub const BUNDLER_KEY: &str = "vite";

/// The host bundler's own config merge, used for the [`BUNDLER_KEY`] sub-tree.
pub trait BundlerConfigMerge: Send + Sync {
    fn merge(&self, base: &ConfigValue, incoming: &ConfigValue) -> ConfigValue;
}

/// Vite `mergeConfig` semantics: arrays concatenate (base first), tables
/// recurse, `null` never overrides, anything else is replaced.
#[derive(Debug, Default, Clone, Copy)]
pub struct ViteConfigMerge;

impl ViteConfigMerge {
    fn merge_tables(base: &ConfigTable, incoming: &ConfigTable) -> ConfigTable {
        let mut merged = base.clone();
        for (key, value) in incoming.iter() {
            if value.is_null() {
                continue;
            }
            let next = match merged.get(key) {
                None | Some(ConfigValue::Null) => value.clone(),
                Some(existing) => Self::merge_values(existing, value),
            };
            merged.insert(key, next);
        }
        merged
    }

    fn merge_values(existing: &ConfigValue, value: &ConfigValue) -> ConfigValue {
        match (existing, value) {
            (ConfigValue::Array(_), _) | (_, ConfigValue::Array(_)) => {
                let mut items = arraify(existing);
                items.extend(arraify(value));
                ConfigValue::Array(items)
            }
            (ConfigValue::Table(a), ConfigValue::Table(b)) => {
                ConfigValue::Table(Self::merge_tables(a, b))
            }
            _ => value.clone(),
        }
    }
}

fn arraify(value: &ConfigValue) -> Vec<ConfigValue> {
    match value {
        ConfigValue::Array(items) => items.clone(),
        other => vec![other.clone()],
    }
}

impl BundlerConfigMerge for ViteConfigMerge {
    fn merge(&self, base: &ConfigValue, incoming: &ConfigValue) -> ConfigValue {
        match (base, incoming) {
            (_, ConfigValue::Null) => base.clone(),
            (ConfigValue::Null, _) => incoming.clone(),
            _ => Self::merge_values(base, incoming),
        }
    }
}

// ============================================================================
// ConfigMerger
// ============================================================================

/// Deep merge over config trees.
///
/// Pure: equal inputs give structurally equal outputs, which hot reload
/// relies on when it recomposes layers after every change.
#[derive(Clone)]
pub struct ConfigMerger {
    bundler: Arc<dyn BundlerConfigMerge>,
}

impl Default for ConfigMerger {
    fn default() -> Self {
        Self::new(ViteConfigMerge)
    }
}

impl std::fmt::Debug for ConfigMerger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigMerger").finish_non_exhaustive()
    }
}

impl ConfigMerger {
    pub fn new(bundler: impl BundlerConfigMerge + 'static) -> Self {
        Self {
            bundler: Arc::new(bundler),
        }
    }

    /// Merge `incoming` over `base`.
    pub fn merge(&self, incoming: &ConfigTable, base: &ConfigTable) -> ConfigTable {
        let mut merged = base.clone();
        for (key, value) in incoming.iter() {
            if value.is_null() {
                continue;
            }
            let next = match merged.get(key) {
                Some(existing) => self.merge_value(key, existing, value),
                None => value.clone(),
            };
            merged.insert(key, next);
        }
        merged
    }

    fn merge_value(&self, key: &str, base: &ConfigValue, incoming: &ConfigValue) -> ConfigValue {
        if key == BUNDLER_KEY {
            return self.bundler.merge(base, incoming);
        }
        match (base, incoming) {
            (ConfigValue::Hook(a), ConfigValue::Hook(b)) => Hook::compose(a, b).into(),
            (ConfigValue::Table(a), ConfigValue::Table(b)) => self.merge(b, a).into(),
            _ => incoming.clone(),
        }
    }
}

/// Merge with the default (Vite) bundler rule.
pub fn merge_config(incoming: &ConfigTable, base: &ConfigTable) -> ConfigTable {
    ConfigMerger::default().merge(incoming, base)
}
