//! Configuration tree with declared hook fields.
//!
//! Layers are plain data plus [`Hook`] values. Hooks are tagged at
//! construction so the merge algebra dispatches on the variant instead of
//! probing runtime types.

use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};
use rustc_hash::FxHashMap;
use serde_json::Value as Json;
use std::fmt;
use std::sync::Arc;

/// Callable stored in a config tree.
///
/// Receives the shared call context. Hooks return nothing.
pub type HookFn = dyn Fn(&mut Json) + Send + Sync;

/// A composable config hook (setup callbacks, markdown extenders, ...).
#[derive(Clone)]
pub struct Hook(Arc<HookFn>);

impl Hook {
    pub fn new(f: impl Fn(&mut Json) + Send + Sync + 'static) -> Self {
        Self(Arc::new(f))
    }

    #[inline]
    pub fn call(&self, ctx: &mut Json) {
        (self.0)(ctx)
    }

    /// Hook that runs `base` first and `incoming` second with the same context.
    pub fn compose(base: &Hook, incoming: &Hook) -> Hook {
        let (first, second) = (Arc::clone(&base.0), Arc::clone(&incoming.0));
        Hook::new(move |ctx| {
            first(ctx);
            second(ctx);
        })
    }

    pub fn ptr_eq(&self, other: &Hook) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Hook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Hook(..)")
    }
}

// ============================================================================
// ConfigValue
// ============================================================================

/// A node of a configuration tree.
#[derive(Debug, Clone, Default)]
pub enum ConfigValue {
    #[default]
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
    Array(Vec<ConfigValue>),
    Table(ConfigTable),
    Hook(Hook),
}

impl ConfigValue {
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_table(&self) -> Option<&ConfigTable> {
        match self {
            Self::Table(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[ConfigValue]> {
        match self {
            Self::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_hook(&self) -> Option<&Hook> {
        match self {
            Self::Hook(h) => Some(h),
            _ => None,
        }
    }

    /// Plain JSON view. Hooks are dropped from tables and become `null` in arrays.
    pub fn to_json(&self) -> Json {
        serde_json::to_value(self).unwrap_or(Json::Null)
    }
}

impl PartialEq for ConfigValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Integer(a), Self::Integer(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a == b,
            (Self::String(a), Self::String(b)) => a == b,
            (Self::Array(a), Self::Array(b)) => a == b,
            (Self::Table(a), Self::Table(b)) => a == b,
            (Self::Hook(a), Self::Hook(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

impl Serialize for ConfigValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Null | Self::Hook(_) => serializer.serialize_unit(),
            Self::Bool(b) => serializer.serialize_bool(*b),
            Self::Integer(i) => serializer.serialize_i64(*i),
            Self::Float(f) => serializer.serialize_f64(*f),
            Self::String(s) => serializer.serialize_str(s),
            Self::Array(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Self::Table(table) => table.serialize(serializer),
        }
    }
}

impl From<Json> for ConfigValue {
    fn from(value: Json) -> Self {
        match value {
            Json::Null => Self::Null,
            Json::Bool(b) => Self::Bool(b),
            Json::Number(n) => n
                .as_i64()
                .map(Self::Integer)
                .unwrap_or_else(|| Self::Float(n.as_f64().unwrap_or_default())),
            Json::String(s) => Self::String(s),
            Json::Array(items) => Self::Array(items.into_iter().map(Self::from).collect()),
            Json::Object(map) => Self::Table(map.into_iter().map(|(k, v)| (k, v.into())).collect()),
        }
    }
}

impl From<toml::Value> for ConfigValue {
    fn from(value: toml::Value) -> Self {
        match value {
            toml::Value::String(s) => Self::String(s),
            toml::Value::Integer(i) => Self::Integer(i),
            toml::Value::Float(f) => Self::Float(f),
            toml::Value::Boolean(b) => Self::Bool(b),
            toml::Value::Datetime(dt) => Self::String(dt.to_string()),
            toml::Value::Array(items) => Self::Array(items.into_iter().map(Self::from).collect()),
            toml::Value::Table(map) => {
                Self::Table(map.into_iter().map(|(k, v)| (k, v.into())).collect())
            }
        }
    }
}

impl From<&str> for ConfigValue {
    fn from(s: &str) -> Self {
        Self::String(s.to_owned())
    }
}

impl From<String> for ConfigValue {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<bool> for ConfigValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for ConfigValue {
    fn from(i: i64) -> Self {
        Self::Integer(i)
    }
}

impl From<ConfigTable> for ConfigValue {
    fn from(t: ConfigTable) -> Self {
        Self::Table(t)
    }
}

impl From<Hook> for ConfigValue {
    fn from(h: Hook) -> Self {
        Self::Hook(h)
    }
}

// ============================================================================
// ConfigTable
// ============================================================================

/// Insertion-ordered map of config keys.
///
/// Order is kept so serialized config modules are stable across reloads.
/// Lookups go through a key index into `entries`.
#[derive(Clone, Default)]
pub struct ConfigTable {
    entries: Vec<(String, ConfigValue)>,
    index: FxHashMap<String, usize>,
}

impl ConfigTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&ConfigValue> {
        self.index.get(key).map(|&i| &self.entries[i].1)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut ConfigValue> {
        let i = *self.index.get(key)?;
        Some(&mut self.entries[i].1)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Insert or replace in place (existing keys keep their position).
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<ConfigValue>) {
        let key = key.into();
        let value = value.into();
        match self.index.get(&key) {
            Some(&i) => self.entries[i].1 = value,
            None => {
                self.index.insert(key.clone(), self.entries.len());
                self.entries.push((key, value));
            }
        }
    }

    pub fn remove(&mut self, key: &str) -> Option<ConfigValue> {
        let idx = self.index.remove(key)?;
        let (_, value) = self.entries.remove(idx);
        self.reindex_from(idx);
        Some(value)
    }

    /// Re-point the index at entries from `start` on after a shift.
    fn reindex_from(&mut self, start: usize) {
        for (i, (k, _)) in self.entries.iter().enumerate().skip(start) {
            if let Some(slot) = self.index.get_mut(k) {
                *slot = i;
            }
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ConfigValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn retain(&mut self, mut f: impl FnMut(&str, &ConfigValue) -> bool) {
        let index = &mut self.index;
        self.entries.retain(|(k, v)| {
            let keep = f(k, v);
            if !keep {
                index.remove(k);
            }
            keep
        });
        self.reindex_from(0);
    }

    pub fn table(&self, key: &str) -> Option<&ConfigTable> {
        self.get(key).and_then(ConfigValue::as_table)
    }

    /// Mutable sub-table, created (or replacing a non-table value) when missing.
    pub fn table_mut(&mut self, key: &str) -> &mut ConfigTable {
        if !matches!(self.get(key), Some(ConfigValue::Table(_))) {
            self.insert(key, ConfigTable::new());
        }
        match self.get_mut(key) {
            Some(ConfigValue::Table(t)) => t,
            _ => unreachable!("table inserted above"),
        }
    }

    pub fn str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(ConfigValue::as_str)
    }

    pub fn bool(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(ConfigValue::as_bool)
    }

    /// Look up a dotted path, e.g. `siteConfig.redirects.useVueRouter`.
    pub fn get_path(&self, path: &str) -> Option<&ConfigValue> {
        let mut parts = path.split('.');
        let mut current = self.get(parts.next()?)?;
        for part in parts {
            current = current.as_table()?.get(part)?;
        }
        Some(current)
    }

    pub fn to_json(&self) -> Json {
        serde_json::to_value(self).unwrap_or(Json::Null)
    }
}

impl fmt::Debug for ConfigTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

/// Same keys and values in the same order.
impl PartialEq for ConfigTable {
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}

impl Serialize for ConfigTable {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let visible = self
            .entries
            .iter()
            .filter(|(_, v)| !matches!(v, ConfigValue::Hook(_)));
        let mut map = serializer.serialize_map(None)?;
        for (k, v) in visible {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

impl FromIterator<(String, ConfigValue)> for ConfigTable {
    fn from_iter<I: IntoIterator<Item = (String, ConfigValue)>>(iter: I) -> Self {
        let iter = iter.into_iter();
        let mut table = Self {
            entries: Vec::with_capacity(iter.size_hint().0),
            index: FxHashMap::default(),
        };
        for (k, v) in iter {
            table.insert(k, v);
        }
        table
    }
}

impl IntoIterator for ConfigTable {
    type Item = (String, ConfigValue);
    type IntoIter = std::vec::IntoIter<(String, ConfigValue)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl From<Json> for ConfigTable {
    /// Non-object JSON yields an empty table.
    fn from(value: Json) -> Self {
        match ConfigValue::from(value) {
            ConfigValue::Table(t) => t,
            _ => Self::new(),
        }
    }
}
