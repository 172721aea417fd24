//! Config layer loading.
//!
//! A [`ConfigLoader`] finds `<name>.<ext>` in a directory and returns the raw
//! layer, which is either a plain table or a factory. [`load_config`] applies a
//! `rewrite` step that turns factories into concrete tables.
//!
//! [`FsConfigLoader`] reads TOML/JSON files and accepts programmatic
//! definitions (see [`define_theme`](super::define_theme) and
//! [`define_addon`](super::define_addon)) registered per directory.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use super::types::ConfigError;
use super::value::{ConfigTable, ConfigValue};
use crate::options::{AddonDescriptor, ResolvedOptions};

/// Extensions probed for every config layer, in priority order.
pub const CONFIG_EXTENSIONS: &[&str] = &["toml", "json"];

/// Base name of the user, theme and add-on config layers.
pub const VALAXY_CONFIG: &str = "valaxy.config";
/// Base name of the site config layer.
pub const SITE_CONFIG: &str = "site.config";
/// Base name of the theme config layer.
pub const THEME_CONFIG: &str = "theme.config";

/// Arguments a config factory is invoked with.
pub struct FactoryContext<'a> {
    pub options: &'a ResolvedOptions,
    /// Set when the factory belongs to an add-on.
    pub addon: Option<&'a AddonDescriptor>,
}

pub type ConfigFactory = dyn Fn(&FactoryContext<'_>) -> Result<ConfigTable> + Send + Sync;

/// A config layer before `rewrite`.
#[derive(Clone)]
pub enum RawConfig {
    Table(ConfigTable),
    Factory(Arc<ConfigFactory>),
}

impl RawConfig {
    /// Resolve to a table, invoking a factory with `ctx`.
    pub fn resolve(self, ctx: &FactoryContext<'_>) -> Result<ConfigTable> {
        match self {
            Self::Table(table) => Ok(table),
            Self::Factory(factory) => factory(ctx),
        }
    }
}

impl fmt::Debug for RawConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Table(t) => f.debug_tuple("Table").field(t).finish(),
            Self::Factory(_) => f.write_str("Factory(..)"),
        }
    }
}

/// A loaded and rewritten layer.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: ConfigTable,
    pub config_file: PathBuf,
}

/// Config discovery and parsing.
pub trait ConfigLoader: Send + Sync {
    /// Find and parse `name` in `cwd`. `Ok(None)` when no layer exists.
    fn load_raw(&self, name: &str, cwd: &Path) -> Result<Option<(RawConfig, PathBuf)>, ConfigError>;

    /// Direct existence test for a layer owned by `cwd` itself.
    ///
    /// Callers that must not pick up a layer from anywhere but `cwd` check this
    /// before calling [`load_raw`](Self::load_raw).
    fn local_config_file(&self, name: &str, cwd: &Path) -> Option<PathBuf> {
        config_candidates(name, cwd).find(|p| p.is_file())
    }
}

/// `cwd/name.<ext>` for every supported extension.
pub fn config_candidates<'a>(name: &'a str, cwd: &'a Path) -> impl Iterator<Item = PathBuf> + 'a {
    CONFIG_EXTENSIONS
        .iter()
        .map(move |ext| cwd.join(format!("{name}.{ext}")))
}

/// Whether `path` is a candidate file of layer `name` in `dir`.
pub fn is_config_candidate(path: &Path, name: &str, dir: &Path) -> bool {
    path.parent() == Some(dir) && config_candidates(name, dir).any(|c| c == path)
}

/// Load a layer and rewrite it into a concrete table.
pub fn load_config(
    loader: &dyn ConfigLoader,
    name: &str,
    cwd: &Path,
    rewrite: impl FnOnce(RawConfig) -> Result<ConfigTable>,
) -> Result<Option<LoadedConfig>> {
    let Some((raw, config_file)) = loader.load_raw(name, cwd)? else {
        return Ok(None);
    };
    let config = rewrite(raw)
        .with_context(|| format!("failed to evaluate `{}`", config_file.display()))?;
    Ok(Some(LoadedConfig {
        config,
        config_file,
    }))
}

// ============================================================================
// FsConfigLoader
// ============================================================================

/// Loads `<name>.toml` / `<name>.json` from exactly `cwd` (no upward search).
#[derive(Default)]
pub struct FsConfigLoader {
    defined: RwLock<FxHashMap<(PathBuf, String), RawConfig>>,
}

impl FsConfigLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a programmatic layer for `dir`.
    ///
    /// It shadows files of the same layer in that directory and is reported
    /// under the path of the first candidate file.
    pub fn define(&self, dir: impl Into<PathBuf>, name: &str, raw: RawConfig) {
        self.defined.write().insert((dir.into(), name.to_owned()), raw);
    }

    fn defined(&self, name: &str, cwd: &Path) -> Option<RawConfig> {
        self.defined
            .read()
            .get(&(cwd.to_path_buf(), name.to_owned()))
            .cloned()
    }

    fn parse_file(path: &Path) -> Result<ConfigTable, ConfigError> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;

        let value = match path.extension().and_then(|e| e.to_str()) {
            Some("json") => ConfigValue::from(
                serde_json::from_str::<serde_json::Value>(&content)
                    .map_err(|err| ConfigError::Json(path.to_path_buf(), err))?,
            ),
            _ => ConfigValue::from(
                toml::from_str::<toml::Value>(&content)
                    .map_err(|err| ConfigError::Toml(path.to_path_buf(), err))?,
            ),
        };

        match value {
            ConfigValue::Table(table) => Ok(table),
            _ => Err(ConfigError::NotATable(path.to_path_buf())),
        }
    }
}

impl ConfigLoader for FsConfigLoader {
    fn load_raw(&self, name: &str, cwd: &Path) -> Result<Option<(RawConfig, PathBuf)>, ConfigError> {
        if let Some(raw) = self.defined(name, cwd) {
            let path = config_candidates(name, cwd)
                .next()
                .unwrap_or_else(|| cwd.join(name));
            return Ok(Some((raw, path)));
        }

        let Some(path) = config_candidates(name, cwd).find(|p| p.is_file()) else {
            return Ok(None);
        };
        crate::debug!("config"; "parse {}", path.display());
        let table = Self::parse_file(&path)?;
        Ok(Some((RawConfig::Table(table), path)))
    }

    fn local_config_file(&self, name: &str, cwd: &Path) -> Option<PathBuf> {
        if self.defined(name, cwd).is_some() {
            return config_candidates(name, cwd).next();
        }
        config_candidates(name, cwd).find(|p| p.is_file())
    }
}
