//! Resolved session options.
//!
//! # Module Structure
//!
//! ```text
//! options/
//! ├── mod.rs       # ResolvedOptions, AddonDescriptor, EntryOptions (this file)
//! ├── layers.rs    # ConfigLayers + ConfigLayer tag
//! └── resolve.rs   # OptionsResolver: full and per-layer resolution
//! ```
//!
//! `ResolvedOptions` is created once per session and then replaced
//! snapshot-by-snapshot through [`SharedOptions`](crate::config::SharedOptions).

mod layers;
mod resolve;

pub use layers::{ConfigLayer, ConfigLayers};
pub use resolve::{DEFAULT_THEME, OptionsResolver};

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::config::{ConfigTable, SITE_CONFIG, THEME_CONFIG, VALAXY_CONFIG};
use crate::utils::path::normalize_path;

// ============================================================================
// BuildMode
// ============================================================================

/// Build mode configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildMode {
    /// `NODE_ENV=production` equivalent; drives runtime redirect handling.
    pub production: bool,
    /// Dev server is running and registers watch files.
    pub watch: bool,
}

impl BuildMode {
    /// Production mode: static build, no watcher.
    pub const PRODUCTION: Self = Self {
        production: true,
        watch: false,
    };

    /// Development mode: includes hot reload support.
    pub const DEVELOPMENT: Self = Self {
        production: false,
        watch: true,
    };

    #[inline]
    pub const fn is_dev(&self) -> bool {
        self.watch
    }
}

impl Default for BuildMode {
    fn default() -> Self {
        Self::DEVELOPMENT
    }
}

// ============================================================================
// EntryOptions
// ============================================================================

/// What the caller knows before any config is read.
#[derive(Debug, Clone)]
pub struct EntryOptions {
    pub user_root: PathBuf,
    /// Theme name; falls back to the user config's `theme`, then [`DEFAULT_THEME`].
    pub theme: Option<String>,
    pub theme_root: Option<PathBuf>,
    pub client_root: Option<PathBuf>,
    pub mode: BuildMode,
}

impl EntryOptions {
    pub fn new(user_root: impl Into<PathBuf>) -> Self {
        Self {
            user_root: user_root.into(),
            theme: None,
            theme_root: None,
            client_root: None,
            mode: BuildMode::default(),
        }
    }

    pub fn with_theme(mut self, theme: impl Into<String>) -> Self {
        self.theme = Some(theme.into());
        self
    }

    pub fn with_theme_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.theme_root = Some(root.into());
        self
    }

    pub fn with_client_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.client_root = Some(root.into());
        self
    }

    pub fn with_mode(mut self, mode: BuildMode) -> Self {
        self.mode = mode;
        self
    }
}

// ============================================================================
// AddonDescriptor
// ============================================================================

/// A resolved add-on.
///
/// Fixed after discovery except `config_file`, which is set once the add-on's
/// own config layer has been loaded.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AddonDescriptor {
    pub name: String,
    pub root: PathBuf,
    /// Mount the add-on's `App.vue` globally.
    pub global: bool,
    pub props: serde_json::Value,
    pub config_file: Option<PathBuf>,
}

impl AddonDescriptor {
    pub fn new(name: impl Into<String>, root: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            root: root.into(),
            global: false,
            props: serde_json::Value::Object(serde_json::Map::new()),
            config_file: None,
        }
    }

    pub fn global(mut self, global: bool) -> Self {
        self.global = global;
        self
    }

    pub fn with_props(mut self, props: serde_json::Value) -> Self {
        self.props = props;
        self
    }
}

/// A `from -> to` route redirect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Redirect {
    pub from: String,
    pub to: String,
}

/// Theme `package.json` fields exposed as `themeConfig.pkg`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, serde::Deserialize)]
pub struct PackageMeta {
    pub name: String,
    #[serde(default)]
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub homepage: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

// ============================================================================
// ResolvedOptions
// ============================================================================

/// Everything the virtual modules and the reload coordinator read.
#[derive(Debug, Clone)]
pub struct ResolvedOptions {
    /// Entry options this session was resolved from.
    pub entry: EntryOptions,
    pub mode: BuildMode,
    /// Merged site + theme + add-on configuration.
    pub config: ConfigTable,
    /// Raw per-layer values `config` is composed from.
    pub layers: ConfigLayers,
    /// Content roots in cascade order: client, theme, user, add-ons.
    pub roots: Vec<PathBuf>,
    pub user_root: PathBuf,
    pub theme_root: PathBuf,
    pub client_root: PathBuf,
    pub theme: String,
    pub theme_pkg: Option<PackageMeta>,
    /// User `valaxy.config` path (a default candidate when absent).
    pub config_file: PathBuf,
    pub site_config_file: PathBuf,
    pub theme_config_file: PathBuf,
    /// The theme's own `valaxy.config` path.
    pub theme_valaxy_config_file: PathBuf,
    pub addons: Vec<AddonDescriptor>,
    pub redirects: Vec<Redirect>,
    /// Page directories, content-relative paths are computed against these.
    pub pages: Vec<PathBuf>,
}

impl ResolvedOptions {
    /// Options with paths derived from `entry` and no layers loaded yet.
    pub fn from_entry(entry: &EntryOptions) -> Self {
        let user_root = normalize_path(&entry.user_root);
        let theme = entry.theme.clone().unwrap_or_else(|| DEFAULT_THEME.to_owned());
        let theme_root = resolve::theme_root(&user_root, &theme, entry.theme_root.as_deref());
        let client_root = entry
            .client_root
            .as_deref()
            .map(|root| normalize_path(&user_root.join(root)))
            .unwrap_or_else(|| user_root.join("node_modules").join("valaxy").join("client"));

        Self {
            entry: entry.clone(),
            mode: entry.mode,
            config: ConfigTable::new(),
            layers: ConfigLayers::default(),
            roots: vec![client_root.clone(), theme_root.clone(), user_root.clone()],
            config_file: default_candidate(&user_root, VALAXY_CONFIG),
            site_config_file: default_candidate(&user_root, SITE_CONFIG),
            theme_config_file: default_candidate(&user_root, THEME_CONFIG),
            theme_valaxy_config_file: default_candidate(&theme_root, VALAXY_CONFIG),
            pages: vec![user_root.join("pages")],
            user_root,
            theme_root,
            client_root,
            theme,
            theme_pkg: None,
            addons: Vec::new(),
            redirects: Vec::new(),
        }
    }

    pub fn public_dir(&self) -> PathBuf {
        self.user_root.join("public")
    }

    /// `ignoreDeadLinks` from the merged config.
    pub fn ignore_dead_links(&self) -> bool {
        self.config.bool("ignoreDeadLinks").unwrap_or(false)
    }
}

fn default_candidate(dir: &Path, name: &str) -> PathBuf {
    crate::config::config_candidates(name, dir)
        .next()
        .unwrap_or_else(|| dir.join(name))
}
