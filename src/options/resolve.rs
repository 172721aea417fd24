//! Options resolution.
//!
//! Full resolution reads every layer from disk and composes the live config:
//!
//! ```text
//! defaults <- addons <- theme valaxy.config <- user valaxy.config
//!          siteConfig  <- site.config
//!          themeConfig <- theme.config (+ pkg)
//! ```
//!
//! Each `resolve_*_layer` re-reads exactly one layer into a [`ResolvedOptions`]
//! the caller owns, so hot reload can swap a single layer on a snapshot copy
//! and then recompose with [`OptionsResolver::compose`].

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};

use super::{AddonDescriptor, EntryOptions, PackageMeta, Redirect, ResolvedOptions};
use crate::config::{
    ConfigLoader, ConfigMerger, ConfigTable, ConfigValue, FactoryContext, LoadedConfig,
    SITE_CONFIG, THEME_CONFIG, VALAXY_CONFIG, default_valaxy_config, load_config,
    resolve_addon_config,
};
use crate::utils::path::normalize_path;

/// Theme used when neither the caller nor the user config names one.
pub const DEFAULT_THEME: &str = "yun";

const THEME_PREFIX: &str = "valaxy-theme-";
const ADDON_PREFIX: &str = "valaxy-addon-";

/// Locate the theme directory.
///
/// An explicit root wins. A path-like theme name is taken relative to the user
/// root, anything else is an installed `valaxy-theme-<name>` package.
pub(super) fn theme_root(user_root: &Path, theme: &str, explicit: Option<&Path>) -> PathBuf {
    if let Some(root) = explicit {
        return normalize_path(&user_root.join(root));
    }
    if theme.starts_with('.') || Path::new(theme).is_absolute() {
        return normalize_path(&user_root.join(theme));
    }
    // Installed packages are often symlinks (pnpm); changed paths arrive resolved.
    normalize_path(
        &user_root
            .join("node_modules")
            .join(format!("{THEME_PREFIX}{theme}")),
    )
}

/// Builds and re-builds [`ResolvedOptions`].
#[derive(Clone)]
pub struct OptionsResolver {
    loader: Arc<dyn ConfigLoader>,
    merger: ConfigMerger,
}

impl OptionsResolver {
    pub fn new(loader: Arc<dyn ConfigLoader>) -> Self {
        Self {
            loader,
            merger: ConfigMerger::default(),
        }
    }

    /// Use a custom merger, e.g. one with a different bundler merge.
    pub fn with_merger(mut self, merger: ConfigMerger) -> Self {
        self.merger = merger;
        self
    }

    pub fn loader(&self) -> &dyn ConfigLoader {
        self.loader.as_ref()
    }

    pub fn merger(&self) -> &ConfigMerger {
        &self.merger
    }

    /// Resolve everything from scratch.
    pub fn resolve_options(&self, entry: &EntryOptions) -> Result<ResolvedOptions> {
        let mut options = ResolvedOptions::from_entry(entry);

        // The user layer may pick the theme, which moves every theme path.
        let user = self.load_layer(&options, VALAXY_CONFIG, &options.user_root)?;
        if let Some(loaded) = &user {
            crate::log!("config"; "resolve valaxyConfig from {}", loaded.config_file.display());
        }
        if entry.theme.is_none()
            && let Some(theme) = user.as_ref().and_then(|l| l.config.str("theme"))
            && theme != options.theme
        {
            options = ResolvedOptions::from_entry(&entry.clone().with_theme(theme));
            options.entry = entry.clone();
        }
        if let Some(loaded) = user {
            options.config_file = loaded.config_file;
            options.layers.user = loaded.config;
        }

        options.theme_pkg = read_package_meta(&options.theme_root);
        self.resolve_site_layer(&mut options)?;
        self.resolve_theme_config_layer(&mut options)?;
        self.resolve_theme_valaxy_layer(&mut options)?;

        self.process_options(options)
    }

    /// Re-read `site.config`.
    pub fn resolve_site_layer(&self, options: &mut ResolvedOptions) -> Result<()> {
        if let Some(loaded) = self.load_layer(options, SITE_CONFIG, &options.user_root)? {
            options.site_config_file = loaded.config_file;
            options.layers.site = loaded.config;
        } else {
            options.layers.site = ConfigTable::new();
        }
        Ok(())
    }

    /// Re-read the user's `theme.config`.
    pub fn resolve_theme_config_layer(&self, options: &mut ResolvedOptions) -> Result<()> {
        if let Some(loaded) = self.load_layer(options, THEME_CONFIG, &options.user_root)? {
            options.theme_config_file = loaded.config_file;
            options.layers.theme_config = loaded.config;
        } else {
            options.layers.theme_config = ConfigTable::new();
        }
        Ok(())
    }

    /// Re-read the theme's own `valaxy.config`.
    pub fn resolve_theme_valaxy_layer(&self, options: &mut ResolvedOptions) -> Result<()> {
        if let Some(loaded) = self.load_layer(options, VALAXY_CONFIG, &options.theme_root)? {
            crate::debug!("config"; "resolve theme valaxyConfig from {}", loaded.config_file.display());
            options.theme_valaxy_config_file = loaded.config_file;
            options.layers.theme_valaxy = loaded.config;
        } else {
            options.layers.theme_valaxy = ConfigTable::new();
        }
        Ok(())
    }

    /// Re-fold every add-on layer from the current add-on list.
    pub fn resolve_addon_layers(&self, options: &mut ResolvedOptions) -> Result<()> {
        let mut addons = options.addons.clone();
        let folded = resolve_addon_config(&mut addons, options, self.loader(), &self.merger)?;
        options.addons = addons;
        options.layers.addons = folded;
        Ok(())
    }

    /// Derive add-ons and roots from the loaded layers, fold the add-on
    /// layers and compose the config.
    pub fn process_options(&self, mut options: ResolvedOptions) -> Result<ResolvedOptions> {
        options.addons = discover_addons(&options);
        options.roots = vec![
            options.client_root.clone(),
            options.theme_root.clone(),
            options.user_root.clone(),
        ];
        options
            .roots
            .extend(options.addons.iter().map(|addon| addon.root.clone()));

        self.resolve_addon_layers(&mut options)?;
        self.compose(&mut options);
        Ok(options)
    }

    /// Recompose `config` and `redirects` from the stored layers.
    pub fn compose(&self, options: &mut ResolvedOptions) {
        let layers = &options.layers;
        let mut config = default_valaxy_config();
        for layer in [&layers.addons, &layers.theme_valaxy, &layers.user] {
            config = self.merger.merge(layer, &config);
        }

        let site = self
            .merger
            .merge(&layers.site, config.table("siteConfig").unwrap_or(&ConfigTable::new()));
        let mut theme_config = self.merger.merge(
            &layers.theme_config,
            config.table("themeConfig").unwrap_or(&ConfigTable::new()),
        );
        if let Some(pkg) = &options.theme_pkg {
            theme_config.insert("pkg", package_table(pkg));
        }

        config.insert("siteConfig", site);
        config.insert("themeConfig", theme_config);
        config.insert("theme", options.theme.as_str());

        options.redirects = collect_redirects(&config);
        options.config = config;
    }

    fn load_layer(
        &self,
        options: &ResolvedOptions,
        name: &str,
        dir: &Path,
    ) -> Result<Option<LoadedConfig>> {
        let ctx = FactoryContext {
            options,
            addon: None,
        };
        load_config(self.loader(), name, dir, |raw| raw.resolve(&ctx))
            .with_context(|| format!("failed to resolve {name} in {}", dir.display()))
    }
}

impl std::fmt::Debug for OptionsResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OptionsResolver")
            .field("merger", &self.merger)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Add-on discovery
// ============================================================================

/// Add-on entries from the theme layer then the user layer.
///
/// An entry is either a package name or `{ name, global, props, root, enable }`.
/// A later entry with the same name replaces the earlier one in place;
/// `enable = false` removes it.
fn discover_addons(options: &ResolvedOptions) -> Vec<AddonDescriptor> {
    let mut addons: Vec<AddonDescriptor> = Vec::new();

    let layers = [&options.layers.theme_valaxy, &options.layers.user];
    let entries = layers
        .into_iter()
        .filter_map(|layer| layer.get("addons").and_then(ConfigValue::as_array))
        .flatten();

    for entry in entries {
        let Some((addon, enabled)) = parse_addon_entry(entry, &options.user_root) else {
            crate::log!("config"; "invalid addon entry ignored: {}", entry.to_json());
            continue;
        };
        let existing = addons.iter().position(|a| a.name == addon.name);
        match (existing, enabled) {
            (Some(i), true) => addons[i] = addon,
            (Some(i), false) => {
                addons.remove(i);
            }
            (None, true) => addons.push(addon),
            (None, false) => {}
        }
    }

    addons.retain(|addon| {
        let exists = addon.root.is_dir();
        if !exists {
            crate::log!("config"; "addon {} not found at {}", addon.name, addon.root.display());
        }
        exists
    });
    addons
}

fn parse_addon_entry(entry: &ConfigValue, user_root: &Path) -> Option<(AddonDescriptor, bool)> {
    let (name, table) = match entry {
        ConfigValue::String(name) => (name.as_str(), None),
        ConfigValue::Table(table) => (table.str("name")?, Some(table)),
        _ => return None,
    };
    let name = if name.starts_with(ADDON_PREFIX) {
        name.to_owned()
    } else {
        format!("{ADDON_PREFIX}{name}")
    };

    let root = table
        .and_then(|t| t.str("root"))
        .map(|root| normalize_path(&user_root.join(root)))
        .unwrap_or_else(|| normalize_path(&user_root.join("node_modules").join(&name)));

    let mut addon = AddonDescriptor::new(name, root);
    let Some(table) = table else {
        return Some((addon, true));
    };
    addon.global = table.bool("global").unwrap_or(false);
    if let Some(props) = table.get("props") {
        addon.props = props.to_json();
    }
    Some((addon, table.bool("enable").unwrap_or(true)))
}

// ============================================================================
// Derived fields
// ============================================================================

/// `siteConfig.redirects.rules`: `{ from: string | string[], to: string }`.
fn collect_redirects(config: &ConfigTable) -> Vec<Redirect> {
    let Some(rules) = config
        .get_path("siteConfig.redirects.rules")
        .and_then(ConfigValue::as_array)
    else {
        return Vec::new();
    };

    let mut redirects = Vec::new();
    for rule in rules.iter().filter_map(ConfigValue::as_table) {
        let Some(to) = rule.str("to") else {
            continue;
        };
        let from: Vec<&str> = match rule.get("from") {
            Some(ConfigValue::String(from)) => vec![from.as_str()],
            Some(ConfigValue::Array(from)) => from.iter().filter_map(ConfigValue::as_str).collect(),
            _ => continue,
        };
        redirects.extend(from.into_iter().map(|from| Redirect {
            from: from.to_owned(),
            to: to.to_owned(),
        }));
    }
    redirects
}

/// The theme's `package.json`, if readable.
fn read_package_meta(theme_root: &Path) -> Option<PackageMeta> {
    let path = theme_root.join("package.json");
    let content = fs::read_to_string(&path).ok()?;
    match serde_json::from_str(&content) {
        Ok(pkg) => Some(pkg),
        Err(err) => {
            crate::log!("config"; "ignoring {}: {}", path.display(), err);
            None
        }
    }
}

fn package_table(pkg: &PackageMeta) -> ConfigTable {
    let mut table = ConfigTable::new();
    table.insert("name", pkg.name.as_str());
    table.insert("version", pkg.version.as_str());
    if let Some(homepage) = &pkg.homepage {
        table.insert("homepage", homepage.as_str());
    }
    if let Some(description) = &pkg.description {
        table.insert("description", description.as_str());
    }
    table
}
