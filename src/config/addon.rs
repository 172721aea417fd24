//! Add-on config folding and theme/add-on definition helpers.

use std::sync::Arc;

use anyhow::{Result, anyhow};

use super::loader::{ConfigLoader, FactoryContext, RawConfig, VALAXY_CONFIG, load_config};
use super::merge::ConfigMerger;
use super::value::ConfigTable;
use crate::options::{AddonDescriptor, ResolvedOptions};

/// Keys a theme layer may contribute besides `themeConfig`.
pub const THEME_EXTEND_KEYS: &[&str] = &[
    "vite",
    "vue",
    "unocss",
    "unocssPresets",
    "markdown",
    "extendMd",
    "addons",
];

/// Fold every add-on's own `valaxy.config` layer, in add-on order.
///
/// An add-on without a config file in its own root is skipped before the
/// loader is consulted, so a loader that searches elsewhere can never hand
/// back the user's root config for it. Sets `config_file` on every add-on
/// whose layer was loaded.
pub fn resolve_addon_config(
    addons: &mut [AddonDescriptor],
    options: &ResolvedOptions,
    loader: &dyn ConfigLoader,
    merger: &ConfigMerger,
) -> Result<ConfigTable> {
    let mut folded = ConfigTable::new();

    for addon in addons.iter_mut() {
        if loader.local_config_file(VALAXY_CONFIG, &addon.root).is_none() {
            crate::debug!("config"; "addon {} has no valaxy.config", addon.name);
            continue;
        }

        let ctx = FactoryContext {
            options,
            addon: Some(&*addon),
        };
        let loaded = load_config(loader, VALAXY_CONFIG, &addon.root, |raw| raw.resolve(&ctx))?;
        let Some(loaded) = loaded else {
            continue;
        };

        crate::debug!("config"; "addon {} config from {}", addon.name, loaded.config_file.display());
        addon.config_file = Some(loaded.config_file);
        folded = merger.merge(&loaded.config, &folded);
    }

    Ok(folded)
}

// ============================================================================
// Definition helpers
// ============================================================================

/// Define an add-on whose config depends on its descriptor and the session.
///
/// ```ignore
/// loader.define(addon_root, VALAXY_CONFIG, define_addon(|addon, _options| {
///     let mut config = ConfigTable::new();
///     config.table_mut("runtimeConfig").table_mut("addons").insert(&addon.name, true);
///     Ok(config)
/// }));
/// ```
pub fn define_addon<F>(factory: F) -> RawConfig
where
    F: Fn(&AddonDescriptor, &ResolvedOptions) -> Result<ConfigTable> + Send + Sync + 'static,
{
    RawConfig::Factory(Arc::new(move |ctx: &FactoryContext<'_>| {
        let addon = ctx
            .addon
            .ok_or_else(|| anyhow!("add-on config evaluated without an add-on"))?;
        factory(addon, ctx.options)
    }))
}

/// Define a theme layer from a table.
///
/// Only `themeConfig` and [`THEME_EXTEND_KEYS`] are kept; anything else is
/// dropped with a warning.
pub fn define_theme(theme: ConfigTable) -> RawConfig {
    RawConfig::Table(retain_theme_keys(theme))
}

/// Define a theme layer computed from the session options.
pub fn define_theme_with<F>(factory: F) -> RawConfig
where
    F: Fn(&ResolvedOptions) -> Result<ConfigTable> + Send + Sync + 'static,
{
    RawConfig::Factory(Arc::new(move |ctx: &FactoryContext<'_>| {
        factory(ctx.options).map(retain_theme_keys)
    }))
}

fn retain_theme_keys(mut theme: ConfigTable) -> ConfigTable {
    theme.retain(|key, _| {
        let keep = key == "themeConfig" || THEME_EXTEND_KEYS.contains(&key);
        if !keep {
            crate::log!("config"; "theme key `{}` is not extendable, ignored", key);
        }
        keep
    });
    theme
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{FsConfigLoader, Hook, merge_config};
    use crate::options::EntryOptions;
    use parking_lot::Mutex;
    use serde_json::json;
    use std::fs;
    use std::path::{Path, PathBuf};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    /// Counts `load_raw` calls, delegating to the filesystem loader.
    #[derive(Default)]
    struct CountingLoader {
        inner: FsConfigLoader,
        loads: AtomicUsize,
    }

    impl ConfigLoader for CountingLoader {
        fn load_raw(
            &self,
            name: &str,
            cwd: &Path,
        ) -> Result<Option<(RawConfig, PathBuf)>, crate::config::ConfigError> {
            self.loads.fetch_add(1, Ordering::SeqCst);
            self.inner.load_raw(name, cwd)
        }
    }

    fn addon_dir(temp: &TempDir, name: &str, config: Option<&str>) -> AddonDescriptor {
        let root = temp.path().join(name);
        fs::create_dir_all(&root).unwrap();
        if let Some(config) = config {
            fs::write(root.join("valaxy.config.toml"), config).unwrap();
        }
        AddonDescriptor::new(name, root)
    }

    fn options(temp: &TempDir) -> ResolvedOptions {
        ResolvedOptions::from_entry(&EntryOptions::new(temp.path()))
    }

    #[test]
    fn test_later_addon_wins_scalars() {
        let temp = TempDir::new().unwrap();
        let mut addons = vec![
            addon_dir(&temp, "x", Some("title = \"x\"\n[features]\nkatex = false")),
            addon_dir(&temp, "y", Some("title = \"y\"")),
        ];

        let folded = resolve_addon_config(
            &mut addons,
            &options(&temp),
            &FsConfigLoader::new(),
            &ConfigMerger::default(),
        )
        .unwrap();

        assert_eq!(folded.to_json(), json!({ "title": "y", "features": { "katex": false } }));
        assert_eq!(
            addons[0].config_file.as_deref(),
            Some(temp.path().join("x/valaxy.config.toml").as_path())
        );
    }

    #[test]
    fn test_addon_hooks_run_in_addon_order() {
        let temp = TempDir::new().unwrap();
        let calls = Arc::new(Mutex::new(Vec::new()));
        let loader = FsConfigLoader::new();
        let mut addons = vec![addon_dir(&temp, "x", None), addon_dir(&temp, "y", None)];

        for addon in &addons {
            let calls = calls.clone();
            loader.define(
                &addon.root,
                VALAXY_CONFIG,
                define_addon(move |addon, _| {
                    let (calls, name) = (calls.clone(), addon.name.clone());
                    let mut config = ConfigTable::new();
                    config.insert("setup", Hook::new(move |_| calls.lock().push(name.clone())));
                    Ok(config)
                }),
            );
        }

        let folded =
            resolve_addon_config(&mut addons, &options(&temp), &loader, &ConfigMerger::default())
                .unwrap();
        folded.get("setup").and_then(|v| v.as_hook()).unwrap().call(&mut json!({}));

        assert_eq!(*calls.lock(), ["x", "y"]);
    }

    #[test]
    fn test_addon_without_local_file_is_never_loaded() {
        let temp = TempDir::new().unwrap();
        // A config in the parent directory must not leak into the add-on.
        fs::write(temp.path().join("valaxy.config.toml"), "title = \"user\"").unwrap();
        let mut addons = vec![addon_dir(&temp, "bare", None)];
        let loader = CountingLoader::default();

        let folded =
            resolve_addon_config(&mut addons, &options(&temp), &loader, &ConfigMerger::default())
                .unwrap();

        assert_eq!(loader.loads.load(Ordering::SeqCst), 0);
        assert!(folded.is_empty());
        assert!(addons[0].config_file.is_none());
    }

    #[test]
    fn test_factory_error_propagates() {
        let temp = TempDir::new().unwrap();
        let loader = FsConfigLoader::new();
        let mut addons = vec![addon_dir(&temp, "broken", None)];
        loader.define(
            &addons[0].root,
            VALAXY_CONFIG,
            define_addon(|_, _| Err(anyhow!("bad addon"))),
        );

        let err =
            resolve_addon_config(&mut addons, &options(&temp), &loader, &ConfigMerger::default())
                .unwrap_err();
        assert!(format!("{err:#}").contains("bad addon"));
    }

    #[test]
    fn test_define_theme_drops_unknown_keys() {
        let raw = define_theme(ConfigTable::from(json!({
            "themeConfig": { "colors": { "primary": "#0078E7" } },
            "vite": { "plugins": [] },
            "siteConfig": { "title": "not allowed" }
        })));
        let RawConfig::Table(table) = raw else {
            panic!("expected table");
        };
        let keys: Vec<_> = table.keys().collect();
        assert_eq!(keys, ["themeConfig", "vite"]);
        // Still a normal layer for the merger.
        let merged = merge_config(&table, &ConfigTable::new());
        assert_eq!(merged.get_path("themeConfig.colors.primary").and_then(|v| v.as_str()), Some("#0078E7"));
    }
}
