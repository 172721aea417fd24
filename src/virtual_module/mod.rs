//! Virtual modules served under `/@valaxy`.
//!
//! | Id                          | Generator                        |
//! |-----------------------------|----------------------------------|
//! | `/@valaxyjs/config`         | [`config::generate_config`]      |
//! | `/@valaxyjs/context`        | [`config::generate_context`]     |
//! | `/@valaxyjs/styles`         | [`styles::generate_styles`]      |
//! | `/@valaxyjs/locales`        | [`locales::generate_locales`]    |
//! | `/@valaxyjs/addons`         | [`addons::generate_addons`]      |
//! | `/@valaxyjs/UserAppVue`     | [`app::generate_app_vue`] (user)  |
//! | `/@valaxyjs/ThemeAppVue`    | [`app::generate_app_vue`] (theme) |
//! | any other `/@valaxy*`       | empty module                     |
//!
//! Generators are pure functions of a [`ResolvedOptions`] snapshot plus a few
//! file existence checks. Nothing is cached here; the host's module graph
//! decides when a module is stale.

pub mod addons;
pub mod app;
pub mod config;
pub mod locales;
pub mod styles;

use std::sync::Arc;

use serde::Serialize;

use crate::config::SharedOptions;
use crate::options::ResolvedOptions;

/// Every id starting with this belongs to the registry.
pub const VALAXY_PREFIX: &str = "/@valaxy";

// =============================================================================
// VirtualModule
// =============================================================================

/// A virtual module id.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum VirtualModule {
    Config,
    Context,
    Styles,
    Locales,
    Addons,
    UserApp,
    ThemeApp,
    /// Any other id under the prefix.
    Reserved(String),
}

impl VirtualModule {
    /// Modules that read the merged config; stale after any config reload.
    pub const CONFIG_BOUND: [Self; 2] = [Self::Config, Self::Context];

    /// Every generated module, excluding [`Reserved`](Self::Reserved).
    pub const GENERATED: [Self; 7] = [
        Self::Config,
        Self::Context,
        Self::Styles,
        Self::Locales,
        Self::Addons,
        Self::UserApp,
        Self::ThemeApp,
    ];

    pub fn id(&self) -> &str {
        match self {
            Self::Config => "/@valaxyjs/config",
            Self::Context => "/@valaxyjs/context",
            Self::Styles => "/@valaxyjs/styles",
            Self::Locales => "/@valaxyjs/locales",
            Self::Addons => "/@valaxyjs/addons",
            Self::UserApp => "/@valaxyjs/UserAppVue",
            Self::ThemeApp => "/@valaxyjs/ThemeAppVue",
            Self::Reserved(id) => id,
        }
    }

    /// Match an id. `None` outside [`VALAXY_PREFIX`].
    pub fn from_id(id: &str) -> Option<Self> {
        if !id.starts_with(VALAXY_PREFIX) {
            return None;
        }
        let module = Self::GENERATED
            .into_iter()
            .find(|m| m.id() == id)
            .unwrap_or_else(|| Self::Reserved(id.to_owned()));
        Some(module)
    }

    /// Generate the module source against `options`.
    pub fn generate(&self, options: &ResolvedOptions) -> ModuleSource {
        let code = match self {
            Self::Config => config::generate_config(options),
            Self::Context => config::generate_context(options),
            Self::Styles => styles::generate_styles(options),
            Self::Locales => locales::generate_locales(options),
            Self::Addons => addons::generate_addons(options),
            Self::UserApp => app::generate_app_vue(&options.user_root),
            Self::ThemeApp => app::generate_app_vue(&options.theme_root),
            Self::Reserved(_) => return ModuleSource::empty(),
        };
        ModuleSource::code(code)
    }
}

impl std::fmt::Display for VirtualModule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.id())
    }
}

// =============================================================================
// ModuleSource
// =============================================================================

/// Source map attached to a generated module.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SourceMap {
    pub mappings: String,
}

/// Result of `load`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModuleSource {
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub map: Option<SourceMap>,
}

impl ModuleSource {
    pub fn code(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            map: None,
        }
    }

    /// Empty code with an empty source map.
    pub fn empty() -> Self {
        Self {
            code: String::new(),
            map: Some(SourceMap::default()),
        }
    }
}

// =============================================================================
// Registry
// =============================================================================

/// Resolves and loads `/@valaxy*` ids against the live options.
#[derive(Debug, Clone)]
pub struct VirtualModuleRegistry {
    options: Arc<SharedOptions>,
}

impl VirtualModuleRegistry {
    pub fn new(options: Arc<SharedOptions>) -> Self {
        Self { options }
    }

    #[inline]
    pub fn owns_id(&self, id: &str) -> bool {
        id.starts_with(VALAXY_PREFIX)
    }

    /// The id itself when owned.
    pub fn resolve_id(&self, id: &str) -> Option<String> {
        self.owns_id(id).then(|| id.to_owned())
    }

    /// Generate `id` against the current snapshot. `None` when not owned.
    pub fn load(&self, id: &str) -> Option<ModuleSource> {
        let module = VirtualModule::from_id(id)?;
        let options = self.options.load();
        Some(module.generate(&options))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::EntryOptions;

    fn registry() -> VirtualModuleRegistry {
        let mut options = ResolvedOptions::from_entry(&EntryOptions::new("/site"));
        options.config = crate::config::default_valaxy_config();
        VirtualModuleRegistry::new(Arc::new(SharedOptions::new(options)))
    }

    #[test]
    fn test_from_id_round_trips_known_ids() {
        for module in VirtualModule::GENERATED {
            assert_eq!(VirtualModule::from_id(module.id()), Some(module.clone()));
        }
        assert_eq!(VirtualModule::from_id("/src/main.ts"), None);
    }

    #[test]
    fn test_unknown_prefixed_id_is_empty_module() {
        let registry = registry();
        assert_eq!(registry.resolve_id("/@valaxyjs/unknown").as_deref(), Some("/@valaxyjs/unknown"));
        let source = registry.load("/@valaxyjs/unknown").unwrap();
        assert_eq!(source, ModuleSource::empty());
        assert_eq!(
            serde_json::to_value(&source).unwrap(),
            serde_json::json!({ "code": "", "map": { "mappings": "" } })
        );
    }

    #[test]
    fn test_foreign_ids_are_not_owned() {
        let registry = registry();
        assert!(!registry.owns_id("/@vite/client"));
        assert_eq!(registry.resolve_id("virtual:foo"), None);
        assert_eq!(registry.load("/src/App.vue"), None);
    }

    #[tokio::test]
    async fn test_load_reads_latest_snapshot() {
        let mut options = ResolvedOptions::from_entry(&EntryOptions::new("/site"));
        options.config = crate::config::default_valaxy_config();
        let shared = Arc::new(SharedOptions::new(options));
        let registry = VirtualModuleRegistry::new(shared.clone());

        let before = registry.load("/@valaxyjs/config").unwrap().code;
        shared
            .update(|current| {
                let mut next = current.clone();
                next.config.table_mut("siteConfig").insert("title", "Reloaded");
                Ok(Some(next))
            })
            .await
            .unwrap()
            .unwrap();
        let after = registry.load("/@valaxyjs/config").unwrap().code;

        assert!(!before.contains("Reloaded"));
        assert!(after.contains("Reloaded"));
    }

    #[test]
    fn test_app_modules_fall_back_to_null_component() {
        let registry = registry();
        assert_eq!(registry.load("/@valaxyjs/UserAppVue").unwrap().code, app::NULL_COMPONENT);
        assert_eq!(registry.load("/@valaxyjs/ThemeAppVue").unwrap().code, app::NULL_COMPONENT);
    }
}
