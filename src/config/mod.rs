//! Valaxy configuration layers and how they combine.
//!
//! # Module Structure
//!
//! ```text
//! config/
//! ├── value.rs      # ConfigValue / ConfigTable / Hook
//! ├── merge.rs      # ConfigMerger, BundlerConfigMerge
//! ├── loader.rs     # ConfigLoader, FsConfigLoader, load_config
//! ├── addon.rs      # add-on folding, define_addon / define_theme
//! ├── defaults.rs   # built-in site and node config
//! └── types/        # ConfigError, BuildError, SharedOptions
//! ```
//!
//! # Layers
//!
//! | File                              | Layer            |
//! |-----------------------------------|------------------|
//! | `<userRoot>/valaxy.config.*`      | user             |
//! | `<userRoot>/site.config.*`        | `siteConfig`     |
//! | `<userRoot>/theme.config.*`       | `themeConfig`    |
//! | `<themeRoot>/valaxy.config.*`     | theme            |
//! | `<addonRoot>/valaxy.config.*`     | one per add-on   |

mod addon;
mod defaults;
mod loader;
mod merge;
pub mod types;
mod value;

pub use addon::{THEME_EXTEND_KEYS, define_addon, define_theme, define_theme_with, resolve_addon_config};
pub use defaults::{default_site_config, default_valaxy_config};
pub use loader::{
    CONFIG_EXTENSIONS, ConfigFactory, ConfigLoader, FactoryContext, FsConfigLoader, LoadedConfig,
    RawConfig, SITE_CONFIG, THEME_CONFIG, VALAXY_CONFIG, config_candidates, is_config_candidate,
    load_config,
};
pub use merge::{BUNDLER_KEY, BundlerConfigMerge, ConfigMerger, ViteConfigMerge, merge_config};
pub use types::{BuildError, ConfigError, SharedOptions};
pub use value::{ConfigTable, ConfigValue, Hook, HookFn};
