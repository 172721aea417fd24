//! Valaxy loader - virtual modules and config hot reload for valaxy sites.
//!
//! # Architecture
//!
//! ```text
//! EntryOptions ──► OptionsResolver ──► ResolvedOptions ──► SharedOptions
//!                   (config layers)                          │   ▲
//!                                                     load   │   │ update
//!                                      VirtualModuleRegistry ◄┘   │
//!                                                                │
//!          FsWatcher ──► HotReloadCoordinator ───────────────────┘
//!                              │
//!                              └──► ContentPipeline ──► DevServer (pageData)
//! ```
//!
//! [`ValaxyLoader`] bundles all of it behind the hooks a bundler plugin
//! answers.

pub mod config;
pub mod content;
pub mod logger;
pub mod options;
pub mod plugin;
pub mod reload;
pub mod utils;
pub mod virtual_module;
pub mod watch;

pub use config::{
    BuildError, ConfigError, ConfigLoader, ConfigMerger, ConfigTable, ConfigValue, FsConfigLoader,
    Hook, SharedOptions, define_addon, define_theme,
};
pub use content::{CompiledContent, ContentCompiler, ContentPipeline};
pub use options::{AddonDescriptor, BuildMode, EntryOptions, OptionsResolver, ResolvedOptions};
pub use plugin::{PLUGIN_NAME, ValaxyLoader};
pub use reload::{DevServer, HmrEvent, HotReloadCoordinator, HotUpdate, HotUpdateContext};
pub use virtual_module::{ModuleSource, VirtualModule, VirtualModuleRegistry};
