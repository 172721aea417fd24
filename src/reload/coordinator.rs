//! Hot update coordinator.
//!
//! ```text
//! changed file ──► categorize_path ──► Config(layer) ──► SharedOptions::update
//!                                  │                      (re-resolve layer, recompose)
//!                                  │                      ──► Invalidate { config, context }
//!                                  ├─► Content ──► compile ──► push valaxy:pageData
//!                                  └─► Unknown ──► Ignored
//! ```
//!
//! Config branches run inside the session writer lock, so reloads of
//! different layers apply one after the other. Content updates only read a
//! snapshot and run concurrently with everything else. Loaders and compilers
//! are synchronous and run on the blocking pool.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use parking_lot::Mutex;
use rustc_hash::FxHashMap;

use super::classify::{FileCategory, categorize_path};
use super::message::{HmrEvent, PageDataPayload};
use super::server::DevServer;
use crate::config::SharedOptions;
use crate::content::ContentPipeline;
use crate::logger::Elapsed;
use crate::options::{ConfigLayer, OptionsResolver, ResolvedOptions};
use crate::utils::path::{normalize_path, page_route};
use crate::virtual_module::VirtualModule;

/// Observer called with `(next, previous)` after a config reload is stored.
pub type ConfigReloadFn = dyn Fn(&ResolvedOptions, &ResolvedOptions) + Send + Sync;

// =============================================================================
// HotUpdateContext
// =============================================================================

/// A changed file and access to its content.
#[derive(Debug, Clone)]
pub struct HotUpdateContext {
    pub file: PathBuf,
    content: Option<String>,
}

impl HotUpdateContext {
    pub fn new(file: impl Into<PathBuf>) -> Self {
        Self {
            file: file.into(),
            content: None,
        }
    }

    /// Content known up front; `read` will not touch the disk.
    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    /// Current content of the file, or the overwritten source.
    pub async fn read(&self) -> Result<String> {
        if let Some(content) = &self.content {
            return Ok(content.clone());
        }
        tokio::fs::read_to_string(&self.file)
            .await
            .with_context(|| format!("failed to read {}", self.file.display()))
    }

    /// Replace what later `read` calls return.
    pub fn overwrite(&mut self, content: String) {
        self.content = Some(content);
    }
}

// =============================================================================
// HotUpdate
// =============================================================================

/// Effect of one file change.
#[derive(Debug, Clone, PartialEq)]
pub enum HotUpdate {
    /// Not handled here.
    Ignored,
    /// A config layer was reloaded; these modules are stale.
    Invalidate {
        layer: ConfigLayer,
        modules: Vec<VirtualModule>,
    },
    /// Page data was pushed to clients.
    PageData(PageDataPayload),
}

impl HotUpdate {
    /// Ids the host should invalidate.
    pub fn module_ids(&self) -> Vec<&str> {
        match self {
            Self::Invalidate { modules, .. } => modules.iter().map(VirtualModule::id).collect(),
            Self::Ignored | Self::PageData(_) => Vec::new(),
        }
    }
}

// =============================================================================
// HotReloadCoordinator
// =============================================================================

pub struct HotReloadCoordinator {
    options: Arc<SharedOptions>,
    resolver: OptionsResolver,
    content: Arc<ContentPipeline>,
    server: Arc<dyn DevServer>,
    /// blake3 of the last config bytes each layer file was reloaded from.
    /// Only touched inside the session writer lock.
    fingerprints: Arc<Mutex<FxHashMap<PathBuf, blake3::Hash>>>,
    on_config_reload: Option<Arc<ConfigReloadFn>>,
}

impl HotReloadCoordinator {
    pub fn new(
        options: Arc<SharedOptions>,
        resolver: OptionsResolver,
        content: Arc<ContentPipeline>,
        server: Arc<dyn DevServer>,
    ) -> Self {
        Self {
            options,
            resolver,
            content,
            server,
            fingerprints: Arc::default(),
            on_config_reload: None,
        }
    }

    pub fn on_config_reload(
        mut self,
        f: impl Fn(&ResolvedOptions, &ResolvedOptions) + Send + Sync + 'static,
    ) -> Self {
        self.on_config_reload = Some(Arc::new(f));
        self
    }

    pub fn options(&self) -> &Arc<SharedOptions> {
        &self.options
    }

    /// Handle one file change.
    ///
    /// Errors leave the live options untouched and are returned to the
    /// caller for reporting.
    pub async fn handle_hot_update(&self, ctx: &mut HotUpdateContext) -> Result<HotUpdate> {
        let elapsed = Elapsed::start();
        ctx.file = normalize_path(&ctx.file);

        let snapshot = self.options.load();
        match categorize_path(&ctx.file, &snapshot) {
            FileCategory::Config(layer) => self.reload_config(layer, ctx).await,
            FileCategory::Content => self.reload_content(ctx, &snapshot, elapsed).await,
            FileCategory::Unknown => Ok(HotUpdate::Ignored),
        }
    }

    async fn reload_config(&self, layer: ConfigLayer, ctx: &HotUpdateContext) -> Result<HotUpdate> {
        let resolver = self.resolver.clone();
        let fingerprints = Arc::clone(&self.fingerprints);
        let file = ctx.file.clone();

        let reloaded = self
            .options
            .update(move |current| {
                // Missing or unreadable files always reload; the loader reports why.
                let fingerprint = std::fs::read(&file).ok().map(|bytes| blake3::hash(&bytes));
                if fingerprint.is_some() && fingerprints.lock().get(&file) == fingerprint.as_ref() {
                    crate::debug!("config"; "{} unchanged, skipping", file.display());
                    return Ok(None);
                }

                let next = reload_layer(&resolver, layer, current)?;
                let mut fingerprints = fingerprints.lock();
                match fingerprint {
                    Some(hash) => fingerprints.insert(file, hash),
                    None => fingerprints.remove(&file),
                };
                Ok(Some(next))
            })
            .await
            .with_context(|| format!("failed to reload {layer}"))?;

        let Some((previous, next)) = reloaded else {
            return Ok(HotUpdate::Ignored);
        };

        if let Some(observer) = &self.on_config_reload {
            observer(&next, &previous);
        }
        crate::log!("config"; "{} reloaded", layer);

        Ok(HotUpdate::Invalidate {
            layer,
            modules: VirtualModule::CONFIG_BOUND.to_vec(),
        })
    }

    async fn reload_content(
        &self,
        ctx: &mut HotUpdateContext,
        options: &ResolvedOptions,
        elapsed: Elapsed,
    ) -> Result<HotUpdate> {
        let source = ctx.read().await?;
        let compiled = {
            let content = Arc::clone(&self.content);
            let file = ctx.file.clone();
            let public_dir = options.public_dir();
            tokio::task::spawn_blocking(move || content.compile(&source, &file, &public_dir))
                .await
                .context("content compile panicked")??
        };

        for include in &compiled.includes {
            self.server.add_watch_file(include);
        }

        let path = page_path(&ctx.file, &options.pages);
        let payload = PageDataPayload {
            path,
            page_data: compiled.page_data,
        };
        self.server.send(HmrEvent::page_data(&payload));
        ctx.overwrite(compiled.component_source);

        crate::log!("hmr"; "{} updated in {}", payload.path, elapsed);
        Ok(HotUpdate::PageData(payload))
    }
}

impl std::fmt::Debug for HotReloadCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HotReloadCoordinator")
            .field("options", &self.options)
            .field("content", &self.content)
            .finish_non_exhaustive()
    }
}

/// Next options after `layer` changed, derived from `current`.
fn reload_layer(
    resolver: &OptionsResolver,
    layer: ConfigLayer,
    current: &ResolvedOptions,
) -> Result<ResolvedOptions> {
    let mut next = current.clone();
    match layer {
        ConfigLayer::UserValaxy => return resolver.resolve_options(&current.entry),
        ConfigLayer::Site => resolver.resolve_site_layer(&mut next)?,
        ConfigLayer::Theme => resolver.resolve_theme_config_layer(&mut next)?,
        ConfigLayer::ThemeValaxy => {
            resolver.resolve_theme_valaxy_layer(&mut next)?;
            // Add-ons and roots may change with this layer.
            return resolver.process_options(next);
        }
        ConfigLayer::Addon(_) => resolver.resolve_addon_layers(&mut next)?,
    }
    resolver.compose(&mut next);
    Ok(next)
}

/// Route of a page file against the first page directory containing it.
fn page_path(file: &Path, pages: &[PathBuf]) -> String {
    pages
        .iter()
        .find_map(|dir| page_route(file, dir))
        .unwrap_or_else(|| format!("/{}", file.display()))
}
