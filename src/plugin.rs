//! Host-facing loader plugin.
//!
//! [`ValaxyLoader`] is what the bundler integration talks to. It owns the
//! session state and routes each host hook to the component that answers it:
//!
//! | Hook                 | Answered by                      |
//! |----------------------|----------------------------------|
//! | `resolve_id`, `load` | [`VirtualModuleRegistry`]        |
//! | `transform`          | [`ContentPipeline`]              |
//! | `render_start`       | dead-link check                  |
//! | `handle_hot_update`  | [`HotReloadCoordinator`] (dev)   |
//! | `watch_targets`      | config file and every root       |

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;

use crate::config::{BuildError, SharedOptions};
use crate::content::{ContentCompiler, ContentPipeline, Transformed};
use crate::options::{OptionsResolver, ResolvedOptions};
use crate::reload::{ConfigReloadFn, DevServer, HotReloadCoordinator, HotUpdate, HotUpdateContext};
use crate::virtual_module::{ModuleSource, VirtualModuleRegistry};
use crate::watch::{FsWatcher, watch_paths};

pub const PLUGIN_NAME: &str = "valaxy:loader";

pub struct ValaxyLoader {
    options: Arc<SharedOptions>,
    resolver: OptionsResolver,
    registry: VirtualModuleRegistry,
    content: Arc<ContentPipeline>,
    server: Option<Arc<dyn DevServer>>,
    on_config_reload: Option<Arc<ConfigReloadFn>>,
    /// Present once a dev server is attached.
    coordinator: Option<Arc<HotReloadCoordinator>>,
}

impl ValaxyLoader {
    /// Loader for a build. Attach a dev server to enable hot updates.
    pub fn new(
        options: ResolvedOptions,
        resolver: OptionsResolver,
        compiler: Arc<dyn ContentCompiler>,
    ) -> Self {
        let options = Arc::new(SharedOptions::new(options));
        Self {
            registry: VirtualModuleRegistry::new(Arc::clone(&options)),
            options,
            resolver,
            content: Arc::new(ContentPipeline::new(compiler)),
            server: None,
            on_config_reload: None,
            coordinator: None,
        }
    }

    pub fn with_dev_server(mut self, server: Arc<dyn DevServer>) -> Self {
        self.server = Some(server);
        self.rebuild_coordinator();
        self
    }

    /// Observe `(next, previous)` options after every config reload.
    pub fn on_config_reload(
        mut self,
        f: impl Fn(&ResolvedOptions, &ResolvedOptions) + Send + Sync + 'static,
    ) -> Self {
        self.on_config_reload = Some(Arc::new(f));
        self.rebuild_coordinator();
        self
    }

    fn rebuild_coordinator(&mut self) {
        let Some(server) = &self.server else {
            return;
        };
        let mut coordinator = HotReloadCoordinator::new(
            Arc::clone(&self.options),
            self.resolver.clone(),
            Arc::clone(&self.content),
            Arc::clone(server),
        );
        if let Some(observer) = self.on_config_reload.clone() {
            coordinator = coordinator.on_config_reload(move |next, previous| observer(next, previous));
        }
        self.coordinator = Some(Arc::new(coordinator));
    }

    #[inline]
    pub fn name(&self) -> &'static str {
        PLUGIN_NAME
    }

    pub fn options(&self) -> &Arc<SharedOptions> {
        &self.options
    }

    pub fn content(&self) -> &ContentPipeline {
        &self.content
    }

    /// Paths the host should add to its watcher.
    pub fn watch_targets(&self) -> Vec<PathBuf> {
        watch_paths(&self.options.load())
    }

    pub fn resolve_id(&self, id: &str) -> Option<String> {
        self.registry.resolve_id(id)
    }

    pub fn load(&self, id: &str) -> Option<ModuleSource> {
        self.registry.load(id)
    }

    /// Compile content files; anything else passes through as `Ok(None)`.
    pub fn transform(&self, code: &str, id: &str) -> Result<Option<Transformed>> {
        let path = PathBuf::from(strip_query(id));
        let public_dir = self.options.load().public_dir();
        self.content
            .transform(code, &path, &public_dir, self.server.as_deref())
    }

    /// Build finalization: fails when dead links were found and the site
    /// does not set `ignoreDeadLinks`.
    pub fn render_start(&self) -> Result<(), BuildError> {
        let ignore = self.options.load().ignore_dead_links();
        self.content.check_dead_links(ignore)
    }

    /// Without a dev server every change is ignored.
    pub async fn handle_hot_update(&self, ctx: &mut HotUpdateContext) -> Result<HotUpdate> {
        match &self.coordinator {
            Some(coordinator) => coordinator.handle_hot_update(ctx).await,
            None => Ok(HotUpdate::Ignored),
        }
    }

    /// File watcher over [`watch_targets`](Self::watch_targets) driving
    /// `handle_hot_update`. `None` without a dev server.
    pub fn watcher(&self) -> notify::Result<Option<FsWatcher>> {
        let Some(coordinator) = &self.coordinator else {
            return Ok(None);
        };
        FsWatcher::new(&self.watch_targets(), Arc::clone(coordinator)).map(Some)
    }
}

impl std::fmt::Debug for ValaxyLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ValaxyLoader")
            .field("options", &self.options)
            .field("content", &self.content)
            .field("dev", &self.coordinator.is_some())
            .finish_non_exhaustive()
    }
}

/// `/site/pages/a.md?vue&type=script` -> `/site/pages/a.md`
fn strip_query(id: &str) -> &str {
    id.split_once('?').map_or(id, |(path, _)| path)
}
