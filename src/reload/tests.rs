//! End-to-end hot update scenarios against a site on disk.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use parking_lot::Mutex;
use serde_json::json;
use tempfile::TempDir;

use super::*;
use crate::config::{ConfigTable, FsConfigLoader, SharedOptions};
use crate::content::ContentPipeline;
use crate::content::testing::LineCompiler;
use crate::options::{ConfigLayer, EntryOptions, OptionsResolver};
use crate::virtual_module::VirtualModule;

#[derive(Default)]
struct RecordingServer {
    events: Mutex<Vec<HmrEvent>>,
    watched: Mutex<Vec<PathBuf>>,
}

impl DevServer for RecordingServer {
    fn send(&self, event: HmrEvent) {
        self.events.lock().push(event);
    }

    fn add_watch_file(&self, path: &Path) {
        self.watched.lock().push(path.to_path_buf());
    }
}

/// `(next title, previous title)` per observed config reload.
type Observed = Arc<Mutex<Vec<(Option<String>, Option<String>)>>>;

struct Fixture {
    dir: TempDir,
    server: Arc<RecordingServer>,
    observed: Observed,
    coordinator: HotReloadCoordinator,
}

impl Fixture {
    fn new(files: &[(&str, &str)]) -> Self {
        Self::build(files, Some("themes/yun"), |_| {})
    }

    /// `setup` runs on the site root before options are resolved. Without a
    /// theme root the default theme is looked up in `node_modules`.
    fn build(files: &[(&str, &str)], theme_root: Option<&str>, setup: impl FnOnce(&Path)) -> Self {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("themes/yun")).unwrap();
        fs::create_dir_all(dir.path().join("pages")).unwrap();
        for (rel, content) in files {
            write(dir.path(), rel, content);
        }
        setup(dir.path());

        let resolver = OptionsResolver::new(Arc::new(FsConfigLoader::new()));
        let mut entry = EntryOptions::new(dir.path());
        if let Some(root) = theme_root {
            entry = entry.with_theme_root(root);
        }
        let options = resolver.resolve_options(&entry).unwrap();

        let server = Arc::new(RecordingServer::default());
        let observed: Observed = Arc::default();
        let coordinator = HotReloadCoordinator::new(
            Arc::new(SharedOptions::new(options)),
            resolver,
            Arc::new(ContentPipeline::new(Arc::new(LineCompiler))),
            server.clone(),
        )
        .on_config_reload({
            let observed = observed.clone();
            move |next, previous| {
                let title = |o: &crate::options::ResolvedOptions| {
                    o.config
                        .get_path("siteConfig.title")
                        .and_then(|v| v.as_str())
                        .map(str::to_owned)
                };
                observed.lock().push((title(next), title(previous)));
            }
        });

        Self {
            dir,
            server,
            observed,
            coordinator,
        }
    }

    fn path(&self, rel: &str) -> PathBuf {
        self.dir.path().canonicalize().unwrap().join(rel)
    }

    fn write(&self, rel: &str, content: &str) {
        write(self.dir.path(), rel, content);
    }

    async fn change(&self, rel: &str) -> Result<HotUpdate> {
        let mut ctx = HotUpdateContext::new(self.path(rel));
        self.coordinator.handle_hot_update(&mut ctx).await
    }

    fn config(&self) -> ConfigTable {
        self.coordinator.options().load().config.clone()
    }

    fn str_at(&self, path: &str) -> Option<String> {
        self.config()
            .get_path(path)
            .and_then(|v| v.as_str())
            .map(str::to_owned)
    }
}

fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

fn invalidated(layer: ConfigLayer) -> HotUpdate {
    HotUpdate::Invalidate {
        layer,
        modules: vec![VirtualModule::Config, VirtualModule::Context],
    }
}

// =============================================================================
// Content
// =============================================================================

#[tokio::test]
async fn test_content_change_pushes_page_data_only() {
    let site = Fixture::new(&[("pages/post.md", "# Post\n@include /site/snippets/a.md")]);
    let before = site.coordinator.options().load();

    let mut ctx = HotUpdateContext::new(site.path("pages/post.md"));
    let update = site.coordinator.handle_hot_update(&mut ctx).await.unwrap();

    let payload = PageDataPayload {
        path: "/post".into(),
        page_data: json!({ "title": "Post" }),
    };
    assert_eq!(update, HotUpdate::PageData(payload.clone()));
    assert!(update.module_ids().is_empty());
    assert_eq!(*site.server.events.lock(), [HmrEvent::page_data(&payload)]);
    assert_eq!(*site.server.watched.lock(), [PathBuf::from("/site/snippets/a.md")]);

    // The host's transform sees the compiled component, not the markdown.
    assert!(ctx.read().await.unwrap().starts_with("<template>"));
    // Config state is untouched.
    assert!(Arc::ptr_eq(&before, &site.coordinator.options().load()));
}

#[tokio::test]
async fn test_nested_page_path() {
    let site = Fixture::new(&[("pages/posts/hello.md", "# Hello")]);
    let update = site.change("pages/posts/hello.md").await.unwrap();
    let HotUpdate::PageData(payload) = update else {
        panic!("expected page data, got {update:?}");
    };
    assert_eq!(payload.path, "/posts/hello");
}

#[tokio::test]
async fn test_content_compile_error_pushes_nothing() {
    let site = Fixture::new(&[("pages/broken.md", "!error")]);
    let err = site.change("pages/broken.md").await.unwrap_err();
    assert!(format!("{err:#}").contains("broken.md"));
    assert!(site.server.events.lock().is_empty());
}

#[tokio::test]
async fn test_unknown_file_is_ignored() {
    let site = Fixture::new(&[("src/main.ts", "export {}")]);
    assert_eq!(site.change("src/main.ts").await.unwrap(), HotUpdate::Ignored);
    assert!(site.server.events.lock().is_empty());
    assert!(site.observed.lock().is_empty());
}

// =============================================================================
// Config layers
// =============================================================================

#[tokio::test]
async fn test_site_change_merges_over_defaults() {
    let site = Fixture::new(&[("site.config.toml", "title = \"old\"")]);
    site.write("site.config.toml", "title = \"A\"");

    let update = site.change("site.config.toml").await.unwrap();

    assert_eq!(update, invalidated(ConfigLayer::Site));
    assert_eq!(update.module_ids(), ["/@valaxyjs/config", "/@valaxyjs/context"]);
    assert_eq!(site.str_at("siteConfig.title").as_deref(), Some("A"));
    assert_eq!(site.str_at("siteConfig.lang").as_deref(), Some("en"));
    assert_eq!(
        *site.observed.lock(),
        [(Some("A".to_owned()), Some("old".to_owned()))]
    );
}

#[tokio::test]
async fn test_theme_valaxy_change_keeps_site_layer() {
    let site = Fixture::new(&[
        ("site.config.toml", "title = \"A\""),
        ("themes/yun/valaxy.config.toml", "[themeConfig]\ncolor = \"red\""),
    ]);
    site.write(
        "themes/yun/valaxy.config.toml",
        "[themeConfig]\ncolor = \"blue\"\n[markdown]\nlineNumbers = true",
    );

    let update = site.change("themes/yun/valaxy.config.toml").await.unwrap();

    assert_eq!(update, invalidated(ConfigLayer::ThemeValaxy));
    assert_eq!(site.str_at("themeConfig.color").as_deref(), Some("blue"));
    assert_eq!(
        site.config().get_path("markdown.lineNumbers").and_then(|v| v.as_bool()),
        Some(true)
    );
    assert_eq!(site.str_at("siteConfig.title").as_deref(), Some("A"));
}

#[tokio::test]
async fn test_theme_valaxy_change_activates_addons() {
    let site = Fixture::new(&[("node_modules/valaxy-addon-x/App.vue", "<template />")]);
    assert!(site.coordinator.options().load().addons.is_empty());

    site.write("themes/yun/valaxy.config.toml", "addons = [{ name = \"x\", global = true }]");
    site.change("themes/yun/valaxy.config.toml").await.unwrap();

    let options = site.coordinator.options().load();
    assert_eq!(options.addons.len(), 1);
    assert_eq!(options.roots.last(), Some(&options.addons[0].root));
}

#[tokio::test]
async fn test_theme_config_change_keeps_pkg() {
    let site = Fixture::new(&[
        ("themes/yun/package.json", r#"{ "name": "valaxy-theme-yun", "version": "1.0.0" }"#),
        ("theme.config.toml", "[colors]\nprimary = \"red\""),
    ]);
    site.write("theme.config.toml", "[colors]\nprimary = \"green\"");

    let update = site.change("theme.config.toml").await.unwrap();

    assert_eq!(update, invalidated(ConfigLayer::Theme));
    assert_eq!(site.str_at("themeConfig.colors.primary").as_deref(), Some("green"));
    assert_eq!(site.str_at("themeConfig.pkg.name").as_deref(), Some("valaxy-theme-yun"));
    assert_eq!(site.str_at("themeConfig.pkg.version").as_deref(), Some("1.0.0"));
}

#[tokio::test]
async fn test_user_config_change_reloads_everything() {
    let site = Fixture::new(&[("valaxy.config.toml", "ignoreDeadLinks = false")]);
    site.write("valaxy.config.toml", "ignoreDeadLinks = true\n[siteConfig]\ntitle = \"From user\"");

    let update = site.change("valaxy.config.toml").await.unwrap();

    assert_eq!(update, invalidated(ConfigLayer::UserValaxy));
    let options = site.coordinator.options().load();
    assert!(options.ignore_dead_links());
    assert_eq!(site.str_at("siteConfig.title").as_deref(), Some("From user"));
}

#[tokio::test]
async fn test_addon_config_change_refolds_addons() {
    let site = Fixture::new(&[
        ("valaxy.config.toml", "addons = [\"x\"]"),
        ("node_modules/valaxy-addon-x/valaxy.config.toml", "[features]\nkatex = false"),
    ]);
    assert_eq!(
        site.config().get_path("features.katex").and_then(|v| v.as_bool()),
        Some(false)
    );

    site.write("node_modules/valaxy-addon-x/valaxy.config.toml", "[features]\nkatex = true");
    let update = site
        .change("node_modules/valaxy-addon-x/valaxy.config.toml")
        .await
        .unwrap();

    assert_eq!(update, invalidated(ConfigLayer::Addon(0)));
    assert_eq!(
        site.config().get_path("features.katex").and_then(|v| v.as_bool()),
        Some(true)
    );
}

#[tokio::test]
async fn test_broken_layer_keeps_previous_options() {
    let site = Fixture::new(&[("site.config.toml", "title = \"good\"")]);
    let before = site.coordinator.options().load();

    site.write("site.config.toml", "title = ");
    let err = site.change("site.config.toml").await.unwrap_err();

    let message = format!("{err:#}");
    assert!(message.contains("siteConfig"));
    assert!(message.contains("site.config.toml"));
    assert!(Arc::ptr_eq(&before, &site.coordinator.options().load()));
    assert!(site.observed.lock().is_empty());

    // Fixing the file recovers.
    site.write("site.config.toml", "title = \"fixed\"");
    site.change("site.config.toml").await.unwrap();
    assert_eq!(site.str_at("siteConfig.title").as_deref(), Some("fixed"));
}

#[tokio::test]
async fn test_unchanged_bytes_are_skipped() {
    let site = Fixture::new(&[("site.config.toml", "title = \"A\"")]);
    site.write("site.config.toml", "title = \"B\"");

    assert_eq!(site.change("site.config.toml").await.unwrap(), invalidated(ConfigLayer::Site));
    assert_eq!(site.change("site.config.toml").await.unwrap(), HotUpdate::Ignored);
    assert_eq!(site.observed.lock().len(), 1);
}

#[tokio::test]
async fn test_save_back_to_earlier_bytes_reloads() {
    let site = Fixture::new(&[("site.config.toml", "title = \"A\"")]);

    for title in ["B", "C", "B"] {
        site.write("site.config.toml", &format!("title = \"{title}\""));
        let update = site.change("site.config.toml").await.unwrap();
        assert_eq!(update, invalidated(ConfigLayer::Site), "save of {title} skipped");
        assert_eq!(site.str_at("siteConfig.title").as_deref(), Some(title));
    }
    assert_eq!(site.observed.lock().len(), 3);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_racing_reloads_of_one_file_end_on_disk_content() {
    let site = Arc::new(Fixture::new(&[("site.config.toml", "title = \"A\"")]));
    site.write("site.config.toml", "title = \"B\"");
    let first = tokio::spawn({
        let site = Arc::clone(&site);
        async move { site.change("site.config.toml").await.map(|_| ()) }
    });
    site.write("site.config.toml", "title = \"C\"");
    let second = tokio::spawn({
        let site = Arc::clone(&site);
        async move { site.change("site.config.toml").await.map(|_| ()) }
    });
    first.await.unwrap().unwrap();
    second.await.unwrap().unwrap();

    // Whatever order the two ran in, one more event for the file on disk
    // must leave it live.
    site.change("site.config.toml").await.unwrap();
    assert_eq!(site.str_at("siteConfig.title").as_deref(), Some("C"));
}

#[tokio::test]
async fn test_deleted_site_config_falls_back_to_defaults() {
    let site = Fixture::new(&[("site.config.toml", "title = \"Mine\"\nlang = \"zh-CN\"")]);
    assert_eq!(site.str_at("siteConfig.title").as_deref(), Some("Mine"));

    fs::remove_file(site.path("site.config.toml")).unwrap();
    let update = site.change("site.config.toml").await.unwrap();

    assert_eq!(update, invalidated(ConfigLayer::Site));
    let defaults = crate::config::default_valaxy_config();
    assert_eq!(
        site.str_at("siteConfig.title"),
        defaults.get_path("siteConfig.title").and_then(|v| v.as_str()).map(str::to_owned)
    );
    assert_eq!(site.str_at("siteConfig.lang").as_deref(), Some("en"));
}

#[cfg(unix)]
#[tokio::test]
async fn test_symlinked_theme_package_reloads() {
    let site = Fixture::build(&[], None, |root| {
        write(root, "store/valaxy-theme-yun/valaxy.config.toml", "[themeConfig]\ncolor = \"red\"");
        fs::create_dir_all(root.join("node_modules")).unwrap();
        std::os::unix::fs::symlink(
            root.join("store/valaxy-theme-yun"),
            root.join("node_modules/valaxy-theme-yun"),
        )
        .unwrap();
    });
    assert_eq!(site.str_at("themeConfig.color").as_deref(), Some("red"));
    assert_eq!(
        site.coordinator.options().load().theme_root,
        site.path("store/valaxy-theme-yun")
    );

    site.write("store/valaxy-theme-yun/valaxy.config.toml", "[themeConfig]\ncolor = \"blue\"");
    // The host reports the path through the link.
    let update = site
        .change("node_modules/valaxy-theme-yun/valaxy.config.toml")
        .await
        .unwrap();

    assert_eq!(update, invalidated(ConfigLayer::ThemeValaxy));
    assert_eq!(site.str_at("themeConfig.color").as_deref(), Some("blue"));
}

#[tokio::test]
async fn test_created_site_config_is_recognized() {
    let site = Fixture::new(&[]);
    site.write("site.config.json", r#"{ "title": "json" }"#);

    let update = site.change("site.config.json").await.unwrap();
    assert_eq!(update, invalidated(ConfigLayer::Site));
    assert_eq!(site.str_at("siteConfig.title").as_deref(), Some("json"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_layer_reloads_both_survive() {
    let site = Arc::new(Fixture::new(&[
        ("site.config.toml", "title = \"old\""),
        ("theme.config.toml", "accent = \"old\""),
    ]));
    site.write("site.config.toml", "title = \"new\"");
    site.write("theme.config.toml", "accent = \"new\"");

    let tasks: Vec<_> = ["site.config.toml", "theme.config.toml"]
        .into_iter()
        .map(|rel| {
            let site = Arc::clone(&site);
            tokio::spawn(async move { site.change(rel).await.map(|_| ()) })
        })
        .collect();
    for task in tasks {
        task.await.unwrap().unwrap();
    }

    assert_eq!(site.str_at("siteConfig.title").as_deref(), Some("new"));
    assert_eq!(site.str_at("themeConfig.accent").as_deref(), Some("new"));
}

#[tokio::test]
async fn test_full_resolution_is_idempotent() {
    let site = Fixture::new(&[
        ("site.config.toml", "title = \"A\""),
        ("valaxy.config.toml", "[vite.server]\nport = 4859"),
    ]);
    let resolver = OptionsResolver::new(Arc::new(FsConfigLoader::new()));
    let entry = EntryOptions::new(site.dir.path()).with_theme_root("themes/yun");

    let first = resolver.resolve_options(&entry).unwrap();
    let second = resolver.resolve_options(&entry).unwrap();
    assert_eq!(first.config, second.config);
    assert_eq!(first.config, site.config());
}
