//! File Classification
//!
//! Pure function mapping a changed path to what it affects, checked in
//! priority order. No I/O beyond path normalization.

use std::path::{Path, PathBuf};

use crate::config::{SITE_CONFIG, THEME_CONFIG, VALAXY_CONFIG, is_config_candidate};
use crate::content::ContentPipeline;
use crate::options::{ConfigLayer, ResolvedOptions};
use crate::utils::path::normalize_path;

/// What a changed file is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileCategory {
    /// One of the configuration layers.
    Config(ConfigLayer),
    /// A page under one of the page directories.
    Content,
    /// Not ours; other plugins may still react.
    Unknown,
}

/// Classify `path` against the layer files and page directories of `options`.
///
/// A layer matches its recorded file, or any candidate file for that layer in
/// its directory, so creating `site.config.json` next to no config at all is
/// still a site change.
pub fn categorize_path(path: &Path, options: &ResolvedOptions) -> FileCategory {
    // `path` arrives canonical; a root stored before its directory existed
    // (or through a symlink) is compared in canonical form too.
    let in_dir = |name: &str, dir: &Path| {
        is_config_candidate(path, name, dir) || is_config_candidate(path, name, &normalize_path(dir))
    };
    let layer_file = |recorded: &Path, name: &str, dir: &Path| path == recorded || in_dir(name, dir);

    if layer_file(options.config_file.as_path(), VALAXY_CONFIG, options.user_root.as_path()) {
        return FileCategory::Config(ConfigLayer::UserValaxy);
    }
    if layer_file(options.site_config_file.as_path(), SITE_CONFIG, options.user_root.as_path()) {
        return FileCategory::Config(ConfigLayer::Site);
    }
    if layer_file(options.theme_config_file.as_path(), THEME_CONFIG, options.user_root.as_path()) {
        return FileCategory::Config(ConfigLayer::Theme);
    }
    if layer_file(options.theme_valaxy_config_file.as_path(), VALAXY_CONFIG, options.theme_root.as_path()) {
        return FileCategory::Config(ConfigLayer::ThemeValaxy);
    }

    let addon = options.addons.iter().position(|addon| {
        addon.config_file.as_deref() == Some(path) || in_dir(VALAXY_CONFIG, &addon.root)
    });
    if let Some(index) = addon {
        return FileCategory::Config(ConfigLayer::Addon(index));
    }

    let in_pages = |dir: &PathBuf| path.starts_with(dir) || path.starts_with(normalize_path(dir));
    if ContentPipeline::is_content(path) && options.pages.iter().any(in_pages) {
        return FileCategory::Content;
    }

    FileCategory::Unknown
}
