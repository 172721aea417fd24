//! Filesystem path utilities.
//!
//! - `normalize_path` - absolute form (canonicalize + fallback)
//! - `find_up` - search `<dir>/<rel>` from a directory up to the root
//! - `to_slash` - `/`-separated string form

use std::path::{Path, PathBuf};

/// Normalize a file system path to absolute form.
///
/// Tries `canonicalize()` first (resolves symlinks, `.`, `..`).
/// Falls back to:
/// - Return as-is if already absolute
/// - Join with current directory if relative
#[inline]
pub fn normalize_path(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            std::env::current_dir().map_or_else(|_| path.to_path_buf(), |cwd| cwd.join(path))
        }
    })
}

/// First existing `<ancestor>/<rel>`, starting at `start` itself.
///
/// ```ignore
/// // <userRoot>/node_modules/katex/..., then <parent>/node_modules/katex/...
/// find_up(user_root, "node_modules/katex/dist/katex.min.css");
/// ```
pub fn find_up(start: &Path, rel: impl AsRef<Path>) -> Option<PathBuf> {
    let rel = rel.as_ref();
    start
        .ancestors()
        .map(|dir| dir.join(rel))
        .find(|candidate| candidate.exists())
}

/// `/`-separated form of `path`, regardless of platform.
#[inline]
pub fn to_slash(path: &Path) -> String {
    let s = path.to_string_lossy();
    if std::path::MAIN_SEPARATOR == '/' {
        s.into_owned()
    } else {
        s.replace(std::path::MAIN_SEPARATOR, "/")
    }
}
