//! Dev server URL helpers.

use std::path::Path;

use super::fs::to_slash;

/// Dev server URL serving an absolute filesystem path (`/@fs/...`).
///
/// # Examples
/// ```
/// use valaxy_loader::utils::path::to_at_fs;
/// use std::path::Path;
/// assert_eq!(to_at_fs(Path::new("/site/styles/index.css")), "/@fs/site/styles/index.css");
/// ```
pub fn to_at_fs(path: &Path) -> String {
    let path = to_slash(path);
    if path.starts_with('/') {
        format!("/@fs{path}")
    } else {
        format!("/@fs/{path}")
    }
}

/// Route of a page file: relative to `pages_dir`, extension removed, with a
/// leading slash. `None` when the file is outside `pages_dir`.
///
/// # Examples
/// ```
/// use valaxy_loader::utils::path::page_route;
/// use std::path::Path;
/// assert_eq!(page_route(Path::new("/site/pages/post.md"), Path::new("/site/pages")).as_deref(), Some("/post"));
/// ```
pub fn page_route(file: &Path, pages_dir: &Path) -> Option<String> {
    let rel = file.strip_prefix(pages_dir).ok()?;
    let rel = rel.with_extension("");
    Some(format!("/{}", to_slash(&rel)))
}
