//! `/@valaxyjs/styles`.

use std::path::Path;

use crate::options::ResolvedOptions;
use crate::utils::js::quote_js_string;
use crate::utils::path::{find_up, to_at_fs};

/// Bare specifier used when katex is not installed under the user root.
const KATEX_CSS: &str = "katex/dist/katex.min.css";

/// Stylesheets picked up from `<root>/styles/`, in import order.
const AUTOLOAD_STYLES: &[&str] = &["index", "css-vars"];
const STYLE_EXTENSIONS: &[&str] = &["css", "scss"];

/// Import every autoloaded stylesheet, roots in cascade order.
pub fn generate_styles(options: &ResolvedOptions) -> String {
    let mut imports = Vec::new();

    let katex = options
        .config
        .get_path("features.katex")
        .and_then(|v| v.as_bool())
        .unwrap_or(false);
    if katex {
        imports.push(import(&katex_stylesheet(&options.user_root)));
        imports.push(import(&to_at_fs(
            &options.client_root.join("styles/third/katex.scss"),
        )));
    }

    for root in &options.roots {
        for name in AUTOLOAD_STYLES {
            for ext in STYLE_EXTENSIONS {
                let style = root.join("styles").join(format!("{name}.{ext}"));
                if style.is_file() {
                    imports.push(import(&to_at_fs(&style)));
                }
            }
        }
    }

    imports.join("\n")
}

fn katex_stylesheet(user_root: &Path) -> String {
    find_up(user_root, Path::new("node_modules").join(KATEX_CSS))
        .map(|path| to_at_fs(&path))
        .unwrap_or_else(|| KATEX_CSS.to_owned())
}

fn import(specifier: &str) -> String {
    format!("import {}", quote_js_string(specifier))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::EntryOptions;
    use std::fs;
    use tempfile::TempDir;

    fn touch(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "").unwrap();
    }

    fn options(dir: &TempDir, katex: bool) -> ResolvedOptions {
        let root = dir.path();
        let mut options = ResolvedOptions::from_entry(
            &EntryOptions::new(root.join("user"))
                .with_theme_root(root.join("theme"))
                .with_client_root(root.join("client")),
        );
        options.config = crate::config::ConfigTable::from(serde_json::json!({
            "features": { "katex": katex }
        }));
        options
    }

    #[test]
    fn test_root_order_is_cascade_order() {
        let dir = TempDir::new().unwrap();
        touch(&dir.path().join("user/styles/index.scss"));
        touch(&dir.path().join("theme/styles/index.css"));
        touch(&dir.path().join("theme/styles/css-vars.scss"));
        fs::create_dir_all(dir.path().join("user")).unwrap();

        let code = generate_styles(&options(&dir, false));
        let lines: Vec<_> = code.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].ends_with("theme/styles/index.css\""));
        assert!(lines[1].ends_with("theme/styles/css-vars.scss\""));
        assert!(lines[2].ends_with("user/styles/index.scss\""));
        assert!(lines.iter().all(|l| l.starts_with("import \"/@fs/")));
    }

    #[test]
    fn test_katex_imports_come_first() {
        let dir = TempDir::new().unwrap();
        touch(&dir.path().join("client/styles/index.css"));

        let code = generate_styles(&options(&dir, true));
        let lines: Vec<_> = code.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].contains("katex.min.css"));
        assert!(lines[1].ends_with("client/styles/third/katex.scss\""));
        assert!(lines[2].ends_with("client/styles/index.css\""));
    }

    #[test]
    fn test_no_styles_is_empty_module() {
        let dir = TempDir::new().unwrap();
        assert_eq!(generate_styles(&options(&dir, false)), "");
    }
}
