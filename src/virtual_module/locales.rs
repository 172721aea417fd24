//! `/@valaxyjs/locales`.
//!
//! ```text
//! import en2 from "/@fs/<user>/locales/en.yml"
//! import en1 from "/@fs/<theme>/locales/en.yml"
//! import { defu } from "defu"
//! const messages = { "zh-CN": {}, en: {} }
//! messages['en'] = defu(en1, messages['en'])
//! messages['en'] = defu(en2, messages['en'])
//! export default messages
//! ```
//!
//! `defu` keeps its first argument on conflicts, so the root merged last has
//! the final say. The user root is always merged last; the other roots keep
//! their cascade order. Variable names carry the root's index in `roots`.

use std::fs;
use std::path::Path;

use crate::options::ResolvedOptions;
use crate::utils::js::{locale_var_name, quote_js_string};
use crate::utils::path::to_at_fs;

/// Languages every locale module exports, even when no root provides them.
pub const LANGUAGES: &[&str] = &["zh-CN", "en"];

pub fn generate_locales(options: &ResolvedOptions) -> String {
    let mut imports = Vec::new();
    let mut merges = Vec::new();

    for (index, root) in merge_order(&options.roots, &options.user_root) {
        for lang in LANGUAGES {
            let file = root.join("locales").join(format!("{lang}.yml"));
            if !is_non_empty_file(&file) {
                continue;
            }
            let var = locale_var_name(lang, index);
            imports.push(format!("import {var} from {}", quote_js_string(&to_at_fs(&file))));
            merges.push(format!("messages['{lang}'] = defu({var}, messages['{lang}'])"));
        }
    }

    let messages = LANGUAGES
        .iter()
        .map(|lang| format!("{}: {{}}", object_key(lang)))
        .collect::<Vec<_>>()
        .join(", ");

    let mut lines: Vec<String> = imports.into_iter().rev().collect();
    lines.push("import { defu } from \"defu\"".to_owned());
    lines.push(format!("const messages = {{ {messages} }}"));
    lines.extend(merges);
    lines.push("export default messages".to_owned());
    lines.join("\n")
}

/// `(index in roots, root)` with the user root moved to the end.
fn merge_order<'a>(roots: &'a [std::path::PathBuf], user_root: &Path) -> Vec<(usize, &'a Path)> {
    let (user, others): (Vec<_>, Vec<_>) = roots
        .iter()
        .map(|root| root.as_path())
        .enumerate()
        .partition(|(_, root)| *root == user_root);
    others.into_iter().chain(user).collect()
}

fn is_non_empty_file(path: &Path) -> bool {
    fs::metadata(path).is_ok_and(|meta| meta.is_file() && meta.len() > 0)
}

/// Bare identifier keys stay unquoted.
fn object_key(lang: &str) -> String {
    if lang.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        lang.to_owned()
    } else {
        quote_js_string(lang)
    }
}
