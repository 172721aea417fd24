//! Helpers for emitting JavaScript source text.

use std::fmt::Write;

/// Quote `s` as a double-quoted JavaScript string literal.
///
/// This is the only escaping applied to data embedded in generated modules.
/// The literal evaluates back to exactly `s`:
///
/// | input                         | output          |
/// |-------------------------------|-----------------|
/// | `"` `\`                       | `\"` `\\`       |
/// | `\n` `\r` `\t` `\b` `\f`      | same escapes    |
/// | other U+0000..U+001F          | `\u00XX`        |
/// | U+2028 U+2029                 | `\u2028` `\u2029` |
///
/// Everything else, including non-ASCII text, is emitted as-is.
pub fn quote_js_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{08}' => out.push_str("\\b"),
            '\u{0C}' => out.push_str("\\f"),
            '\u{2028}' | '\u{2029}' => {
                let _ = write!(out, "\\u{:04x}", c as u32);
            }
            c if (c as u32) < 0x20 => {
                let _ = write!(out, "\\u{:04x}", c as u32);
            }
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// PascalCase identifier from a package name (`valaxy-addon-waline` ->
/// `ValaxyAddonWaline`). Non-ASCII letters are transliterated.
pub fn pascal_case(name: &str) -> String {
    deunicode::deunicode(name)
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            chars.next().map_or_else(String::new, |first| {
                first.to_ascii_uppercase().to_string() + chars.as_str()
            })
        })
        .collect()
}

/// Import binding for a locale file: first `-` removed, root index appended.
#[inline]
pub fn locale_var_name(lang: &str, root_index: usize) -> String {
    format!("{}{root_index}", lang.replacen('-', "", 1))
}
