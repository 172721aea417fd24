//! `/@valaxyjs/config` and `/@valaxyjs/context`.

use serde_json::{Value as Json, json};

use crate::config::ConfigTable;
use crate::options::ResolvedOptions;
use crate::utils::js::quote_js_string;
use crate::utils::path::to_slash;

/// The merged config with `runtimeConfig.redirects` filled in, embedded as a
/// JSON string the client parses.
pub fn generate_config(options: &ResolvedOptions) -> String {
    let mut config = options.config.clone();
    config
        .table_mut("runtimeConfig")
        .insert("redirects", runtime_redirects(options));
    export_json_string(&config.to_json())
}

/// `{ userRoot }`, embedded like the config.
pub fn generate_context(options: &ResolvedOptions) -> String {
    export_json_string(&json!({ "userRoot": to_slash(&options.user_root) }))
}

/// Router redirects are only left to the server in production builds that
/// opt out of `useVueRouter`.
fn runtime_redirects(options: &ResolvedOptions) -> ConfigTable {
    let use_vue_router = !options.mode.production
        || options
            .config
            .get_path("siteConfig.redirects.useVueRouter")
            .and_then(|v| v.as_bool())
            .unwrap_or(true);

    let routes: Vec<Json> = options
        .redirects
        .iter()
        .map(|r| json!({ "path": r.from, "redirect": r.to }))
        .collect();

    ConfigTable::from(json!({
        "useVueRouter": use_vue_router,
        "redirectRoutes": routes,
    }))
}

fn export_json_string(value: &Json) -> String {
    format!("export default {}", quote_js_string(&value.to_string()))
}
