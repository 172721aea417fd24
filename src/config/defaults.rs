//! Built-in defaults every session starts from.

use serde_json::json;

use super::value::ConfigTable;

/// Default `siteConfig`. The site layer is always merged over this.
pub fn default_site_config() -> ConfigTable {
    ConfigTable::from(json!({
        "mode": "auto",
        "url": "/",
        "lang": "en",
        "languages": ["en", "zh-CN"],
        "timezone": "",
        "title": "Valaxy Blog",
        "subtitle": "Next Generation Static Blog Framework.",
        "description": "A blog generated by Valaxy.",
        "author": {
            "name": "",
            "email": "",
            "link": "",
            "avatar": "",
            "status": { "emoji": "", "message": "" }
        },
        "favicon": "/favicon.svg",
        "feed": { "name": "", "favicon": "" },
        "social": [],
        "lastUpdated": true,
        "license": { "enabled": true, "language": "", "type": "by-nc-sa" },
        "sponsor": { "enable": true, "title": "", "methods": [] },
        "search": { "enable": false, "type": "fuse" },
        "comment": { "enable": false },
        "frontmatter": { "time_warning": 15_552_000_000_i64 },
        "cdn": { "prefix": "https://unpkg.com/" },
        "mediumZoom": { "enable": false, "selector": "", "options": {} },
        "statistics": {
            "enable": false,
            "readTime": { "speed": { "cn": 300, "en": 200 } }
        },
        "pageSize": 7,
        "encrypt": { "enable": false },
        "redirects": { "useVueRouter": true, "rules": [] }
    }))
}

/// Default node-side config before any layer is applied.
pub fn default_valaxy_config() -> ConfigTable {
    let mut config = ConfigTable::from(json!({
        "siteConfig": {},
        "theme": crate::options::DEFAULT_THEME,
        "themeConfig": {},
        "runtimeConfig": {
            "addons": {},
            "redirects": { "useVueRouter": true, "redirectRoutes": [] }
        },
        "features": { "katex": true },
        "addons": [],
        "ignoreDeadLinks": false,
        "markdown": {},
        "vite": {}
    }));
    config.insert("siteConfig", default_site_config());
    config
}
