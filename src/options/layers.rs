use std::fmt;

use crate::config::ConfigTable;

/// Last resolved value of every configuration layer.
///
/// The live config is always recomposed from these, so reloading one layer
/// never double-applies another layer's hooks.
#[derive(Debug, Clone, Default)]
pub struct ConfigLayers {
    /// User `valaxy.config`.
    pub user: ConfigTable,
    /// User `site.config`.
    pub site: ConfigTable,
    /// User `theme.config`.
    pub theme_config: ConfigTable,
    /// The theme's own `valaxy.config`.
    pub theme_valaxy: ConfigTable,
    /// All add-on layers folded in add-on order.
    pub addons: ConfigTable,
}

/// Which configuration layer a changed file belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigLayer {
    /// Top-level user `valaxy.config`; reloads everything.
    UserValaxy,
    Site,
    Theme,
    ThemeValaxy,
    /// Index into `ResolvedOptions::addons`.
    Addon(usize),
}

impl fmt::Display for ConfigLayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UserValaxy => f.write_str("valaxyConfig"),
            Self::Site => f.write_str("siteConfig"),
            Self::Theme => f.write_str("themeConfig"),
            Self::ThemeValaxy => f.write_str("theme valaxyConfig"),
            Self::Addon(i) => write!(f, "addon #{i} valaxyConfig"),
        }
    }
}
