//! `/@valaxyjs/addons`.

use crate::options::{AddonDescriptor, ResolvedOptions};
use crate::utils::js::{pascal_case, quote_js_string};

/// Entry component an add-on must ship to be mounted globally.
pub const ADDON_ENTRY: &str = "App.vue";

/// Import and list the entry components of global add-ons, in add-on order.
pub fn generate_addons(options: &ResolvedOptions) -> String {
    let globals: Vec<&AddonDescriptor> = options
        .addons
        .iter()
        .filter(|addon| addon.global && addon.root.join(ADDON_ENTRY).is_file())
        .collect();

    let imports = globals
        .iter()
        .map(|addon| {
            format!(
                "import {} from {}",
                import_name(&addon.name),
                quote_js_string(&format!("{}/{ADDON_ENTRY}", addon.name))
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    let components = globals
        .iter()
        .map(|addon| {
            format!(
                "{{ component: {}, props: {} }}",
                import_name(&addon.name),
                addon.props
            )
        })
        .collect::<Vec<_>>()
        .join(",");

    format!("{imports}\nexport default [{components}]")
}

/// `Addon<PascalName>App`
fn import_name(name: &str) -> String {
    format!("Addon{}App", pascal_case(name))
}
