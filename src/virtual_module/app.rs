//! `/@valaxyjs/UserAppVue` and `/@valaxyjs/ThemeAppVue`.

use std::path::Path;

use crate::utils::js::quote_js_string;
use crate::utils::path::to_at_fs;

/// Component that renders nothing, used when a root has no `App.vue`.
pub const NULL_COMPONENT: &str =
    "import { defineComponent } from \"vue\"; export default defineComponent({ render: () => null });";

/// Re-export `<root>/App.vue`, or [`NULL_COMPONENT`].
pub fn generate_app_vue(root: &Path) -> String {
    let app = root.join("App.vue");
    if !app.is_file() {
        return NULL_COMPONENT.to_owned();
    }
    format!(
        "import AppVue from {}\nexport default AppVue",
        quote_js_string(&to_at_fs(&app))
    )
}
