//! Path and URL utilities.
//!
//! Pure functions for path manipulation, apart from the existence probes in
//! [`fs`].
//!
//! - [`fs`]: Filesystem paths (`normalize_path`, `find_up`, `to_slash`)
//! - [`route`]: Dev server URLs (`to_at_fs`, `page_route`)

pub mod fs;
pub mod route;

pub use fs::{find_up, normalize_path, to_slash};
pub use route::{page_route, to_at_fs};
