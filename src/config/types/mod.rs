//! Configuration utility types.
//!
//! | Module   | Purpose                                      |
//! |----------|----------------------------------------------|
//! | `error`  | Configuration and build error types          |
//! | `handle` | Live session options handle (single writer)  |

mod error;
mod handle;

pub use error::{BuildError, ConfigError};
pub use handle::SharedOptions;
