//! Reload Module
//!
//! Keeps the session consistent with the files on disk while the dev
//! server runs.
//!
//! # Architecture
//!
//! ```text
//! FsWatcher -> HotReloadCoordinator -> SharedOptions (config layers)
//!  (notify)          │
//!                    └──> DevServer::send (valaxy:pageData)
//! ```
//!
//! # Modules
//!
//! - `classify` - Changed path to config layer / content / unknown
//! - `coordinator` - Per-event state machine and its effects
//! - `message` - HMR payloads pushed to clients
//! - `server` - Dev server seam (push channel, watch list)

pub mod classify;
pub mod coordinator;
pub mod message;
pub mod server;

#[cfg(test)]
mod tests;

pub use classify::{FileCategory, categorize_path};
pub use coordinator::{ConfigReloadFn, HotReloadCoordinator, HotUpdate, HotUpdateContext};
pub use message::{HmrEvent, PAGE_DATA_EVENT, PageDataPayload};
pub use server::DevServer;
