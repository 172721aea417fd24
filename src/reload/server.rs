//! Dev server seam.
//!
//! The host bundler's dev server owns the socket and the module graph. The
//! coordinator only needs to push events and extend the watch list.

use std::path::Path;

use super::message::HmrEvent;

/// What the coordinator needs from a running dev server.
pub trait DevServer: Send + Sync {
    /// Broadcast `event` to connected clients.
    fn send(&self, event: HmrEvent);

    /// Make changes to `path` trigger hot updates.
    fn add_watch_file(&self, path: &Path);
}
