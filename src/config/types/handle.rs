//! Live session options with atomic reload support.
//!
//! Uses `arc-swap` for lock-free reads and atomic replacement. Readers
//! (virtual module generators, content transforms) take a snapshot with
//! [`SharedOptions::load`] and never observe a half-merged config.
//!
//! Writers go through [`SharedOptions::update`], which holds the session
//! writer lock from snapshot to store. Two layers reloading at the same time
//! are applied one after the other, each against the other's result.

use std::sync::Arc;

use anyhow::{Context, Result};
use arc_swap::ArcSwap;
use tokio::sync::Mutex;

use crate::options::ResolvedOptions;

/// Single-writer handle over the session's [`ResolvedOptions`].
pub struct SharedOptions {
    current: ArcSwap<ResolvedOptions>,
    writer: Mutex<()>,
}

impl SharedOptions {
    pub fn new(options: ResolvedOptions) -> Self {
        Self {
            current: ArcSwap::from_pointee(options),
            writer: Mutex::new(()),
        }
    }

    /// Current snapshot.
    #[inline]
    pub fn load(&self) -> Arc<ResolvedOptions> {
        self.current.load_full()
    }

    /// Derive the next options from the current snapshot and publish them.
    ///
    /// `f` runs on the blocking pool while the writer lock is held, so it
    /// may read files. `Ok(None)` keeps the current snapshot. On error
    /// nothing is stored and the previous options stay live.
    pub async fn update<F>(&self, f: F) -> Result<Option<(Arc<ResolvedOptions>, Arc<ResolvedOptions>)>>
    where
        F: FnOnce(&ResolvedOptions) -> Result<Option<ResolvedOptions>> + Send + 'static,
    {
        let _guard = self.writer.lock().await;
        let previous = self.load();
        let snapshot = Arc::clone(&previous);
        let next = tokio::task::spawn_blocking(move || f(&snapshot))
            .await
            .context("options update panicked")??;

        let Some(next) = next else {
            return Ok(None);
        };
        let next = Arc::new(next);
        self.current.store(Arc::clone(&next));
        Ok(Some((previous, next)))
    }
}

impl std::fmt::Debug for SharedOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedOptions")
            .field("current", &self.load())
            .finish_non_exhaustive()
    }
}
