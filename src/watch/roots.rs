use std::path::PathBuf;

use notify::{RecursiveMode, Watcher};
use rustc_hash::FxHashSet;

/// Keeps the watcher attached to the roots the live options name.
///
/// - Attach existing roots at startup
/// - Follow the options after a config reload (new add-on roots, a moved theme)
/// - Re-attach roots that were removed and recreated
pub(super) struct WatchRoots {
    desired: Vec<PathBuf>,
    attached: FxHashSet<PathBuf>,
}

impl WatchRoots {
    pub(super) fn new(paths: Vec<PathBuf>) -> Self {
        Self {
            desired: paths,
            attached: FxHashSet::default(),
        }
    }

    pub(super) fn attach_existing(&mut self, watcher: &mut impl Watcher) -> notify::Result<()> {
        for path in &self.desired {
            if !path.exists() {
                continue;
            }
            watcher.watch(path, RecursiveMode::Recursive)?;
            crate::debug!("watch"; "watching {}", path.display());
            self.attached.insert(path.clone());
        }
        Ok(())
    }

    /// Switch to `paths`, detaching roots that are no longer wanted.
    pub(super) fn retarget(&mut self, watcher: &mut impl Watcher, paths: Vec<PathBuf>) {
        if paths != self.desired {
            self.desired = paths;
            let desired = &self.desired;
            self.attached.retain(|path| {
                if desired.contains(path) {
                    return true;
                }
                // Fails when the root is already gone; the handle is dead either way.
                let _ = watcher.unwatch(path);
                crate::debug!("watch"; "detached {}", path.display());
                false
            });
        }
        self.maintain(watcher);
    }

    pub(super) fn maintain(&mut self, watcher: &mut impl Watcher) {
        // Drop stale handles for roots that no longer exist.
        self.attached.retain(|path| path.exists());

        for path in &self.desired {
            if self.attached.contains(path) || !path.exists() {
                continue;
            }
            match watcher.watch(path, RecursiveMode::Recursive) {
                Ok(()) => {
                    crate::debug!("watch"; "attached {}", path.display());
                    self.attached.insert(path.clone());
                }
                Err(e) => crate::log!("watch"; "cannot watch {}: {}", path.display(), e),
            }
        }
    }
}
