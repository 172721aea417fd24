//! File system driver for the hot reload coordinator.
//!
//! ```text
//! notify ──► crossbeam ──► bridge thread ──► tokio mpsc ──► Debouncer
//!                                                              │
//!                                  spawn handle_hot_update ◄───┘ per path
//! ```
//!
//! The watcher is attached in [`FsWatcher::new`], so changes made while the
//! host finishes its initial build are buffered rather than lost. Each
//! debounced path becomes its own task: content updates run concurrently and
//! config reloads queue on the session writer lock.

mod debouncer;
mod roots;


pub use debouncer::ChangeKind;

use std::path::PathBuf;
use std::sync::Arc;

use crossbeam::channel::{self, Receiver};
use notify::RecommendedWatcher;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::options::ResolvedOptions;
use crate::reload::{FileCategory, HotReloadCoordinator, HotUpdate, HotUpdateContext, categorize_path};
use debouncer::Debouncer;
use roots::WatchRoots;

/// Roots watched for `options`: the user config file, the client, theme and
/// user roots, then every add-on root.
pub fn watch_paths(options: &ResolvedOptions) -> Vec<PathBuf> {
    let mut paths = vec![
        options.config_file.clone(),
        options.client_root.clone(),
        options.theme_root.clone(),
        options.user_root.clone(),
    ];
    paths.extend(options.addons.iter().map(|addon| addon.root.clone()));
    paths.dedup();
    paths
}

pub struct FsWatcher {
    notify_rx: Receiver<notify::Result<notify::Event>>,
    /// Dropping the watcher stops events.
    watcher: RecommendedWatcher,
    roots: WatchRoots,
    coordinator: Arc<HotReloadCoordinator>,
    updates: Option<mpsc::UnboundedSender<HotUpdate>>,
}

impl FsWatcher {
    /// Start watching `paths`. Paths that do not exist yet are skipped.
    pub fn new(paths: &[PathBuf], coordinator: Arc<HotReloadCoordinator>) -> notify::Result<Self> {
        let (notify_tx, notify_rx) = channel::unbounded();
        let mut watcher = notify::recommended_watcher(move |res| {
            let _ = notify_tx.send(res);
        })?;

        let mut roots = WatchRoots::new(paths.to_vec());
        roots.attach_existing(&mut watcher)?;

        Ok(Self {
            notify_rx,
            watcher,
            roots,
            coordinator,
            updates: None,
        })
    }

    /// Forward every non-ignored [`HotUpdate`], e.g. to invalidate modules.
    pub fn with_updates(mut self, tx: mpsc::UnboundedSender<HotUpdate>) -> Self {
        self.updates = Some(tx);
        self
    }

    /// Event loop. Returns when the notify side shuts down.
    ///
    /// After every config reload the watch set follows [`watch_paths`] of the
    /// new options, so add-on roots activated by the reload are watched too.
    pub async fn run(self) {
        let Self {
            notify_rx,
            mut watcher,
            mut roots,
            coordinator,
            updates,
        } = self;
        let mut debouncer = Debouncer::new();
        let (retarget_tx, mut retarget_rx) = mpsc::unbounded_channel();
        let dispatcher = Dispatcher {
            coordinator: Arc::clone(&coordinator),
            updates,
            retarget: Some(retarget_tx),
        };

        let (async_tx, mut async_rx) = mpsc::channel::<notify::Event>(64);
        std::thread::spawn(move || {
            while let Ok(result) = notify_rx.recv() {
                match result {
                    Ok(event) => {
                        if async_tx.blocking_send(event).is_err() {
                            break;
                        }
                    }
                    Err(e) => crate::log!("watch"; "notify error: {}", e),
                }
            }
        });

        loop {
            tokio::select! {
                biased;
                event = async_rx.recv() => match event {
                    Some(event) => debouncer.add_event(&event),
                    None => break,
                },
                Some(()) = retarget_rx.recv() => {
                    while retarget_rx.try_recv().is_ok() {}
                    roots.retarget(&mut watcher, watch_paths(&coordinator.options().load()));
                }
                _ = tokio::time::sleep(debouncer.sleep_duration()) => {
                    let Some(changes) = debouncer.take_if_ready() else {
                        continue;
                    };
                    roots.maintain(&mut watcher);
                    for (path, kind) in changes {
                        dispatcher.dispatch(path, kind);
                    }
                }
            }
        }
    }
}

/// Hands debounced changes to the coordinator.
struct Dispatcher {
    coordinator: Arc<HotReloadCoordinator>,
    updates: Option<mpsc::UnboundedSender<HotUpdate>>,
    /// Signalled after each config reload.
    retarget: Option<mpsc::UnboundedSender<()>>,
}

impl Dispatcher {
    /// Run one change on its own task.
    ///
    /// A removed content file has nothing left to compile and yields `None`;
    /// removed config files still reload so the layer falls back to empty.
    fn dispatch(&self, path: PathBuf, kind: ChangeKind) -> Option<JoinHandle<()>> {
        if kind == ChangeKind::Removed {
            let options = self.coordinator.options().load();
            if !matches!(categorize_path(&path, &options), FileCategory::Config(_)) {
                crate::debug!("watch"; "skip removed {}", path.display());
                return None;
            }
        }

        let coordinator = Arc::clone(&self.coordinator);
        let updates = self.updates.clone();
        let retarget = self.retarget.clone();
        Some(tokio::spawn(async move {
            let mut ctx = HotUpdateContext::new(path);
            match coordinator.handle_hot_update(&mut ctx).await {
                Ok(HotUpdate::Ignored) => {}
                Ok(update) => {
                    if matches!(update, HotUpdate::Invalidate { .. })
                        && let Some(tx) = &retarget
                    {
                        let _ = tx.send(());
                    }
                    if let Some(tx) = updates {
                        let _ = tx.send(update);
                    }
                }
                Err(e) => crate::log!("error"; "{:#}", e),
            }
        }))
    }
}
