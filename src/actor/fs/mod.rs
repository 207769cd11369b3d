//! FileSystem Actor
//!
//! Watches the photo directory for changes made outside the API (file
//! managers, sync clients, `cp`) and forwards them to the SyncActor.
//!
//! The watcher takes its baseline when it attaches, which is after the
//! initial snapshot was built. Anything that landed in between is in the
//! baseline and never produces an event, so the actor asks for one rescan
//! as soon as it runs.
//!
//! Architecture:
//! ```text
//! Watcher (poll | native) → Classifier (photo names) → SyncHandle::observed
//! ```
//!
//! Coalescing happens in the SyncActor, which also sees API mutations.

use std::path::PathBuf;
use std::time::Duration;

use notify::{Config, PollWatcher, RecommendedWatcher, Watcher};
use tokio::sync::mpsc;

use super::sync::SyncHandle;

// Raw notify event -> photo-level changes.
mod classifier;
// Watch root attach/re-attach lifecycle.
mod watch_roots;

#[cfg(test)]
mod tests;

use classifier::classify;
use watch_roots::{RootState, WatchRoot};

/// How often the root attachment is re-checked.
const MAINTAIN_INTERVAL: Duration = Duration::from_secs(1);

/// Which notify backend to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchMode {
    /// Periodic directory scans; works on network mounts and in containers
    Poll(Duration),
    /// Platform notifications (inotify, FSEvents, ...)
    Native,
}

/// FileSystem Actor - watches the photo root
pub struct FsActor {
    /// Channel to receive notify events (sync -> async bridge)
    notify_rx: std::sync::mpsc::Receiver<notify::Result<notify::Event>>,
    /// Watcher handle (must be kept alive)
    watcher: Box<dyn Watcher + Send>,
    /// Root attachment state
    root: WatchRoot,
    /// Canonical photo root, for classification
    root_path: PathBuf,
    /// Where observed changes go
    sync: SyncHandle,
}

impl FsActor {
    /// Create a new FsActor and start watching immediately.
    pub fn new(root: PathBuf, mode: WatchMode, sync: SyncHandle) -> notify::Result<Self> {
        let (notify_tx, notify_rx) = std::sync::mpsc::channel();
        let handler = move |res: notify::Result<notify::Event>| {
            let _ = notify_tx.send(res);
        };

        let mut watcher: Box<dyn Watcher + Send> = match mode {
            WatchMode::Poll(interval) => Box::new(PollWatcher::new(
                handler,
                Config::default()
                    .with_poll_interval(interval)
                    .with_compare_contents(false),
            )?),
            WatchMode::Native => Box::new(RecommendedWatcher::new(handler, Config::default())?),
        };

        let mut watch_root = WatchRoot::new(root.clone());
        watch_root.attach(watcher.as_mut())?;

        Ok(Self {
            notify_rx,
            watcher,
            root: watch_root,
            root_path: root,
            sync,
        })
    }

    /// Run the actor event loop
    pub async fn run(self) {
        let Self {
            notify_rx,
            mut watcher,
            root: mut watch_root,
            root_path,
            sync,
        } = self;

        let (async_tx, mut async_rx) = mpsc::channel::<notify::Event>(64);

        // Spawn a thread to poll notify events and send to async channel
        std::thread::spawn(move || {
            while let Ok(result) = notify_rx.recv() {
                match result {
                    Ok(event) => {
                        if async_tx.blocking_send(event).is_err() {
                            break; // Receiver dropped
                        }
                    }
                    Err(e) => crate::log!("watch"; "notify error: {}", e),
                }
            }
        });

        // Close the gap between the initial snapshot and the baseline.
        if !sync.observed(Vec::new()) {
            return;
        }

        let mut maintain = tokio::time::interval(MAINTAIN_INTERVAL);
        maintain.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                event = async_rx.recv() => {
                    let Some(event) = event else { break };
                    let classified = classify(&event, &root_path);
                    if !classified.is_relevant() {
                        continue;
                    }
                    for (name, kind) in &classified.changes {
                        crate::debug!("watch"; "{}: {}", kind.label(), name);
                    }
                    if !sync.observed(classified.changes) {
                        break;
                    }
                }
                _ = maintain.tick() => {
                    let state = watch_root.maintain(watcher.as_mut());
                    // Contents are unknown after losing or regaining the root.
                    if state != RootState::Unchanged && !sync.observed(Vec::new()) {
                        break;
                    }
                }
            }
        }

        crate::debug!("watch"; "stopped");
    }
}
