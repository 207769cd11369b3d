//! Sync Actor
//!
//! Merges the two change sources into one rebuild trigger and owns the
//! current snapshot.
//!
//! ```text
//! Gateway (mutation) --+
//!                      +--> Debouncer --> build_snapshot --> SnapshotCell --> WsActor
//! FsActor (external) --+                  (blocking pool)    (publish if changed)
//! ```

mod debouncer;
mod publish;


use std::sync::Arc;

use tokio::sync::mpsc;

use super::messages::{ChangeKind, ChangeSource, SyncMsg, Trigger, WsMsg};
use crate::photo::{PhotoStore, build_snapshot};
use crate::utils::plural::plural_count;

pub use debouncer::{ChangeSummary, CoalesceWindow};
pub use publish::{Published, SnapshotCell, SnapshotReader};

use debouncer::Debouncer;

/// Create the aggregator's inbox.
pub fn channel() -> (SyncHandle, mpsc::UnboundedReceiver<SyncMsg>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (SyncHandle { tx }, rx)
}

/// Sending side of the aggregator inbox.
///
/// Usable from plain threads (HTTP workers) as well as async tasks.
#[derive(Clone)]
pub struct SyncHandle {
    tx: mpsc::UnboundedSender<SyncMsg>,
}

impl SyncHandle {
    /// Signal a completed API mutation. Returns `false` once the actor is gone.
    pub fn mutated(&self, changes: Vec<(String, ChangeKind)>) -> bool {
        self.trigger(ChangeSource::Mutation, changes)
    }

    /// Signal externally observed changes.
    pub fn observed(&self, changes: Vec<(String, ChangeKind)>) -> bool {
        self.trigger(ChangeSource::External, changes)
    }

    pub fn shutdown(&self) {
        let _ = self.tx.send(SyncMsg::Shutdown);
    }

    fn trigger(&self, source: ChangeSource, changes: Vec<(String, ChangeKind)>) -> bool {
        self.tx
            .send(SyncMsg::Trigger(Trigger { source, changes }))
            .is_ok()
    }
}

/// Sync Actor - coalesces triggers and publishes rebuilt snapshots
pub struct SyncActor {
    rx: mpsc::UnboundedReceiver<SyncMsg>,
    ws_tx: mpsc::Sender<WsMsg>,
    store: Arc<PhotoStore>,
    cell: SnapshotCell,
    debouncer: Debouncer,
}

impl SyncActor {
    pub fn new(
        rx: mpsc::UnboundedReceiver<SyncMsg>,
        ws_tx: mpsc::Sender<WsMsg>,
        store: Arc<PhotoStore>,
        cell: SnapshotCell,
        window: CoalesceWindow,
    ) -> Self {
        Self {
            rx,
            ws_tx,
            store,
            cell,
            debouncer: Debouncer::new(window),
        }
    }

    /// Run the actor event loop
    pub async fn run(mut self) {
        loop {
            tokio::select! {
                biased;
                msg = self.rx.recv() => match msg {
                    Some(SyncMsg::Trigger(trigger)) => self.debouncer.add(trigger),
                    Some(SyncMsg::Shutdown) | None => {
                        if self.debouncer.is_pending() {
                            crate::debug!("sync"; "shutting down, dropping pending changes");
                        } else {
                            crate::debug!("sync"; "shutting down");
                        }
                        break;
                    }
                },
                _ = tokio::time::sleep(self.debouncer.sleep_duration()) => {
                    let Some(summary) = self.debouncer.take_if_ready() else {
                        continue;
                    };
                    if self.rebuild(&summary).await.is_err() {
                        break;
                    }
                }
            }
        }
    }

    /// Re-read storage and publish the result if it differs.
    ///
    /// Storage failures drop the cycle. Returns `Err(())` if WsActor shut down.
    async fn rebuild(&mut self, summary: &ChangeSummary) -> Result<(), ()> {
        crate::debug!(
            "sync"; "rebuild after {}: {}",
            plural_count(summary.triggers(), "trigger"),
            summary.describe()
        );

        let store = Arc::clone(&self.store);
        let built = match tokio::task::spawn_blocking(move || build_snapshot(&store)).await {
            Ok(built) => built,
            Err(e) => {
                crate::log!("sync"; "rebuild task failed: {}", e);
                return Ok(());
            }
        };

        let snapshot = match built {
            Ok(snapshot) => snapshot,
            Err(e) => {
                crate::log!("sync"; "rebuild failed: {}", e);
                crate::logger::status_error("rebuild failed", &e.to_string());
                return Ok(());
            }
        };

        let Some(published) = self.cell.publish(snapshot) else {
            crate::debug!("sync"; "snapshot unchanged (rev {})", self.cell.current().revision);
            return Ok(());
        };

        crate::logger::status_success(&format!(
            "{} (rev {})",
            plural_count(published.snapshot.len(), "photo"),
            published.revision
        ));

        self.ws_tx
            .send(WsMsg::Broadcast(published))
            .await
            .map_err(|_| ())
    }
}
