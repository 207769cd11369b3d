//! Single-writer cell holding the current published snapshot.

use std::sync::Arc;

use arc_swap::ArcSwap;
use serde::Serialize;

use crate::photo::Snapshot;

/// A snapshot stamped with the revision it was published under.
#[derive(Debug, PartialEq, Eq, Serialize)]
pub struct Published {
    pub revision: u64,
    #[serde(rename = "photos")]
    pub snapshot: Snapshot,
}

/// Owner of the current snapshot.
///
/// Not `Clone`: whoever holds the cell is the only writer. Everyone else
/// reads through a [`SnapshotReader`].
pub struct SnapshotCell {
    current: Arc<ArcSwap<Published>>,
}

impl SnapshotCell {
    /// Start at revision 1 with `initial`.
    pub fn new(initial: Snapshot) -> Self {
        Self {
            current: Arc::new(ArcSwap::from_pointee(Published {
                revision: 1,
                snapshot: initial,
            })),
        }
    }

    pub fn reader(&self) -> SnapshotReader {
        SnapshotReader {
            current: Arc::clone(&self.current),
        }
    }

    pub fn current(&self) -> Arc<Published> {
        self.current.load_full()
    }

    /// Publish `snapshot` under the next revision.
    ///
    /// Returns `None` (and keeps the revision) when it equals the current one.
    pub fn publish(&mut self, snapshot: Snapshot) -> Option<Arc<Published>> {
        let current = self.current.load();
        if current.snapshot == snapshot {
            return None;
        }

        let next = Arc::new(Published {
            revision: current.revision + 1,
            snapshot,
        });
        self.current.store(Arc::clone(&next));
        Some(next)
    }
}

/// Read-only handle to the current published snapshot.
#[derive(Clone)]
pub struct SnapshotReader {
    current: Arc<ArcSwap<Published>>,
}

impl SnapshotReader {
    pub fn latest(&self) -> Arc<Published> {
        self.current.load_full()
    }
}
