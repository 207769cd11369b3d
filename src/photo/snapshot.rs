//! Snapshot builder: raw directory listing to canonical ordered view.

use std::cmp::Ordering;

use rustc_hash::FxHashSet;
use serde::Serialize;

use super::entry::{PhotoEntry, is_image_name};
use super::store::PhotoStore;
use crate::core::FrameError;

/// Immutable ordered view of all photos at one instant.
///
/// Sorted by `created` descending, ties broken by `name` ascending.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Snapshot {
    entries: Vec<PhotoEntry>,
}

impl Snapshot {
    #[cfg(test)]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build from arbitrary entries: drops duplicate names (first wins), then sorts.
    pub fn from_entries(mut entries: Vec<PhotoEntry>) -> Self {
        let mut seen = FxHashSet::default();
        entries.retain(|e| seen.insert(e.name().to_string()));
        entries.sort_by(compare);
        Self { entries }
    }

    #[cfg(test)]
    pub fn entries(&self) -> &[PhotoEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[cfg(test)]
    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|e| e.name() == name)
    }

    #[cfg(test)]
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(PhotoEntry::name)
    }
}

/// Newest first; equal times by name so the order is total.
fn compare(a: &PhotoEntry, b: &PhotoEntry) -> Ordering {
    b.created()
        .cmp(&a.created())
        .then_with(|| a.name().cmp(b.name()))
}

/// Build a snapshot from the current storage state.
///
/// Fails only when the directory itself cannot be listed. Entries whose
/// metadata vanished between listing and stat (concurrent delete) are
/// left out.
pub fn build_snapshot(store: &PhotoStore) -> Result<Snapshot, FrameError> {
    let names = store.list()?;

    let entries = names
        .into_iter()
        .filter(|name| is_image_name(name))
        .filter_map(|name| match store.created(&name) {
            Ok(created) => Some(PhotoEntry::new(name, created)),
            Err(e) => {
                crate::debug!("snapshot"; "skipping {}: {}", name, e);
                None
            }
        })
        .collect();

    Ok(Snapshot::from_entries(entries))
}
