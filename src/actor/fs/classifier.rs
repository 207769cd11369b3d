use std::path::Path;

use notify::EventKind;
use notify::event::{MetadataKind, ModifyKind};

use crate::actor::messages::ChangeKind;
use crate::photo::is_image_name;

/// Outcome of classifying one notify event against the photo root.
#[derive(Debug, Default, PartialEq, Eq)]
pub(super) struct Classified {
    /// Photo names directly under the root, with what happened to them
    pub(super) changes: Vec<(String, ChangeKind)>,
    /// The root itself changed; its contents must be rescanned
    pub(super) rescan: bool,
}

impl Classified {
    pub(super) fn is_relevant(&self) -> bool {
        self.rescan || !self.changes.is_empty()
    }
}

/// Map a raw notify event to photo-level changes.
///
/// Only image files directly under `root` count. Editor and upload temp
/// files are ignored, as are metadata changes other than a new write time.
pub(super) fn classify(event: &notify::Event, root: &Path) -> Classified {
    let mut classified = Classified::default();

    let kind = match event.kind {
        EventKind::Create(_) => Some(ChangeKind::Created),
        EventKind::Remove(_) => Some(ChangeKind::Removed),
        // Renames arrive as one or two events; existence tells which side this is.
        EventKind::Modify(ModifyKind::Name(_)) => None,
        // Polling reports content updates as write-time changes.
        EventKind::Modify(ModifyKind::Metadata(MetadataKind::WriteTime)) => {
            Some(ChangeKind::Modified)
        }
        EventKind::Modify(ModifyKind::Metadata(_)) => return classified,
        EventKind::Modify(_) => Some(ChangeKind::Modified),
        _ => return classified,
    };

    crate::debug!("watch"; "raw notify: {:?} {:?}", event.kind, event.paths);

    for path in &event.paths {
        if path == root {
            classified.rescan = true;
            continue;
        }
        if path.parent() != Some(root) {
            continue;
        }

        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if is_temp_file(name) || !is_image_name(name) {
            continue;
        }

        let kind = kind.unwrap_or_else(|| {
            if path.exists() {
                ChangeKind::Created
            } else {
                ChangeKind::Removed
            }
        });
        classified.changes.push((name.to_string(), kind));
    }

    classified
}

/// Check if name is a temp/backup file (editor or upload artifacts).
fn is_temp_file(name: &str) -> bool {
    let ext = Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("");

    matches!(ext, "bck" | "bak" | "backup" | "swp" | "swo" | "tmp" | "part")
        || name.ends_with('~')
        || name.starts_with('.')
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{CreateKind, DataChange, RemoveKind, RenameMode};
    use std::path::PathBuf;

    const ROOT: &str = "/srv/photos";

    fn event(kind: EventKind, paths: &[&str]) -> notify::Event {
        notify::Event {
            kind,
            paths: paths.iter().map(PathBuf::from).collect(),
            attrs: Default::default(),
        }
    }

    fn run(kind: EventKind, paths: &[&str]) -> Classified {
        classify(&event(kind, paths), Path::new(ROOT))
    }

    #[test]
    fn test_create_remove_modify() {
        let created = run(EventKind::Create(CreateKind::File), &["/srv/photos/a.jpg"]);
        assert_eq!(created.changes, vec![("a.jpg".to_string(), ChangeKind::Created)]);

        let removed = run(EventKind::Remove(RemoveKind::File), &["/srv/photos/a.jpg"]);
        assert_eq!(removed.changes, vec![("a.jpg".to_string(), ChangeKind::Removed)]);

        let modified = run(
            EventKind::Modify(ModifyKind::Data(DataChange::Any)),
            &["/srv/photos/a.png"],
        );
        assert_eq!(modified.changes, vec![("a.png".to_string(), ChangeKind::Modified)]);
    }

    #[test]
    fn test_write_time_counts_other_metadata_does_not() {
        let write = run(
            EventKind::Modify(ModifyKind::Metadata(MetadataKind::WriteTime)),
            &["/srv/photos/a.jpg"],
        );
        assert!(write.is_relevant());

        let chmod = run(
            EventKind::Modify(ModifyKind::Metadata(MetadataKind::Permissions)),
            &["/srv/photos/a.jpg"],
        );
        assert!(!chmod.is_relevant());
    }

    #[test]
    fn test_ignores_non_images_temp_and_nested() {
        for path in [
            "/srv/photos/notes.txt",
            "/srv/photos/.1-2-a.jpg.part",
            "/srv/photos/a.jpg~",
            "/srv/photos/album/a.jpg",
            "/srv/other/a.jpg",
        ] {
            let classified = run(EventKind::Create(CreateKind::File), &[path]);
            assert!(!classified.is_relevant(), "{path} should be ignored");
        }
    }

    #[test]
    fn test_root_event_requests_rescan() {
        let classified = run(
            EventKind::Modify(ModifyKind::Data(DataChange::Any)),
            &[ROOT],
        );
        assert!(classified.rescan);
        assert!(classified.changes.is_empty());
    }

    #[test]
    fn test_rename_resolved_by_existence() {
        // Neither side exists under a fake root: the file moved away.
        let renamed = run(
            EventKind::Modify(ModifyKind::Name(RenameMode::Both)),
            &["/srv/photos/old.jpg", "/srv/photos/new.jpg"],
        );
        assert_eq!(
            renamed.changes,
            vec![
                ("old.jpg".to_string(), ChangeKind::Removed),
                ("new.jpg".to_string(), ChangeKind::Removed),
            ]
        );
    }

    #[test]
    fn test_rename_into_root_is_created() {
        let temp = tempfile::TempDir::new().unwrap();
        let root = temp.path();
        std::fs::write(root.join("new.jpg"), b"x").unwrap();

        let event = notify::Event {
            kind: EventKind::Modify(ModifyKind::Name(RenameMode::To)),
            paths: vec![root.join("new.jpg")],
            attrs: Default::default(),
        };
        let classified = classify(&event, root);
        assert_eq!(classified.changes, vec![("new.jpg".to_string(), ChangeKind::Created)]);
    }

    #[test]
    fn test_access_events_ignored() {
        let classified = run(
            EventKind::Access(notify::event::AccessKind::Any),
            &["/srv/photos/a.jpg"],
        );
        assert!(!classified.is_relevant());
    }
}
