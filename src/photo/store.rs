//! Storage accessor for the shared photo directory.
//!
//! The directory is a flat byte store keyed by file name. Everything that
//! touches it (snapshot builds, uploads, deletes, static serving) goes
//! through [`PhotoStore`] so path containment is checked in one place.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use crate::core::FrameError;
use crate::utils::path::{join_within, normalize_path};

/// Flat photo directory.
#[derive(Debug, Clone)]
pub struct PhotoStore {
    /// Canonical storage root.
    root: PathBuf,
}

impl PhotoStore {
    /// Open the store, creating the directory when missing.
    pub fn open(root: impl AsRef<Path>) -> Result<Self, FrameError> {
        let root = root.as_ref();
        fs::create_dir_all(root).map_err(|e| FrameError::storage(root, e))?;
        Ok(Self::at(root))
    }

    /// Use `root` as-is, without creating it.
    pub fn at(root: impl AsRef<Path>) -> Self {
        Self {
            root: normalize_path(root.as_ref()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Names of all visible regular files directly under the root.
    pub fn list(&self) -> Result<Vec<String>, FrameError> {
        let read_dir = fs::read_dir(&self.root).map_err(|e| self.unavailable(e))?;

        let mut names = Vec::new();
        for entry in read_dir {
            let entry = entry.map_err(|e| self.unavailable(e))?;
            let Ok(name) = entry.file_name().into_string() else {
                continue;
            };
            if name.starts_with('.') {
                continue;
            }
            // Follow symlinks: a link to a regular file is a photo too.
            match fs::metadata(entry.path()) {
                Ok(meta) if meta.is_file() => {
                    if self.resolve(&name).is_ok() {
                        names.push(name);
                    } else {
                        crate::debug!("store"; "skipping {}: links outside root", name);
                    }
                }
                Ok(_) => {}
                Err(e) => crate::debug!("store"; "skipping {}: {}", name, e),
            }
        }

        Ok(names)
    }

    /// Creation time of a stored file.
    ///
    /// Uses the birth time where the filesystem records one, otherwise the
    /// modification time.
    pub fn created(&self, name: &str) -> io::Result<SystemTime> {
        let meta = fs::metadata(self.root.join(name))?;
        if !meta.is_file() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "not a regular file",
            ));
        }
        meta.created().or_else(|_| meta.modified())
    }

    /// Write `bytes` under `name`.
    ///
    /// Bytes land in a hidden temp file first and are renamed into place, so
    /// listings never observe a half-written photo.
    pub fn write(&self, name: &str, bytes: &[u8]) -> Result<PathBuf, FrameError> {
        let target = self.resolve(name)?;
        let temp = self.root.join(format!(".{name}.part"));

        if let Err(e) = fs::write(&temp, bytes) {
            let _ = fs::remove_file(&temp);
            return Err(FrameError::storage(&temp, e));
        }
        if let Err(e) = fs::rename(&temp, &target) {
            let _ = fs::remove_file(&temp);
            return Err(FrameError::storage(&target, e));
        }

        Ok(target)
    }

    /// Delete the regular file stored under `name`.
    pub fn remove(&self, name: &str) -> Result<(), FrameError> {
        let path = self.resolve(name)?;

        match fs::symlink_metadata(&path) {
            Ok(meta) if meta.is_file() || meta.file_type().is_symlink() => {}
            Ok(_) => return Err(FrameError::NotFound(name.to_string())),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(FrameError::NotFound(name.to_string()));
            }
            Err(e) => return Err(FrameError::storage(&path, e)),
        }

        fs::remove_file(&path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => FrameError::NotFound(name.to_string()),
            _ => FrameError::storage(&path, e),
        })
    }

    /// Resolve `name` to a path guaranteed to stay inside the root.
    ///
    /// Rejects absolute names, `..` escapes, and existing symlinks whose
    /// target lies outside the root. Does not check existence.
    pub fn resolve(&self, name: &str) -> Result<PathBuf, FrameError> {
        let invalid = || FrameError::InvalidPath(name.to_string());

        if name.is_empty() || name.contains('\0') {
            return Err(invalid());
        }

        let resolved = join_within(&self.root, Path::new(name)).ok_or_else(invalid)?;
        if resolved == self.root {
            return Err(invalid());
        }

        match resolved.canonicalize() {
            Ok(real) if !real.starts_with(&self.root) => Err(invalid()),
            _ => Ok(resolved),
        }
    }

    fn unavailable(&self, err: io::Error) -> FrameError {
        FrameError::storage(&self.root, err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn make_store() -> (TempDir, PhotoStore) {
        let temp = TempDir::new().unwrap();
        let store = PhotoStore::open(temp.path().join("photos")).unwrap();
        (temp, store)
    }

    #[test]
    fn test_open_creates_root() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("nested").join("photos");
        let store = PhotoStore::open(&root).unwrap();
        assert!(root.is_dir());
        assert!(store.root().is_absolute());
    }

    #[test]
    fn test_list_skips_hidden_and_dirs() {
        let (_temp, store) = make_store();
        fs::write(store.root().join("a.jpg"), b"a").unwrap();
        fs::write(store.root().join("notes.txt"), b"n").unwrap();
        fs::write(store.root().join(".hidden.jpg"), b"h").unwrap();
        fs::create_dir(store.root().join("album.jpg")).unwrap();

        let mut names = store.list().unwrap();
        names.sort();
        assert_eq!(names, vec!["a.jpg", "notes.txt"]);
    }

    #[test]
    fn test_list_missing_root_is_unavailable() {
        let temp = TempDir::new().unwrap();
        let store = PhotoStore::at(temp.path().join("missing"));
        assert!(matches!(
            store.list(),
            Err(FrameError::StorageUnavailable(..))
        ));
    }

    #[test]
    fn test_write_leaves_no_temp_file() {
        let (_temp, store) = make_store();
        let path = store.write("1-2-a.png", b"png").unwrap();

        assert_eq!(fs::read(&path).unwrap(), b"png");
        assert_eq!(store.list().unwrap(), vec!["1-2-a.png"]);
        assert!(!store.root().join(".1-2-a.png.part").exists());
    }

    #[test]
    fn test_created_of_missing_file_errors() {
        let (_temp, store) = make_store();
        assert!(store.created("gone.jpg").is_err());
    }

    #[test]
    fn test_resolve_rejects_traversal() {
        let (_temp, store) = make_store();
        for name in ["../../etc/passwd", "..", "../photos2/x.jpg", "/etc/passwd", "", "a/../../b"] {
            assert!(
                matches!(store.resolve(name), Err(FrameError::InvalidPath(_))),
                "expected InvalidPath for {name:?}"
            );
        }
    }

    #[test]
    fn test_resolve_accepts_contained_names() {
        let (_temp, store) = make_store();
        assert_eq!(store.resolve("a.jpg").unwrap(), store.root().join("a.jpg"));
        assert_eq!(
            store.resolve("./b.jpg").unwrap(),
            store.root().join("b.jpg")
        );
    }

    #[test]
    fn test_remove_missing_is_not_found() {
        let (_temp, store) = make_store();
        assert!(matches!(
            store.remove("nope.jpg"),
            Err(FrameError::NotFound(_))
        ));
    }

    #[test]
    fn test_remove_directory_is_not_found() {
        let (_temp, store) = make_store();
        fs::create_dir(store.root().join("dir.jpg")).unwrap();
        assert!(matches!(
            store.remove("dir.jpg"),
            Err(FrameError::NotFound(_))
        ));
        assert!(store.root().join("dir.jpg").is_dir());
    }

    #[test]
    fn test_remove_traversal_never_touches_outside() {
        let (temp, store) = make_store();
        let outside = temp.path().join("secret.jpg");
        fs::write(&outside, b"secret").unwrap();

        assert!(matches!(
            store.remove("../secret.jpg"),
            Err(FrameError::InvalidPath(_))
        ));
        assert!(outside.exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_resolve_rejects_symlink_escape() {
        let (temp, store) = make_store();
        let outside = temp.path().join("outside.jpg");
        fs::write(&outside, b"x").unwrap();
        std::os::unix::fs::symlink(&outside, store.root().join("link.jpg")).unwrap();

        assert!(matches!(
            store.resolve("link.jpg"),
            Err(FrameError::InvalidPath(_))
        ));
        assert!(matches!(
            store.remove("link.jpg"),
            Err(FrameError::InvalidPath(_))
        ));
        assert!(outside.exists());
    }
}
