//! Path normalization utilities.

use std::path::{Component, Path, PathBuf};

/// Normalize a file system path to absolute form.
///
/// Tries `canonicalize()` first (resolves symlinks, `.`, `..`).
/// Falls back to:
/// - Return as-is if already absolute
/// - Join with current directory if relative
#[inline]
pub fn normalize_path(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            std::env::current_dir().map_or_else(|_| path.to_path_buf(), |cwd| cwd.join(path))
        }
    })
}

/// Join `relative` onto `root` without touching the filesystem.
///
/// `.` is dropped and `..` pops one level. Returns `None` when the result
/// would leave `root` or when `relative` is absolute.
pub fn join_within(root: &Path, relative: &Path) -> Option<PathBuf> {
    let mut joined = root.to_path_buf();
    let mut depth = 0usize;

    for component in relative.components() {
        match component {
            Component::Normal(part) => {
                joined.push(part);
                depth += 1;
            }
            Component::CurDir => {}
            Component::ParentDir => {
                if depth == 0 {
                    return None;
                }
                joined.pop();
                depth -= 1;
            }
            Component::RootDir | Component::Prefix(_) => return None,
        }
    }

    Some(joined)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_path_absolute() {
        let path = Path::new("/absolute/path/file.txt");
        let normalized = normalize_path(path);
        assert!(normalized.is_absolute());
    }

    #[test]
    fn test_normalize_path_relative() {
        let path = Path::new("relative/path/file.txt");
        let normalized = normalize_path(path);
        assert!(normalized.is_absolute());
    }

    #[test]
    fn test_join_within_plain() {
        let root = Path::new("/srv/photos");
        assert_eq!(
            join_within(root, Path::new("a.jpg")),
            Some(PathBuf::from("/srv/photos/a.jpg"))
        );
        assert_eq!(
            join_within(root, Path::new("./sub/../b.jpg")),
            Some(PathBuf::from("/srv/photos/b.jpg"))
        );
    }

    #[test]
    fn test_join_within_escapes() {
        let root = Path::new("/srv/photos");
        assert_eq!(join_within(root, Path::new("../../etc/passwd")), None);
        assert_eq!(join_within(root, Path::new("sub/../../x.jpg")), None);
        assert_eq!(join_within(root, Path::new("/etc/passwd")), None);
    }
}
