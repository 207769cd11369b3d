//! URL to filesystem path resolution for the static frontend.

use std::path::{Path, PathBuf};

use crate::utils::path::join_within;

/// Resolve a URL under `public_dir`, handling index.html for directories.
///
/// Returns `None` for misses and for anything that escapes `public_dir`
/// (including through symlinks).
pub fn resolve_static(url: &str, public_dir: &Path) -> Option<PathBuf> {
    let clean = normalize_url(url)?;
    let local = join_within(public_dir, Path::new(&clean))?;

    let canonical = local.canonicalize().ok()?;
    let root_canonical = public_dir.canonicalize().ok()?;
    if !canonical.starts_with(&root_canonical) {
        return None;
    }

    if canonical.is_file() {
        return Some(canonical);
    }

    if canonical.is_dir() {
        let index = canonical.join("index.html");
        if index.is_file() {
            return Some(index);
        }
    }

    None
}

/// `index.html` served for client-side routes that have no file.
pub fn spa_fallback(public_dir: &Path) -> Option<PathBuf> {
    let index = public_dir.join("index.html");
    index.is_file().then_some(index)
}

/// Decode and strip the query string and surrounding slashes.
pub fn normalize_url(url: &str) -> Option<String> {
    use percent_encoding::percent_decode_str;

    let path = url.split(['?', '#']).next().unwrap_or(url);
    let decoded = percent_decode_str(path).decode_utf8().ok()?;
    Some(decoded.trim_matches('/').to_string())
}
