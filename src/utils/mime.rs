//! Content types for photo bytes and the frontend bundle.
//!
//! Only what this server actually hands out is listed; anything else goes
//! out as `application/octet-stream`.

use std::path::Path;

/// Content types referenced directly by response code.
pub mod types {
    pub const JSON: &str = "application/json";
    pub const PLAIN: &str = "text/plain; charset=utf-8";
    pub const OCTET_STREAM: &str = "application/octet-stream";
}

/// Extension (lowercase) to content type.
const BY_EXTENSION: &[(&str, &str)] = &[
    // photos
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("png", "image/png"),
    ("gif", "image/gif"),
    ("webp", "image/webp"),
    // frontend bundle
    ("html", "text/html; charset=utf-8"),
    ("htm", "text/html; charset=utf-8"),
    ("css", "text/css; charset=utf-8"),
    ("js", "text/javascript; charset=utf-8"),
    ("mjs", "text/javascript; charset=utf-8"),
    ("json", types::JSON),
    ("map", types::JSON),
    ("txt", types::PLAIN),
    ("svg", "image/svg+xml"),
    ("ico", "image/x-icon"),
    ("woff", "font/woff"),
    ("woff2", "font/woff2"),
    ("ttf", "font/ttf"),
    ("wasm", "application/wasm"),
];

/// Content type for a file, by extension (case-insensitive).
pub fn from_path(path: &Path) -> &'static str {
    path.extension()
        .and_then(|e| e.to_str())
        .and_then(|ext| {
            BY_EXTENSION
                .iter()
                .find(|(known, _)| ext.eq_ignore_ascii_case(known))
        })
        .map_or(types::OCTET_STREAM, |(_, mime)| mime)
}
