//! Config field path used in diagnostics.

/// Dotted path of a config key, e.g. `storage.max_files`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldPath(pub &'static str);

impl FieldPath {
    #[inline]
    pub const fn new(path: &'static str) -> Self {
        Self(path)
    }

    #[inline]
    pub const fn as_str(&self) -> &'static str {
        self.0
    }

    /// Environment variable that can set this key, if any.
    ///
    /// A bad value may have come from the environment rather than the file,
    /// so diagnostics mention it.
    pub fn env_override(&self) -> Option<&'static str> {
        match self.0 {
            "serve.port" => Some("PORT"),
            "auth.username" => Some("ADMIN_USER"),
            "auth.password" => Some("ADMIN_PASS"),
            "storage.dir" => Some("PHOTOS_DIR"),
            _ => None,
        }
    }
}
