//! Errors surfaced by the photo synchronization engine.

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Domain errors for storage access, auth and mutation requests.
///
/// None of these are fatal: request handlers turn them into HTTP responses,
/// the sync actor logs them and drops the rebuild cycle.
#[derive(Debug, Error)]
pub enum FrameError {
    #[error("storage unavailable at `{}`", .0.display())]
    StorageUnavailable(PathBuf, #[source] std::io::Error),

    #[error("unauthorized")]
    Unauthorized,

    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("too many failed login attempts, retry in {0}s")]
    TooManyAttempts(u64),

    #[error("photo not found: {0}")]
    NotFound(String),

    #[error("path escapes photo directory: {0}")]
    InvalidPath(String),

    #[error("{0}")]
    InvalidInput(String),
}

impl FrameError {
    pub fn storage(path: &Path, err: std::io::Error) -> Self {
        Self::StorageUnavailable(path.to_path_buf(), err)
    }

    /// HTTP status code for this error.
    pub const fn status(&self) -> u16 {
        match self {
            Self::StorageUnavailable(..) => 500,
            Self::Unauthorized | Self::InvalidPath(_) => 403,
            Self::InvalidCredentials => 401,
            Self::TooManyAttempts(_) => 429,
            Self::NotFound(_) => 404,
            Self::InvalidInput(_) => 400,
        }
    }

    /// Message safe to show to API clients (no server paths).
    pub fn public_message(&self) -> String {
        match self {
            Self::StorageUnavailable(..) => "Storage unavailable".to_string(),
            Self::Unauthorized => "Unauthorized".to_string(),
            Self::InvalidCredentials => "Invalid credentials".to_string(),
            Self::TooManyAttempts(secs) => format!("Too many attempts, retry in {secs}s"),
            Self::NotFound(_) => "File not found".to_string(),
            Self::InvalidPath(_) => "Invalid file path".to_string(),
            Self::InvalidInput(msg) => msg.clone(),
        }
    }
}
