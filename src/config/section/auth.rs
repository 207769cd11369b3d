//! `[auth]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [auth]
//! username = "admin"
//! password = "change-me"     # Omit to generate one at startup
//! token_ttl_hours = 168      # Session lifetime
//! max_failures = 5           # Failed logins before lockout (0 = never)
//! lockout_secs = 60          # Lockout window
//! ```

use serde::{Deserialize, Serialize};

use crate::config::types::{ConfigDiagnostics, FieldPath};

/// Admin credential settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub username: String,

    /// `None` generates a random password at startup.
    pub password: Option<String>,

    pub token_ttl_hours: u64,
    pub max_failures: u32,
    pub lockout_secs: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            username: "admin".to_string(),
            password: None,
            token_ttl_hours: 168,
            max_failures: 5,
            lockout_secs: 60,
        }
    }
}

impl AuthConfig {
    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        if self.username.trim().is_empty() {
            diag.error(FieldPath::new("auth.username"), "must not be empty");
        }
        if self.password.as_deref().is_some_and(str::is_empty) {
            diag.error_with_hint(
                FieldPath::new("auth.password"),
                "must not be empty",
                "remove the key to generate a password at startup",
            );
        }
        if self.token_ttl_hours == 0 {
            diag.error(FieldPath::new("auth.token_ttl_hours"), "must be at least 1");
        }
    }
}
