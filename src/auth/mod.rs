//! Admin authentication.
//!
//! - `token` - signed, expiring session tokens
//! - `throttle` - per-peer login failure lockout

mod throttle;
mod token;

use std::net::IpAddr;
use std::time::Duration;

use rand::Rng;
use rand::distributions::Alphanumeric;

use crate::config::section::AuthConfig;
use crate::core::FrameError;

pub use throttle::LoginThrottle;
pub use token::{SessionToken, TokenSigner};

/// Length of generated admin passwords.
const GENERATED_PASSWORD_LEN: usize = 8;

/// Credential checker and token authority for the single admin identity.
pub struct Authenticator {
    username: blake3::Hash,
    password: blake3::Hash,
    signer: TokenSigner,
    throttle: LoginThrottle,
}

impl Authenticator {
    pub fn new(username: &str, password: &str, ttl: Duration, throttle: LoginThrottle) -> Self {
        Self {
            username: blake3::hash(username.as_bytes()),
            password: blake3::hash(password.as_bytes()),
            signer: TokenSigner::new(username, password, ttl),
            throttle,
        }
    }

    /// Build from the `[auth]` section. `password` must already be resolved.
    pub fn from_config(auth: &AuthConfig, password: &str) -> Self {
        Self::new(
            &auth.username,
            password,
            Duration::from_secs(auth.token_ttl_hours.saturating_mul(3600)),
            LoginThrottle::new(auth.max_failures, Duration::from_secs(auth.lockout_secs)),
        )
    }

    /// Check credentials and issue a session token.
    pub fn login(
        &self,
        username: &str,
        password: &str,
        peer: Option<IpAddr>,
    ) -> Result<SessionToken, FrameError> {
        if let Some(wait) = self.throttle.check(peer) {
            return Err(FrameError::TooManyAttempts(wait.as_secs().max(1)));
        }

        // Digests have equal length and `Hash` compares in constant time.
        let user_ok = blake3::hash(username.as_bytes()) == self.username;
        let pass_ok = blake3::hash(password.as_bytes()) == self.password;

        if user_ok & pass_ok {
            self.throttle.reset(peer);
            Ok(self.signer.issue())
        } else {
            self.throttle.record_failure(peer);
            Err(FrameError::InvalidCredentials)
        }
    }

    /// Accept a request carrying `token`, if it is a live session token.
    pub fn authorize(&self, token: Option<&str>) -> Result<(), FrameError> {
        match token {
            Some(token) if self.signer.verify(token) => Ok(()),
            _ => Err(FrameError::Unauthorized),
        }
    }
}

/// Extract the token from an `Authorization: Bearer <token>` header value.
pub fn bearer_token(header: &str) -> Option<&str> {
    let (scheme, token) = header.trim().split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

/// Random alphanumeric password for deployments that configure none.
pub fn generate_password() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(GENERATED_PASSWORD_LEN)
        .map(char::from)
        .collect()
}
