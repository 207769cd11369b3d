//! Stateless session tokens.
//!
//! Format: `<expires-unix-secs>.<hex blake3 keyed MAC over the expiry>`.
//! The MAC key is derived from the admin credential pair, so nothing is
//! stored server-side and changing the password revokes every token.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Key derivation context for session MAC keys.
const KEY_CONTEXT: &str = "photoframe 2026-10-19 session token mac key";

/// Opaque credential proving admin identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionToken(String);

impl SessionToken {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Issues and verifies session tokens.
pub struct TokenSigner {
    key: [u8; 32],
    ttl: Duration,
}

impl TokenSigner {
    pub fn new(username: &str, password: &str, ttl: Duration) -> Self {
        let mut material = Vec::with_capacity(username.len() + password.len() + 1);
        material.extend_from_slice(username.as_bytes());
        material.push(0);
        material.extend_from_slice(password.as_bytes());

        Self {
            key: blake3::derive_key(KEY_CONTEXT, &material),
            ttl,
        }
    }

    pub fn issue(&self) -> SessionToken {
        self.issue_at(now_secs())
    }

    pub fn verify(&self, token: &str) -> bool {
        self.verify_at(token, now_secs())
    }

    fn issue_at(&self, now: u64) -> SessionToken {
        let expires = now.saturating_add(self.ttl.as_secs());
        SessionToken(format!("{expires}.{}", self.mac(expires).to_hex()))
    }

    fn verify_at(&self, token: &str, now: u64) -> bool {
        let Some((expires, mac)) = token.split_once('.') else {
            return false;
        };
        let Ok(expires) = expires.parse::<u64>() else {
            return false;
        };
        if expires <= now {
            return false;
        }
        let Ok(mac) = blake3::Hash::from_hex(mac) else {
            return false;
        };
        // `blake3::Hash` equality is constant-time.
        mac == self.mac(expires)
    }

    fn mac(&self, expires: u64) -> blake3::Hash {
        blake3::keyed_hash(&self.key, expires.to_string().as_bytes())
    }
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
