//! Realtime Message Protocol
//!
//! JSON pushed to viewers over WebSocket. Push-only: clients never need
//! to answer.
//!
//! ```json
//! {"event":"photos_updated","revision":3,"photos":[{"name":..,"url":..,"created":..}]}
//! ```

use serde::Serialize;

use crate::actor::sync::Published;
use crate::photo::Snapshot;

/// Message sent to realtime clients
#[derive(Debug, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum RealtimeMessage<'a> {
    /// Full current photo list (sent on connect and after every publish)
    PhotosUpdated { revision: u64, photos: &'a Snapshot },
}

impl<'a> RealtimeMessage<'a> {
    pub fn photos_updated(published: &'a Published) -> Self {
        Self::PhotosUpdated {
            revision: published.revision,
            photos: &published.snapshot,
        }
    }

    /// Serialize to JSON string
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| r#"{"event":"error"}"#.to_string())
    }
}
