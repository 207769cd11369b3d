//! Actor Message Definitions
//!
//! Message types for inter-actor communication.
//!
//! ```text
//! Gateway --Trigger(Mutation)--+
//!                              +--> SyncActor --Broadcast--> WsActor
//! FsActor --Trigger(External)--+
//! ```

use std::net::TcpStream;
use std::sync::Arc;

use tungstenite::WebSocket;

use super::sync::Published;

// =============================================================================
// Change descriptions
// =============================================================================

/// What happened to a stored name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Created,
    Modified,
    Removed,
}

impl ChangeKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Modified => "modified",
            Self::Removed => "removed",
        }
    }
}

/// Where a change signal came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeSource {
    /// Completed API mutation (upload / delete)
    Mutation,
    /// Filesystem watcher observation
    External,
}

impl ChangeSource {
    pub fn label(self) -> &'static str {
        match self {
            Self::Mutation => "api",
            Self::External => "fs",
        }
    }
}

/// One rebuild request with the names it concerns.
///
/// `changes` may be empty; the rebuild always rescans storage.
#[derive(Debug, Clone)]
pub struct Trigger {
    pub source: ChangeSource,
    pub changes: Vec<(String, ChangeKind)>,
}

// =============================================================================
// SyncActor Messages
// =============================================================================

/// Messages to Sync Actor
#[derive(Debug)]
pub enum SyncMsg {
    /// Schedule a rebuild
    Trigger(Trigger),
    /// Shutdown
    Shutdown,
}

// =============================================================================
// WsActor Messages
// =============================================================================

/// Messages to WebSocket Actor
pub enum WsMsg {
    /// Push a newly published snapshot to every subscriber
    Broadcast(Arc<Published>),
    /// Add client (handshake already completed)
    AddClient(Box<WebSocket<TcpStream>>),
    /// Shutdown
    Shutdown,
}
