//! Realtime Module
//!
//! WebSocket channel that pushes the photo list to viewers.
//!
//! ```text
//! SyncActor -> WsActor -> Browser
//!  (publish)  (broadcast)
//! ```
//!
//! - `message` - realtime message types
//! - `server` - WebSocket listener and handshake

pub mod message;
pub mod server;
