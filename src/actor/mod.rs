//! Actor System for Photo Synchronization
//!
//! Message-passing concurrency for serve mode:
//!
//! ```text
//! FsActor ----(observed)----+
//!                           +--> SyncActor --> WsActor
//! Gateway ----(mutated)-----+    (rebuild)     (broadcast)
//! ```
//!
//! # Module Structure
//!
//! - `messages` - Message types for inter-actor communication
//! - `fs` - Storage directory watcher
//! - `sync` - Trigger coalescing, snapshot rebuild and publication
//! - `ws` - Realtime subscriptions and broadcast
//! - `coordinator` - Wires up and runs actors

pub mod coordinator;
pub mod fs;
pub mod messages;
pub mod sync;
pub mod ws;

pub use coordinator::Coordinator;
