//! Core types - pure abstractions shared across the codebase.

mod error;
mod state;

pub use error::FrameError;
pub use state::{is_shutdown, register_server, setup_shutdown_handler};
