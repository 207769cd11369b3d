//! Utility modules.
//!
//! - `date` - UTC timestamps (RFC 3339, log clock)
//! - `mime` - Content types by extension
//! - `path` - Path normalization and contained joins
//! - `plural` - Count formatting

pub mod date;
pub mod mime;
pub mod path;
pub mod plural;
