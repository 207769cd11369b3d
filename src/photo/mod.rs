//! Photo collection model.
//!
//! ```text
//! PhotoStore (flat dir) --build_snapshot--> Snapshot [PhotoEntry, ...]
//! ```
//!
//! - `entry` - `PhotoEntry`, extension filter, public URLs
//! - `name` - upload name sanitizing and uniquing
//! - `snapshot` - canonical ordered view + builder
//! - `store` - storage accessor with path containment

mod entry;
mod name;
mod snapshot;
mod store;

pub use entry::{PHOTOS_URL_PREFIX, is_image_name};
#[cfg(test)]
pub use entry::PhotoEntry;
pub use name::storage_name;
pub use snapshot::{Snapshot, build_snapshot};
pub use store::PhotoStore;
