//! Configuration section definitions.
//!
//! Each module corresponds to a section in `photoframe.toml`:
//!
//! | Module    | TOML Section  | Purpose                               |
//! |-----------|---------------|---------------------------------------|
//! | `auth`    | `[auth]`      | Admin credentials, tokens, lockout    |
//! | `serve`   | `[serve]`     | HTTP + realtime server                |
//! | `storage` | `[storage]`   | Photo directory, upload limits        |
//! | `watch`   | `[watch]`     | External change observation           |

mod auth;
mod serve;
mod storage;
mod watch;

pub use auth::AuthConfig;
pub use serve::ServeConfig;
pub use storage::StorageConfig;
pub use watch::WatchConfig;
