//! `[serve]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [serve]
//! interface = "0.0.0.0"      # Network interface (0.0.0.0 = reachable from LAN)
//! port = 3000                # HTTP port number
//! ws_port = 3001             # Realtime WebSocket port (default: port + 1)
//! public_dir = "frontend"    # Optional static frontend (SPA fallback to index.html)
//! max_body_mb = 64           # Upload request size limit
//! ```
//!
//! Use `interface = "127.0.0.1"` to keep the server local to this machine.

use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::config::types::{ConfigDiagnostics, FieldPath};

/// HTTP and realtime server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServeConfig {
    /// Network interface to bind.
    pub interface: IpAddr,

    /// HTTP port number.
    pub port: u16,

    /// WebSocket port. `None` means `port + 1`.
    pub ws_port: Option<u16>,

    /// Directory with a prebuilt frontend to serve at `/`.
    pub public_dir: Option<PathBuf>,

    /// Maximum request body size in MiB.
    pub max_body_mb: u64,
}

impl Default for ServeConfig {
    fn default() -> Self {
        Self {
            interface: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: 3000,
            ws_port: None,
            public_dir: None,
            max_body_mb: 64,
        }
    }
}

impl ServeConfig {
    /// Effective WebSocket port.
    pub fn ws_port(&self) -> u16 {
        self.ws_port.unwrap_or(match self.port {
            0 => 0,
            port => port.saturating_add(1),
        })
    }

    pub fn max_body_bytes(&self) -> u64 {
        self.max_body_mb.saturating_mul(1024 * 1024)
    }

    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        if self.port != 0 && self.ws_port() == self.port {
            diag.error_with_hint(
                FieldPath::new("serve.ws_port"),
                format!("websocket port equals HTTP port {}", self.port),
                "remove `ws_port` to use port + 1",
            );
        }

        if self.max_body_mb == 0 {
            diag.error(FieldPath::new("serve.max_body_mb"), "must be at least 1");
        }

        if let Some(dir) = &self.public_dir
            && !dir.is_dir()
        {
            diag.error(
                FieldPath::new("serve.public_dir"),
                format!("`{}` is not a directory", dir.display()),
            );
        }
    }
}
