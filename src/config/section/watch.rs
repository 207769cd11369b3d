//! `[watch]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [watch]
//! enable = true            # Pick up files added outside the API
//! poll = true              # Poll instead of native notifications
//! poll_interval_ms = 1000  # Poll period
//! debounce_ms = 300        # Quiet time before a rebuild
//! cooldown_ms = 800        # Minimum gap between rebuilds
//! ```
//!
//! Polling is the default because native notifications are unreliable on
//! network shares and bind mounts, where shared photo folders often live.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::actor::fs::WatchMode;
use crate::actor::sync::CoalesceWindow;
use crate::config::types::{ConfigDiagnostics, FieldPath};

/// Change observation and coalescing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchConfig {
    pub enable: bool,
    pub poll: bool,
    pub poll_interval_ms: u64,
    pub debounce_ms: u64,
    pub cooldown_ms: u64,
}

impl Default for WatchConfig {
    fn default() -> Self {
        let window = CoalesceWindow::default();
        Self {
            enable: true,
            poll: true,
            poll_interval_ms: 1000,
            debounce_ms: window.debounce.as_millis() as u64,
            cooldown_ms: window.cooldown.as_millis() as u64,
        }
    }
}

impl WatchConfig {
    pub fn mode(&self) -> WatchMode {
        if self.poll {
            WatchMode::Poll(Duration::from_millis(self.poll_interval_ms))
        } else {
            WatchMode::Native
        }
    }

    pub fn window(&self) -> CoalesceWindow {
        CoalesceWindow {
            debounce: Duration::from_millis(self.debounce_ms),
            cooldown: Duration::from_millis(self.cooldown_ms),
        }
    }

    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        if self.enable && self.poll && self.poll_interval_ms == 0 {
            diag.error(FieldPath::new("watch.poll_interval_ms"), "must be at least 1");
        }
    }
}
