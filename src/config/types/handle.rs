//! Global config handle.
//!
//! Uses `arc-swap` for lock-free reads. The config is loaded once at
//! startup and read back through [`cfg`].

use crate::config::FrameConfig;
use arc_swap::ArcSwap;
use std::sync::{Arc, LazyLock};

/// Global config storage.
pub static CONFIG: LazyLock<ArcSwap<FrameConfig>> =
    LazyLock::new(|| ArcSwap::from_pointee(FrameConfig::default()));

#[inline]
pub fn cfg() -> Arc<FrameConfig> {
    CONFIG.load_full()
}

#[inline]
pub fn init_config(config: FrameConfig) -> Arc<FrameConfig> {
    let arc = Arc::new(config);
    CONFIG.store(Arc::clone(&arc));
    arc
}
