//! `photoframe list`: print the current snapshot as JSON.

use anyhow::{Context, Result};

use crate::config::FrameConfig;
use crate::photo::{PhotoStore, Snapshot, build_snapshot};

/// Build a snapshot of the configured directory and print it to stdout.
pub fn list_photos(config: &FrameConfig, pretty: bool) -> Result<()> {
    let store = PhotoStore::at(&config.storage.dir);
    let snapshot = build_snapshot(&store)
        .with_context(|| format!("Failed to list {}", config.storage.dir.display()))?;

    println!("{}", render(&snapshot, pretty)?);
    Ok(())
}

fn render(snapshot: &Snapshot, pretty: bool) -> Result<String> {
    let formatted = if pretty {
        serde_json::to_string_pretty(snapshot)?
    } else {
        serde_json::to_string(snapshot)?
    };
    Ok(formatted)
}
