//! Actor Coordinator - Wires up the Sync Actor System
//!
//! The Coordinator is a thin orchestrator that:
//! - Starts the realtime server
//! - Wires up actors
//! - Runs them until shutdown
//!
//! The sync inbox is created by the caller, because the HTTP gateway needs
//! its sending half before the actors start.

mod runtime;

use std::net::IpAddr;
use std::sync::Arc;

use anyhow::Result;
use crossbeam::channel::Receiver;
use tokio::sync::mpsc;

use super::fs::{FsActor, WatchMode};
use super::messages::{SyncMsg, WsMsg};
use super::sync::{CoalesceWindow, SnapshotCell, SyncActor, SyncHandle};
use super::ws::WsActor;
use crate::photo::PhotoStore;

const CHANNEL_BUFFER: usize = 32;

/// Coordinator - wires up and runs the actor system.
pub struct Coordinator {
    store: Arc<PhotoStore>,
    cell: SnapshotCell,
    sync: SyncHandle,
    sync_rx: mpsc::UnboundedReceiver<SyncMsg>,
    window: CoalesceWindow,
    watch: Option<WatchMode>,
    ws: Option<(IpAddr, u16)>,
    shutdown_rx: Option<Receiver<()>>,
}

impl Coordinator {
    pub fn new(
        store: Arc<PhotoStore>,
        cell: SnapshotCell,
        sync: SyncHandle,
        sync_rx: mpsc::UnboundedReceiver<SyncMsg>,
    ) -> Self {
        Self {
            store,
            cell,
            sync,
            sync_rx,
            window: CoalesceWindow::default(),
            watch: None,
            ws: None,
            shutdown_rx: None,
        }
    }

    pub fn with_window(mut self, window: CoalesceWindow) -> Self {
        self.window = window;
        self
    }

    /// Observe the storage directory for external changes.
    pub fn with_watch(mut self, mode: WatchMode) -> Self {
        self.watch = Some(mode);
        self
    }

    /// Serve realtime clients on `interface:port`.
    pub fn with_ws(mut self, interface: IpAddr, port: u16) -> Self {
        self.ws = Some((interface, port));
        self
    }

    /// Set shutdown signal receiver.
    pub fn with_shutdown_signal(mut self, rx: Receiver<()>) -> Self {
        self.shutdown_rx = Some(rx);
        self
    }

    /// Run the actor system.
    pub async fn run(self) -> Result<()> {
        let (ws_tx, ws_rx) = mpsc::channel::<WsMsg>(CHANNEL_BUFFER);

        if let Some((interface, port)) = self.ws {
            match crate::realtime::server::start_ws_server(
                &interface.to_string(),
                port,
                ws_tx.clone(),
            ) {
                Ok(actual_port) => {
                    crate::cli::serve::set_actual_ws_port(actual_port);
                    crate::log!("serve"; "ws://{}:{}", interface, actual_port);
                }
                Err(e) => {
                    crate::log!("actor"; "websocket server failed: {}", e);
                }
            }
        }

        let fs_actor = match self.watch {
            Some(mode) => {
                match FsActor::new(self.store.root().to_path_buf(), mode, self.sync.clone()) {
                    Ok(actor) => Some(actor),
                    Err(e) => {
                        crate::log!("watch"; "watcher failed, external changes will be missed: {}", e);
                        None
                    }
                }
            }
            None => None,
        };

        let ws_actor = WsActor::new(ws_rx, self.cell.reader());
        let sync_actor = SyncActor::new(self.sync_rx, ws_tx.clone(), self.store, self.cell, self.window);

        crate::debug!("actor"; "start");
        runtime::run_actors(fs_actor, sync_actor, ws_actor, self.sync, ws_tx, self.shutdown_rx)
            .await;
        crate::debug!("actor"; "stopped");
        Ok(())
    }
}
