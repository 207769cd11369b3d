//! Server lifecycle management.

use crate::{
    actor::Coordinator,
    actor::messages::SyncMsg,
    actor::sync::{SnapshotCell, SyncHandle},
    config::FrameConfig,
    core::register_server,
    log,
    photo::PhotoStore,
};
use anyhow::{Result, bail};
use crossbeam::channel::{Receiver, Sender};
use std::{
    net::{IpAddr, SocketAddr},
    sync::Arc,
    thread::{self, JoinHandle},
    time::Duration,
};
use tiny_http::Server;
use tokio::sync::mpsc;

/// Maximum number of port binding attempts.
const MAX_PORT_RETRIES: u16 = 10;

/// Bind to the specified interface and port, with automatic port retry.
///
/// Port `0` binds any free port once.
pub fn bind_with_retry(interface: IpAddr, base_port: u16) -> Result<(Server, SocketAddr)> {
    let attempts = if base_port == 0 { 1 } else { MAX_PORT_RETRIES };

    let mut last_error = None;
    for offset in 0..attempts {
        let port = base_port.saturating_add(offset);
        match Server::http(SocketAddr::new(interface, port)) {
            Ok(server) => {
                let addr = server
                    .server_addr()
                    .to_ip()
                    .unwrap_or_else(|| SocketAddr::new(interface, port));
                if offset > 0 {
                    log!("serve"; "port {} in use, using {} instead", base_port, addr.port());
                }
                return Ok((server, addr));
            }
            Err(e) => last_error = Some(e),
        }
    }

    bail!(
        "Failed to bind after {} attempts (ports {}-{}): {}",
        attempts,
        base_port,
        base_port.saturating_add(attempts - 1),
        last_error.map(|e| e.to_string()).unwrap_or_default()
    )
}

/// Register server for graceful shutdown.
///
/// When Ctrl+C is pressed, the global handler unblocks the server and
/// notifies the actor system through `shutdown_tx`.
pub fn register_server_for_shutdown(server: Arc<Server>, shutdown_tx: Sender<()>) {
    register_server(server, shutdown_tx);
}

/// Everything the actor system needs, prepared before the HTTP loop starts.
pub struct ActorParts {
    pub store: Arc<PhotoStore>,
    pub cell: SnapshotCell,
    pub sync: SyncHandle,
    pub sync_rx: mpsc::UnboundedReceiver<SyncMsg>,
}

/// Spawn the actor system on its own tokio runtime thread.
pub fn spawn_actors(
    config: Arc<FrameConfig>,
    parts: ActorParts,
    shutdown_rx: Receiver<()>,
) -> JoinHandle<()> {
    thread::spawn(move || run_actor_system(&config, parts, shutdown_rx))
}

fn run_actor_system(config: &FrameConfig, parts: ActorParts, shutdown_rx: Receiver<()>) {
    let rt = match tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            log!("actor"; "failed to create tokio runtime: {}", e);
            return;
        }
    };

    rt.block_on(async {
        let mut coordinator = Coordinator::new(parts.store, parts.cell, parts.sync, parts.sync_rx)
            .with_window(config.watch.window())
            .with_ws(config.serve.interface, config.serve.ws_port())
            .with_shutdown_signal(shutdown_rx);
        if config.watch.enable {
            coordinator = coordinator.with_watch(config.watch.mode());
        }
        if let Err(e) = coordinator.run().await {
            log!("actor"; "error: {}", e);
        }
    });
}

/// Wait for actor system to shutdown gracefully (max 2 seconds).
pub fn wait_for_shutdown(handle: JoinHandle<()>) {
    for _ in 0..40 {
        if handle.is_finished() {
            let _ = handle.join();
            return;
        }
        thread::sleep(Duration::from_millis(50));
    }
}
