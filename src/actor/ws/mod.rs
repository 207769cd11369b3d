//! WebSocket Actor - Subscription Broadcaster
//!
//! This actor is responsible for:
//! - Subscribing new viewer connections (current snapshot first)
//! - Broadcasting every published snapshot to all subscribers
//! - Reaping connections whose peer went away
//!
//! # Architecture
//!
//! ```text
//! realtime::server --[AddClient]--+
//!                                 +--> WsActor --[photos_updated]--> Clients
//! SyncActor -------[Broadcast]----+
//! ```

mod client_io;
mod subscription;


use std::net::TcpStream;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tungstenite::WebSocket;

use super::messages::WsMsg;
use super::sync::SnapshotReader;

use client_io::ViewerSocket;
use subscription::Subscriptions;

type Clients = Subscriptions<ViewerSocket>;

/// WebSocket Actor - manages subscriptions and broadcasts
pub struct WsActor {
    /// Channel to receive messages
    rx: mpsc::Receiver<WsMsg>,
    /// Subscribed clients (shared with the reaper thread)
    subscriptions: Arc<Mutex<Clients>>,
    /// Latest published snapshot, for new subscribers
    latest: SnapshotReader,
}

impl WsActor {
    pub fn new(rx: mpsc::Receiver<WsMsg>, latest: SnapshotReader) -> Self {
        Self {
            rx,
            subscriptions: Arc::new(Mutex::new(Subscriptions::new())),
            latest,
        }
    }

    /// Run the actor event loop
    pub async fn run(mut self) {
        let stopped = Arc::new(AtomicBool::new(false));
        {
            let subscriptions = Arc::clone(&self.subscriptions);
            let stopped = Arc::clone(&stopped);
            std::thread::spawn(move || client_io::reaper_loop(subscriptions, stopped));
        }

        while let Some(msg) = self.rx.recv().await {
            match msg {
                WsMsg::Broadcast(published) => {
                    let mut subs = self.subscriptions.lock();
                    if subs.is_empty() {
                        crate::debug!("ws"; "no clients connected");
                        continue;
                    }
                    let sent = subs.broadcast(&published);
                    crate::debug!("ws"; "rev {} sent to {} clients", published.revision, sent);
                }

                WsMsg::AddClient(ws) => self.add_client(*ws),

                WsMsg::Shutdown => {
                    crate::debug!("ws"; "shutting down");
                    break;
                }
            }
        }

        stopped.store(true, Ordering::Relaxed);
        self.subscriptions.lock().close_all();
    }

    /// Subscribe a handshaken client with the snapshot current right now.
    fn add_client(&self, ws: WebSocket<TcpStream>) {
        let conn = ViewerSocket::new(ws);
        let peer = conn.peer();

        // Queued broadcasts at or below this revision are skipped for it.
        let mut subs = self.subscriptions.lock();
        let latest = self.latest.latest();

        match subs.subscribe(conn, &latest) {
            Some(handle) => crate::debug!(
                "ws"; "client {:?} subscribed at rev {} ({:?}, total: {})",
                peer, latest.revision, handle, subs.len()
            ),
            None => crate::debug!("ws"; "client {:?} failed initial delivery", peer),
        }
    }
}
