use std::time::Duration;

use crossbeam::channel::Receiver;
use tokio::sync::mpsc;

use crate::actor::fs::FsActor;
use crate::actor::messages::WsMsg;
use crate::actor::sync::{SyncActor, SyncHandle};
use crate::actor::ws::WsActor;

/// Grace period for each actor to finish after shutdown is requested.
const SHUTDOWN_GRACE: Duration = Duration::from_millis(500);

/// Run all actors until the shutdown signal, or until SyncActor exits.
pub(super) async fn run_actors(
    fs: Option<FsActor>,
    sync: SyncActor,
    ws: WsActor,
    sync_handle: SyncHandle,
    ws_tx: mpsc::Sender<WsMsg>,
    shutdown_rx: Option<Receiver<()>>,
) {
    let fs_handle = fs.map(|fs| tokio::spawn(async move { fs.run().await }));
    let mut sync_task = tokio::spawn(async move { sync.run().await });
    let ws_handle = tokio::spawn(async move { ws.run().await });

    match shutdown_rx {
        Some(rx) => loop {
            if rx.try_recv().is_ok() {
                crate::debug!("actor"; "shutdown signal received");
                break;
            }
            tokio::select! {
                _ = &mut sync_task => break,
                _ = tokio::time::sleep(Duration::from_millis(100)) => {}
            }
        },
        None => {
            let _ = (&mut sync_task).await;
        }
    }

    if let Some(handle) = fs_handle {
        handle.abort();
    }

    sync_handle.shutdown();
    if !sync_task.is_finished() {
        let _ = tokio::time::timeout(SHUTDOWN_GRACE, sync_task).await;
    }

    crate::debug!("actor"; "sending shutdown to ws");
    let _ = ws_tx.send(WsMsg::Shutdown).await;
    let _ = tokio::time::timeout(SHUTDOWN_GRACE, ws_handle).await;
}
