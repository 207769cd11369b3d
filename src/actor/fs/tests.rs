use std::fs;
use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;
use tokio::sync::mpsc;
use tokio::time::timeout;

use super::{FsActor, WatchMode};
use crate::actor::messages::{ChangeKind, ChangeSource, SyncMsg, Trigger, WsMsg};
use crate::actor::sync::{self, CoalesceWindow, SnapshotCell, SyncActor};
use crate::photo::{PhotoStore, build_snapshot};

const POLL: WatchMode = WatchMode::Poll(Duration::from_millis(50));

fn make_store() -> (TempDir, PhotoStore) {
    let temp = TempDir::new().unwrap();
    let store = PhotoStore::open(temp.path().join("photos")).unwrap();
    (temp, store)
}

/// Next trigger naming at least one photo. Bare rescans (the root's own
/// write time moves whenever an entry is added) are skipped.
async fn next_trigger(rx: &mut mpsc::UnboundedReceiver<SyncMsg>) -> Trigger {
    loop {
        match timeout(Duration::from_secs(3), rx.recv()).await {
            Ok(Some(SyncMsg::Trigger(trigger))) if trigger.changes.is_empty() => continue,
            Ok(Some(SyncMsg::Trigger(trigger))) => return trigger,
            other => panic!("expected trigger, got {other:?}"),
        }
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_external_addition_is_observed() {
    let (_temp, store) = make_store();
    let (handle, mut sync_rx) = sync::channel();
    let actor = FsActor::new(store.root().to_path_buf(), POLL, handle).unwrap();
    tokio::spawn(actor.run());

    // Let the poller take its baseline scan.
    tokio::time::sleep(Duration::from_millis(150)).await;
    fs::write(store.root().join("c.jpg"), b"jpeg").unwrap();

    let trigger = next_trigger(&mut sync_rx).await;
    assert_eq!(trigger.source, ChangeSource::External);
    assert_eq!(trigger.changes, vec![("c.jpg".to_string(), ChangeKind::Created)]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_external_removal_is_observed() {
    let (_temp, store) = make_store();
    fs::write(store.root().join("a.jpg"), b"jpeg").unwrap();

    let (handle, mut sync_rx) = sync::channel();
    let actor = FsActor::new(store.root().to_path_buf(), POLL, handle).unwrap();
    tokio::spawn(actor.run());

    tokio::time::sleep(Duration::from_millis(150)).await;
    fs::remove_file(store.root().join("a.jpg")).unwrap();

    let trigger = next_trigger(&mut sync_rx).await;
    assert_eq!(trigger.changes, vec![("a.jpg".to_string(), ChangeKind::Removed)]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_non_images_are_not_forwarded() {
    let (_temp, store) = make_store();
    let (handle, mut sync_rx) = sync::channel();
    let actor = FsActor::new(store.root().to_path_buf(), POLL, handle).unwrap();
    tokio::spawn(actor.run());

    tokio::time::sleep(Duration::from_millis(150)).await;
    fs::write(store.root().join("notes.txt"), b"text").unwrap();
    fs::write(store.root().join(".hidden.jpg"), b"x").unwrap();
    tokio::time::sleep(Duration::from_millis(300)).await;
    fs::write(store.root().join("d.png"), b"png").unwrap();

    // The first forwarded trigger is the image.
    let trigger = next_trigger(&mut sync_rx).await;
    assert_eq!(trigger.changes, vec![("d.png".to_string(), ChangeKind::Created)]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_external_addition_reaches_broadcast() {
    let (_temp, store) = make_store();
    fs::write(store.root().join("a.jpg"), b"jpeg").unwrap();
    let store = Arc::new(store);

    let (handle, sync_rx) = sync::channel();
    let fs_actor = FsActor::new(store.root().to_path_buf(), POLL, handle).unwrap();

    let cell = SnapshotCell::new(build_snapshot(&store).unwrap());
    let (ws_tx, mut ws_rx) = mpsc::channel(32);
    let window = CoalesceWindow {
        debounce: Duration::from_millis(50),
        cooldown: Duration::from_millis(100),
    };
    let sync_actor = SyncActor::new(sync_rx, ws_tx, Arc::clone(&store), cell, window);

    tokio::spawn(fs_actor.run());
    tokio::spawn(sync_actor.run());

    tokio::time::sleep(Duration::from_millis(150)).await;
    fs::write(store.root().join("c.jpg"), b"jpeg").unwrap();

    let published = match timeout(Duration::from_secs(3), ws_rx.recv()).await {
        Ok(Some(WsMsg::Broadcast(published))) => published,
        _ => panic!("no broadcast"),
    };
    let names: Vec<_> = published.snapshot.names().collect();
    assert_eq!(names, vec!["c.jpg", "a.jpg"]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_photo_added_before_watcher_attaches_is_published() {
    // Same order as `serve`: initial snapshot first, actors afterwards.
    let (_temp, store) = make_store();
    let store = Arc::new(store);
    let cell = SnapshotCell::new(build_snapshot(&store).unwrap());

    // Lands after the snapshot but before the watcher's baseline scan.
    fs::write(store.root().join("early.jpg"), b"jpeg").unwrap();

    let (handle, sync_rx) = sync::channel();
    let fs_actor = FsActor::new(store.root().to_path_buf(), POLL, handle).unwrap();
    let (ws_tx, mut ws_rx) = mpsc::channel(32);
    let window = CoalesceWindow {
        debounce: Duration::from_millis(50),
        cooldown: Duration::from_millis(100),
    };
    let sync_actor = SyncActor::new(sync_rx, ws_tx, Arc::clone(&store), cell, window);

    tokio::spawn(fs_actor.run());
    tokio::spawn(sync_actor.run());

    let published = match timeout(Duration::from_secs(3), ws_rx.recv()).await {
        Ok(Some(WsMsg::Broadcast(published))) => published,
        _ => panic!("early.jpg was never published"),
    };
    assert_eq!(published.revision, 2);
    let names: Vec<_> = published.snapshot.names().collect();
    assert_eq!(names, vec!["early.jpg"]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_startup_requests_one_rescan() {
    let (_temp, store) = make_store();
    let (handle, mut sync_rx) = sync::channel();
    let actor = FsActor::new(store.root().to_path_buf(), POLL, handle).unwrap();
    tokio::spawn(actor.run());

    match timeout(Duration::from_secs(1), sync_rx.recv()).await {
        Ok(Some(SyncMsg::Trigger(trigger))) => {
            assert_eq!(trigger.source, ChangeSource::External);
            assert!(trigger.changes.is_empty());
        }
        other => panic!("expected startup rescan, got {other:?}"),
    }
}
