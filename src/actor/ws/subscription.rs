//! Subscription registry.
//!
//! Tracks live viewer connections and the revision each one last received.
//! Generic over [`Connection`] so delivery rules are independent of the
//! transport.

use crate::actor::sync::Published;
use crate::realtime::message::RealtimeMessage;

/// The peer is gone; drop the subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectionClosed;

/// A push-only viewer connection.
pub trait Connection {
    /// Queue `text` for delivery. A send that cannot complete right now must
    /// stay buffered and succeed; a dead peer or a full buffer is an error.
    fn send_text(&mut self, text: &str) -> Result<(), ConnectionClosed>;

    /// Flush buffered output and drain inbound frames. `false` once the peer
    /// has closed or the socket failed.
    fn poll_alive(&mut self) -> bool;

    /// Earlier output is still waiting for the peer to read it.
    fn is_backlogged(&self) -> bool;

    /// Best-effort close.
    fn disconnect(&mut self);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionHandle(u64);

struct Subscriber<C> {
    handle: SubscriptionHandle,
    conn: C,
    /// Revision last delivered to this connection
    delivered: u64,
}

/// Set of subscribed connections.
///
/// A backlogged connection is skipped by `broadcast` and caught up with the
/// newest revision once `reap` sees its backlog drain, so a slow reader
/// holds at most one pending snapshot.
pub struct Subscriptions<C> {
    next_id: u64,
    subscribers: Vec<Subscriber<C>>,
    /// Newest broadcast revision and its encoded message
    latest: Option<(u64, String)>,
}

impl<C: Connection> Subscriptions<C> {
    pub fn new() -> Self {
        Self {
            next_id: 0,
            subscribers: Vec::new(),
            latest: None,
        }
    }

    pub fn len(&self) -> usize {
        self.subscribers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscribers.is_empty()
    }

    /// Deliver `latest` to `conn`, then add it to the broadcast set.
    ///
    /// A connection that fails this first delivery is closed and never added.
    pub fn subscribe(&mut self, mut conn: C, latest: &Published) -> Option<SubscriptionHandle> {
        let text = RealtimeMessage::photos_updated(latest).to_json();
        if conn.send_text(&text).is_err() {
            conn.disconnect();
            return None;
        }

        self.next_id += 1;
        let handle = SubscriptionHandle(self.next_id);
        self.subscribers.push(Subscriber {
            handle,
            conn,
            delivered: latest.revision,
        });
        Some(handle)
    }

    /// Remove and close a subscription. Returns `false` if it was already gone.
    pub fn unsubscribe(&mut self, handle: SubscriptionHandle) -> bool {
        let Some(pos) = self.subscribers.iter().position(|s| s.handle == handle) else {
            return false;
        };
        self.subscribers.remove(pos).conn.disconnect();
        true
    }

    /// Push `published` to every subscriber that has an older revision.
    ///
    /// Backlogged subscribers are skipped. Failing connections are dropped
    /// without affecting the rest. Returns the number of connections the
    /// message was delivered to.
    pub fn broadcast(&mut self, published: &Published) -> usize {
        let revision = published.revision;
        if self.latest.as_ref().is_some_and(|(latest, _)| *latest >= revision) {
            return 0;
        }
        let text = RealtimeMessage::photos_updated(published).to_json();

        let mut sent = 0;
        self.subscribers.retain_mut(|sub| {
            if sub.delivered >= revision {
                return true;
            }
            if sub.conn.is_backlogged() {
                crate::debug!("ws"; "{:?} backlogged, skipping rev {}", sub.handle, revision);
                return true;
            }
            match deliver(sub, revision, &text) {
                Ok(()) => {
                    sent += 1;
                    true
                }
                Err(ConnectionClosed) => false,
            }
        });

        self.latest = Some((revision, text));
        sent
    }

    /// Drop connections whose peer went away and catch up the ones whose
    /// backlog drained. Returns how many were removed.
    pub fn reap(&mut self) -> usize {
        let dead: Vec<_> = self
            .subscribers
            .iter_mut()
            .filter_map(|sub| (!sub.conn.poll_alive()).then_some(sub.handle))
            .collect();
        for handle in &dead {
            self.unsubscribe(*handle);
        }

        let before = self.subscribers.len();
        if let Some((revision, text)) = &self.latest {
            self.subscribers.retain_mut(|sub| {
                if sub.delivered >= *revision || sub.conn.is_backlogged() {
                    return true;
                }
                deliver(sub, *revision, text).is_ok()
            });
        }

        dead.len() + before - self.subscribers.len()
    }

    pub fn close_all(&mut self) {
        for mut sub in self.subscribers.drain(..) {
            sub.conn.disconnect();
        }
    }
}

/// Send `text` (encoding `revision`) to one subscriber, closing it on failure.
fn deliver<C: Connection>(
    sub: &mut Subscriber<C>,
    revision: u64,
    text: &str,
) -> Result<(), ConnectionClosed> {
    match sub.conn.send_text(text) {
        Ok(()) => {
            sub.delivered = revision;
            Ok(())
        }
        Err(ConnectionClosed) => {
            crate::debug!("ws"; "dropping subscriber {:?}", sub.handle);
            sub.conn.disconnect();
            Err(ConnectionClosed)
        }
    }
}

impl<C: Connection> Default for Subscriptions<C> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::photo::{PhotoEntry, Snapshot};
    use std::cell::RefCell;
    use std::rc::Rc;
    use std::time::UNIX_EPOCH;

    /// Records every delivered message; can be told to fail or stall.
    #[derive(Default)]
    struct FakeConn {
        sent: Rc<RefCell<Vec<String>>>,
        fail_send: bool,
        alive: bool,
        backlogged: bool,
        closed: Rc<RefCell<bool>>,
    }

    impl FakeConn {
        fn healthy() -> Self {
            Self {
                alive: true,
                ..Default::default()
            }
        }
    }

    impl Connection for FakeConn {
        fn send_text(&mut self, text: &str) -> Result<(), ConnectionClosed> {
            if self.fail_send {
                return Err(ConnectionClosed);
            }
            self.sent.borrow_mut().push(text.to_string());
            Ok(())
        }

        fn poll_alive(&mut self) -> bool {
            self.alive
        }

        fn is_backlogged(&self) -> bool {
            self.backlogged
        }

        fn disconnect(&mut self) {
            *self.closed.borrow_mut() = true;
        }
    }

    fn published(revision: u64, names: &[&str]) -> Published {
        Published {
            revision,
            snapshot: Snapshot::from_entries(
                names.iter().map(|n| PhotoEntry::new(*n, UNIX_EPOCH)).collect(),
            ),
        }
    }

    fn revision_of(text: &str) -> u64 {
        let json: serde_json::Value = serde_json::from_str(text).unwrap();
        json["revision"].as_u64().unwrap()
    }

    #[test]
    fn test_subscribe_delivers_current_snapshot_once() {
        let mut subs = Subscriptions::new();
        let conn = FakeConn::healthy();
        let sent = Rc::clone(&conn.sent);

        let handle = subs.subscribe(conn, &published(1, &["a.jpg"]));
        assert!(handle.is_some());
        assert_eq!(subs.len(), 1);
        assert_eq!(sent.borrow().len(), 1);
        assert!(sent.borrow()[0].contains("\"a.jpg\""));
    }

    #[test]
    fn test_subscribe_empty_snapshot() {
        let mut subs = Subscriptions::new();
        let conn = FakeConn::healthy();
        let sent = Rc::clone(&conn.sent);

        subs.subscribe(conn, &published(1, &[])).unwrap();
        assert!(sent.borrow()[0].ends_with(r#""photos":[]}"#));
    }

    #[test]
    fn test_failed_first_delivery_is_not_added() {
        let mut subs = Subscriptions::new();
        let conn = FakeConn {
            fail_send: true,
            ..FakeConn::healthy()
        };
        let closed = Rc::clone(&conn.closed);

        assert!(subs.subscribe(conn, &published(1, &[])).is_none());
        assert!(subs.is_empty());
        assert!(*closed.borrow());
    }

    #[test]
    fn test_broadcast_reaches_all_and_drops_failures() {
        let mut subs = Subscriptions::new();
        let good = FakeConn::healthy();
        let good_sent = Rc::clone(&good.sent);
        subs.subscribe(good, &published(1, &[])).unwrap();

        let flaky = FakeConn::healthy();
        let flaky_closed = Rc::clone(&flaky.closed);
        subs.subscribe(flaky, &published(1, &[])).unwrap();
        // Make the second connection fail from now on.
        subs.subscribers[1].conn.fail_send = true;

        let sent = subs.broadcast(&published(2, &["a.jpg"]));
        assert_eq!(sent, 1);
        assert_eq!(subs.len(), 1);
        assert!(*flaky_closed.borrow());
        assert_eq!(revision_of(good_sent.borrow().last().unwrap()), 2);
    }

    #[test]
    fn test_never_sends_older_revision() {
        let mut subs = Subscriptions::new();
        let conn = FakeConn::healthy();
        let sent = Rc::clone(&conn.sent);
        subs.subscribe(conn, &published(5, &["new.jpg"])).unwrap();

        assert_eq!(subs.broadcast(&published(4, &["old.jpg"])), 0);
        assert_eq!(subs.broadcast(&published(5, &["new.jpg"])), 0);
        assert_eq!(sent.borrow().len(), 1);

        assert_eq!(subs.broadcast(&published(6, &[])), 1);
        let revisions: Vec<_> = sent.borrow().iter().map(|t| revision_of(t)).collect();
        assert_eq!(revisions, vec![5, 6]);
    }

    #[test]
    fn test_unsubscribe() {
        let mut subs = Subscriptions::new();
        let conn = FakeConn::healthy();
        let closed = Rc::clone(&conn.closed);
        let handle = subs.subscribe(conn, &published(1, &[])).unwrap();

        assert!(subs.unsubscribe(handle));
        assert!(subs.is_empty());
        assert!(*closed.borrow());
        assert!(!subs.unsubscribe(handle));
    }

    #[test]
    fn test_reap_removes_dead_peers() {
        let mut subs = Subscriptions::new();
        let dead = FakeConn::healthy();
        let dead_closed = Rc::clone(&dead.closed);
        subs.subscribe(dead, &published(1, &[])).unwrap();
        subs.subscribe(FakeConn::healthy(), &published(1, &[])).unwrap();
        subs.subscribers[0].conn.alive = false;

        assert_eq!(subs.reap(), 1);
        assert_eq!(subs.len(), 1);
        assert!(*dead_closed.borrow());
    }

    #[test]
    fn test_stalled_subscriber_only_gets_newest_revision() {
        let mut subs = Subscriptions::new();
        let slow = FakeConn::healthy();
        let slow_sent = Rc::clone(&slow.sent);
        subs.subscribe(slow, &published(1, &[])).unwrap();
        let fast = FakeConn::healthy();
        let fast_sent = Rc::clone(&fast.sent);
        subs.subscribe(fast, &published(1, &[])).unwrap();

        // First viewer stops reading; its flush never completes.
        subs.subscribers[0].conn.backlogged = true;
        assert_eq!(subs.broadcast(&published(2, &["a.jpg"])), 1);
        assert_eq!(subs.broadcast(&published(3, &["a.jpg", "b.jpg"])), 1);
        assert_eq!(slow_sent.borrow().len(), 1);

        // Still stalled: reaping keeps it but sends nothing.
        assert_eq!(subs.reap(), 0);
        assert_eq!(slow_sent.borrow().len(), 1);

        subs.subscribers[0].conn.backlogged = false;
        assert_eq!(subs.reap(), 0);
        let slow_revs: Vec<_> = slow_sent.borrow().iter().map(|t| revision_of(t)).collect();
        assert_eq!(slow_revs, vec![1, 3]);
        assert!(slow_sent.borrow()[1].contains("\"b.jpg\""));

        let fast_revs: Vec<_> = fast_sent.borrow().iter().map(|t| revision_of(t)).collect();
        assert_eq!(fast_revs, vec![1, 2, 3]);

        // Caught up: another reap sends nothing more.
        subs.reap();
        assert_eq!(slow_sent.borrow().len(), 2);
    }

    #[test]
    fn test_catch_up_failure_drops_subscriber() {
        let mut subs = Subscriptions::new();
        let conn = FakeConn::healthy();
        let closed = Rc::clone(&conn.closed);
        subs.subscribe(conn, &published(1, &[])).unwrap();

        subs.subscribers[0].conn.backlogged = true;
        subs.broadcast(&published(2, &[]));
        subs.subscribers[0].conn.backlogged = false;
        subs.subscribers[0].conn.fail_send = true;

        assert_eq!(subs.reap(), 1);
        assert!(subs.is_empty());
        assert!(*closed.borrow());
    }

    #[test]
    fn test_close_all() {
        let mut subs = Subscriptions::new();
        let conn = FakeConn::healthy();
        let closed = Rc::clone(&conn.closed);
        subs.subscribe(conn, &published(1, &[])).unwrap();

        subs.close_all();
        assert!(subs.is_empty());
        assert!(*closed.borrow());
    }
}
