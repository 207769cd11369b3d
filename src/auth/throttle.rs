use std::net::IpAddr;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use rustc_hash::FxHashMap;

/// Per-peer login failure counter.
///
/// After `max_failures` failures inside `window` the peer is locked out
/// until the window (counted from its first failure) has passed.
/// `max_failures == 0` disables throttling.
pub struct LoginThrottle {
    max_failures: u32,
    window: Duration,
    peers: Mutex<FxHashMap<Option<IpAddr>, Failures>>,
}

struct Failures {
    count: u32,
    since: Instant,
}

impl LoginThrottle {
    pub fn new(max_failures: u32, window: Duration) -> Self {
        Self {
            max_failures,
            window,
            peers: Mutex::new(FxHashMap::default()),
        }
    }

    /// Remaining lockout for `peer`, if locked out.
    pub fn check(&self, peer: Option<IpAddr>) -> Option<Duration> {
        self.check_at(peer, Instant::now())
    }

    pub fn record_failure(&self, peer: Option<IpAddr>) {
        self.record_failure_at(peer, Instant::now());
    }

    pub fn reset(&self, peer: Option<IpAddr>) {
        self.peers.lock().remove(&peer);
    }

    fn check_at(&self, peer: Option<IpAddr>, now: Instant) -> Option<Duration> {
        if self.max_failures == 0 {
            return None;
        }

        let mut peers = self.peers.lock();
        let failures = peers.get(&peer)?;
        let elapsed = now.saturating_duration_since(failures.since);

        if elapsed >= self.window {
            peers.remove(&peer);
            return None;
        }

        (failures.count >= self.max_failures).then(|| self.window - elapsed)
    }

    fn record_failure_at(&self, peer: Option<IpAddr>, now: Instant) {
        if self.max_failures == 0 {
            return;
        }

        let mut peers = self.peers.lock();
        // Expire every peer here, not only ones that come back to `check`.
        peers.retain(|_, f| now.saturating_duration_since(f.since) < self.window);

        let failures = peers.entry(peer).or_insert(Failures {
            count: 0,
            since: now,
        });

        failures.count += 1;

        if failures.count == self.max_failures {
            let who = peer.map_or_else(|| "unknown peer".to_string(), |ip| ip.to_string());
            crate::log!("security"; "login locked for {} after {} failures", who, failures.count);
        }
    }
}
