use std::time::{Duration, Instant};

use rustc_hash::FxHashMap;

use crate::actor::messages::{ChangeKind, ChangeSource, Trigger};

pub const DEBOUNCE_MS: u64 = 300;
pub const REBUILD_COOLDOWN_MS: u64 = 800;

/// Timing for collapsing trigger bursts into one rebuild.
#[derive(Debug, Clone, Copy)]
pub struct CoalesceWindow {
    /// Quiet period after the last trigger
    pub debounce: Duration,
    /// Minimum gap between two rebuilds
    pub cooldown: Duration,
}

impl Default for CoalesceWindow {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(DEBOUNCE_MS),
            cooldown: Duration::from_millis(REBUILD_COOLDOWN_MS),
        }
    }
}

/// What a coalesced batch of triggers amounted to. Only used for logging.
#[derive(Debug, Default)]
pub struct ChangeSummary {
    /// Net change per name, sorted by name
    pub changes: Vec<(String, ChangeKind)>,
    pub mutations: usize,
    pub external: usize,
}

impl ChangeSummary {
    pub fn triggers(&self) -> usize {
        self.mutations + self.external
    }

    pub fn describe(&self) -> String {
        let names = match self.changes.as_slice() {
            [] => "rescan".to_string(),
            [(name, kind)] => format!("{} {}", kind.label(), name),
            many => format!("{} names", many.len()),
        };
        format!(
            "{} (api: {}, fs: {})",
            names, self.mutations, self.external
        )
    }
}

/// Pure debouncer: only handles timing and per-name deduplication.
pub(super) struct Debouncer {
    window: CoalesceWindow,
    changes: FxHashMap<String, ChangeKind>,
    mutations: usize,
    external: usize,
    last_event: Option<Instant>,
    last_rebuild: Option<Instant>,
}

impl Debouncer {
    pub(super) fn new(window: CoalesceWindow) -> Self {
        Self {
            window,
            changes: FxHashMap::default(),
            mutations: 0,
            external: 0,
            last_event: None,
            last_rebuild: None,
        }
    }

    /// Record a trigger, applying dedup rules per name:
    /// - Removed + Created/Modified → the restore event
    /// - Modified + Removed → Removed
    /// - Created + Removed → dropped
    /// - otherwise first event wins
    pub(super) fn add(&mut self, trigger: Trigger) {
        self.add_at(trigger, Instant::now());
    }

    fn add_at(&mut self, trigger: Trigger, now: Instant) {
        match trigger.source {
            ChangeSource::Mutation => self.mutations += 1,
            ChangeSource::External => self.external += 1,
        }
        self.last_event = Some(now);

        for (name, kind) in trigger.changes {
            let Some(&existing) = self.changes.get(&name) else {
                crate::debug!("sync"; "{} {}: {}", trigger.source.label(), kind.label(), name);
                self.changes.insert(name, kind);
                continue;
            };

            match (existing, kind) {
                (ChangeKind::Removed, ChangeKind::Created | ChangeKind::Modified) => {
                    self.changes.insert(name, kind);
                }
                (ChangeKind::Modified, ChangeKind::Removed) => {
                    self.changes.insert(name, ChangeKind::Removed);
                }
                (ChangeKind::Created, ChangeKind::Removed) => {
                    crate::debug!("sync"; "discard created+removed: {}", name);
                    self.changes.remove(&name);
                }
                _ => {}
            }
        }
    }

    /// Take the pending batch if debounce and cooldown have both elapsed.
    pub(super) fn take_if_ready(&mut self) -> Option<ChangeSummary> {
        self.take_if_ready_at(Instant::now())
    }

    fn take_if_ready_at(&mut self, now: Instant) -> Option<ChangeSummary> {
        if !self.is_ready_at(now) {
            return None;
        }

        let mut changes: Vec<_> = std::mem::take(&mut self.changes).into_iter().collect();
        changes.sort_unstable_by(|a, b| a.0.cmp(&b.0));

        let summary = ChangeSummary {
            changes,
            mutations: std::mem::take(&mut self.mutations),
            external: std::mem::take(&mut self.external),
        };
        self.last_event = None;
        self.last_rebuild = Some(now);
        Some(summary)
    }

    pub(super) fn is_pending(&self) -> bool {
        self.last_event.is_some()
    }

    fn is_ready_at(&self, now: Instant) -> bool {
        let Some(last_event) = self.last_event else {
            return false;
        };

        if now.saturating_duration_since(last_event) < self.window.debounce {
            return false;
        }

        if let Some(last_rebuild) = self.last_rebuild
            && now.saturating_duration_since(last_rebuild) < self.window.cooldown
        {
            return false;
        }

        true
    }

    /// Precise sleep duration until next possible ready time.
    pub(super) fn sleep_duration(&self) -> Duration {
        self.sleep_duration_at(Instant::now())
    }

    fn sleep_duration_at(&self, now: Instant) -> Duration {
        let Some(last_event) = self.last_event else {
            return Duration::from_secs(86400);
        };

        let debounce_remaining = self
            .window
            .debounce
            .saturating_sub(now.saturating_duration_since(last_event));

        let cooldown_remaining = self
            .last_rebuild
            .map(|t| self.window.cooldown.saturating_sub(now.saturating_duration_since(t)))
            .unwrap_or(Duration::ZERO);

        debounce_remaining
            .max(cooldown_remaining)
            .max(Duration::from_millis(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    fn trigger(source: ChangeSource, changes: &[(&str, ChangeKind)]) -> Trigger {
        Trigger {
            source,
            changes: changes.iter().map(|(n, k)| (n.to_string(), *k)).collect(),
        }
    }

    fn external(name: &str, kind: ChangeKind) -> Trigger {
        trigger(ChangeSource::External, &[(name, kind)])
    }

    #[test]
    fn test_not_ready_without_triggers() {
        let mut debouncer = Debouncer::new(CoalesceWindow::default());
        assert!(!debouncer.is_pending());
        assert!(debouncer.take_if_ready_at(Instant::now()).is_none());
        assert_eq!(debouncer.sleep_duration(), Duration::from_secs(86400));
    }

    #[test]
    fn test_burst_collapses_into_one_batch() {
        let mut debouncer = Debouncer::new(CoalesceWindow::default());
        let start = Instant::now();

        for i in 0..10 {
            let name = format!("{i}.jpg");
            debouncer.add_at(external(&name, ChangeKind::Created), start + ms(i * 50));
        }
        let last = start + ms(450);

        assert!(debouncer.take_if_ready_at(last + ms(299)).is_none());
        let summary = debouncer.take_if_ready_at(last + ms(300)).unwrap();
        assert_eq!(summary.changes.len(), 10);
        assert_eq!(summary.triggers(), 10);

        assert!(!debouncer.is_pending());
        assert!(debouncer.take_if_ready_at(last + ms(600)).is_none());
    }

    #[test]
    fn test_empty_trigger_still_schedules_rebuild() {
        let mut debouncer = Debouncer::new(CoalesceWindow::default());
        let start = Instant::now();
        debouncer.add_at(trigger(ChangeSource::Mutation, &[]), start);

        let summary = debouncer.take_if_ready_at(start + ms(300)).unwrap();
        assert!(summary.changes.is_empty());
        assert_eq!(summary.mutations, 1);
        assert_eq!(summary.describe(), "rescan (api: 1, fs: 0)");
    }

    #[test]
    fn test_cooldown_delays_next_batch() {
        let mut debouncer = Debouncer::new(CoalesceWindow::default());
        let start = Instant::now();

        debouncer.add_at(external("a.jpg", ChangeKind::Created), start);
        let rebuilt = start + ms(300);
        assert!(debouncer.take_if_ready_at(rebuilt).is_some());

        debouncer.add_at(external("b.jpg", ChangeKind::Created), rebuilt + ms(10));
        // Debounce elapsed, cooldown not yet
        assert!(debouncer.take_if_ready_at(rebuilt + ms(400)).is_none());
        assert_eq!(debouncer.sleep_duration_at(rebuilt + ms(400)), ms(400));
        assert!(debouncer.take_if_ready_at(rebuilt + ms(800)).is_some());
    }

    #[test]
    fn test_removed_then_created_is_created() {
        let mut debouncer = Debouncer::new(CoalesceWindow::default());
        let start = Instant::now();
        debouncer.add_at(external("a.jpg", ChangeKind::Removed), start);
        debouncer.add_at(external("a.jpg", ChangeKind::Created), start);

        let summary = debouncer.take_if_ready_at(start + ms(300)).unwrap();
        assert_eq!(summary.changes, vec![("a.jpg".to_string(), ChangeKind::Created)]);
    }

    #[test]
    fn test_modified_then_removed_is_removed() {
        let mut debouncer = Debouncer::new(CoalesceWindow::default());
        let start = Instant::now();
        debouncer.add_at(external("a.jpg", ChangeKind::Modified), start);
        debouncer.add_at(external("a.jpg", ChangeKind::Removed), start);

        let summary = debouncer.take_if_ready_at(start + ms(300)).unwrap();
        assert_eq!(summary.changes, vec![("a.jpg".to_string(), ChangeKind::Removed)]);
    }

    #[test]
    fn test_created_then_removed_is_dropped_but_still_rebuilds() {
        let mut debouncer = Debouncer::new(CoalesceWindow::default());
        let start = Instant::now();
        debouncer.add_at(external("a.jpg", ChangeKind::Created), start);
        debouncer.add_at(external("a.jpg", ChangeKind::Removed), start);

        let summary = debouncer.take_if_ready_at(start + ms(300)).unwrap();
        assert!(summary.changes.is_empty());
        assert_eq!(summary.external, 2);
    }

    #[test]
    fn test_first_event_wins_otherwise() {
        let mut debouncer = Debouncer::new(CoalesceWindow::default());
        let start = Instant::now();
        debouncer.add_at(external("a.jpg", ChangeKind::Created), start);
        debouncer.add_at(external("a.jpg", ChangeKind::Modified), start);

        let summary = debouncer.take_if_ready_at(start + ms(300)).unwrap();
        assert_eq!(summary.changes, vec![("a.jpg".to_string(), ChangeKind::Created)]);
    }

    #[test]
    fn test_sources_counted_separately() {
        let mut debouncer = Debouncer::new(CoalesceWindow::default());
        let start = Instant::now();
        debouncer.add_at(
            trigger(
                ChangeSource::Mutation,
                &[("1-2-a.png", ChangeKind::Created), ("1-3-b.png", ChangeKind::Created)],
            ),
            start,
        );
        debouncer.add_at(external("1-2-a.png", ChangeKind::Created), start);

        let summary = debouncer.take_if_ready_at(start + ms(300)).unwrap();
        assert_eq!(summary.mutations, 1);
        assert_eq!(summary.external, 1);
        assert_eq!(summary.changes.len(), 2);
        assert_eq!(summary.describe(), "2 names (api: 1, fs: 1)");
    }
}
