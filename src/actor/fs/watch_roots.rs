use std::path::PathBuf;

use notify::{RecursiveMode, Watcher};

/// Keeps the photo root attached to the watcher.
///
/// The root can be deleted and recreated while serving (e.g. a synced
/// folder being remounted); a fresh directory needs a fresh watch.
pub(super) struct WatchRoot {
    path: PathBuf,
    attached: bool,
}

/// What `maintain` observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum RootState {
    Unchanged,
    /// Root vanished since the last check
    Lost,
    /// Root came back and was re-attached
    Reattached,
}

impl WatchRoot {
    pub(super) fn new(path: PathBuf) -> Self {
        Self {
            path,
            attached: false,
        }
    }

    pub(super) fn attach(&mut self, watcher: &mut dyn Watcher) -> notify::Result<()> {
        if self.path.exists() {
            watcher.watch(&self.path, RecursiveMode::NonRecursive)?;
            self.attached = true;
        }
        Ok(())
    }

    pub(super) fn maintain(&mut self, watcher: &mut dyn Watcher) -> RootState {
        let exists = self.path.is_dir();

        if self.attached && !exists {
            // Drop the stale handle; ignore errors, the inode is gone anyway.
            let _ = watcher.unwatch(&self.path);
            self.attached = false;
            crate::log!("watch"; "photo directory disappeared: {}", self.path.display());
            return RootState::Lost;
        }

        if !self.attached
            && exists
            && watcher
                .watch(&self.path, RecursiveMode::NonRecursive)
                .is_ok()
        {
            self.attached = true;
            crate::debug!("watch"; "re-attached watch: {}", self.path.display());
            return RootState::Reattached;
        }

        RootState::Unchanged
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::{Config, PollWatcher};
    use std::time::Duration;
    use tempfile::TempDir;

    fn poll_watcher() -> PollWatcher {
        PollWatcher::new(
            |_res: notify::Result<notify::Event>| {},
            Config::default().with_poll_interval(Duration::from_secs(60)),
        )
        .unwrap()
    }

    #[test]
    fn test_missing_root_attaches_later() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("photos");
        let mut watcher = poll_watcher();
        let mut root = WatchRoot::new(path.clone());

        root.attach(&mut watcher).unwrap();
        assert_eq!(root.maintain(&mut watcher), RootState::Unchanged);

        std::fs::create_dir(&path).unwrap();
        assert_eq!(root.maintain(&mut watcher), RootState::Reattached);
        assert_eq!(root.maintain(&mut watcher), RootState::Unchanged);
    }

    #[test]
    fn test_lost_then_reattached() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("photos");
        std::fs::create_dir(&path).unwrap();
        let mut watcher = poll_watcher();
        let mut root = WatchRoot::new(path.clone());
        root.attach(&mut watcher).unwrap();

        std::fs::remove_dir(&path).unwrap();
        assert_eq!(root.maintain(&mut watcher), RootState::Lost);

        std::fs::create_dir(&path).unwrap();
        assert_eq!(root.maintain(&mut watcher), RootState::Reattached);
    }
}
