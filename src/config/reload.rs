//! Debounced hot-reload of the configuration file
//!
//! Polled once per incoming note instead of watching the file: the check is
//! rate limited, compares the file's modification time against the last one
//! seen, and only then re-reads the document. Any failure keeps the old
//! configuration.

use anyhow::Result;
use std::path::PathBuf;
use std::time::{Duration, Instant, SystemTime};
use tracing::{debug, info};

use super::{modified_time, AppConfig};

/// Minimum time between two modification checks
pub const RELOAD_DEBOUNCE: Duration = Duration::from_millis(250);

/// Source of configuration documents
pub trait ConfigStore {
    /// Modification time of the backing document
    fn modified(&self) -> Result<SystemTime>;

    /// Read and parse the full document
    fn load(&self) -> Result<AppConfig>;
}

/// Config store backed by a file on disk
#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ConfigStore for FileConfigStore {
    fn modified(&self) -> Result<SystemTime> {
        modified_time(&self.path)
    }

    fn load(&self) -> Result<AppConfig> {
        AppConfig::load(&self.path)
    }
}

/// Change-detecting, rate-limited reload state
#[derive(Debug, Clone)]
pub struct ReloadGate {
    debounce: Duration,
    last_check: Option<Instant>,
    last_seen: Option<SystemTime>,
}

impl Default for ReloadGate {
    fn default() -> Self {
        Self::new(RELOAD_DEBOUNCE)
    }
}

impl ReloadGate {
    pub fn new(debounce: Duration) -> Self {
        Self {
            debounce,
            last_check: None,
            last_seen: None,
        }
    }

    /// Start from a known modification time so the startup load is not repeated
    pub fn with_observed(mut self, modified: Option<SystemTime>) -> Self {
        self.last_seen = modified;
        self
    }

    /// Return a freshly loaded config if the store changed since the last check.
    ///
    /// Never fails: errors are logged at debug level and swallowed.
    pub fn maybe_reload(&mut self, store: &dyn ConfigStore, now: Instant) -> Option<AppConfig> {
        if let Some(last) = self.last_check {
            if now.saturating_duration_since(last) < self.debounce {
                return None;
            }
        }
        self.last_check = Some(now);

        let modified = match store.modified() {
            Ok(modified) => modified,
            Err(e) => {
                debug!("Config reload check failed: {:#}", e);
                return None;
            }
        };

        if self.last_seen == Some(modified) {
            return None;
        }

        match store.load() {
            Ok(config) => {
                self.last_seen = Some(modified);
                info!(
                    "Configuration reloaded (mode: {}, tap: {}, {} mappings)",
                    config.mode,
                    config.tap_mode,
                    config.mappings.len()
                );
                Some(config)
            }
            Err(e) => {
                debug!("Config reload failed (keeping old config): {:#}", e);
                None
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::config::ConfigDocument;
    use crate::spelling::SpellingPolicy;
    use std::cell::{Cell, RefCell};
    use std::fs;
    use tempfile::TempDir;

    /// In-memory store that counts how often it is consulted
    pub(crate) struct MemoryStore {
        pub modified: Cell<SystemTime>,
        pub config: RefCell<Option<AppConfig>>,
        pub modified_calls: Cell<usize>,
        pub load_calls: Cell<usize>,
    }

    impl MemoryStore {
        pub(crate) fn new(config: AppConfig) -> Self {
            Self {
                modified: Cell::new(SystemTime::UNIX_EPOCH),
                config: RefCell::new(Some(config)),
                modified_calls: Cell::new(0),
                load_calls: Cell::new(0),
            }
        }

        /// Replace the document and bump its modification time
        pub(crate) fn update(&self, config: Option<AppConfig>) {
            self.modified.set(self.modified.get() + Duration::from_secs(1));
            *self.config.borrow_mut() = config;
        }
    }

    impl ConfigStore for MemoryStore {
        fn modified(&self) -> Result<SystemTime> {
            self.modified_calls.set(self.modified_calls.get() + 1);
            Ok(self.modified.get())
        }

        fn load(&self) -> Result<AppConfig> {
            self.load_calls.set(self.load_calls.get() + 1);
            self.config
                .borrow()
                .clone()
                .ok_or_else(|| anyhow::anyhow!("malformed document"))
        }
    }

    fn cycle_config() -> AppConfig {
        AppConfig {
            mode: SpellingPolicy::Cycle,
            ..AppConfig::default()
        }
    }

    #[test]
    fn test_checks_within_window_are_skipped() {
        let store = MemoryStore::new(AppConfig::default());
        let mut gate = ReloadGate::default();
        let t0 = Instant::now();

        assert!(gate.maybe_reload(&store, t0).is_some());
        assert!(gate.maybe_reload(&store, t0 + Duration::from_millis(100)).is_none());
        assert!(gate.maybe_reload(&store, t0 + Duration::from_millis(249)).is_none());
        assert_eq!(store.modified_calls.get(), 1);
    }

    #[test]
    fn test_window_counts_from_last_check() {
        let store = MemoryStore::new(AppConfig::default());
        let mut gate = ReloadGate::default().with_observed(Some(store.modified.get()));
        let t0 = Instant::now();

        assert!(gate.maybe_reload(&store, t0).is_none());
        assert!(gate.maybe_reload(&store, t0 + Duration::from_millis(300)).is_none());
        // 200ms after the second check, still inside its window
        store.update(Some(cycle_config()));
        assert!(gate.maybe_reload(&store, t0 + Duration::from_millis(500)).is_none());
        assert_eq!(store.modified_calls.get(), 2);

        let reloaded = gate.maybe_reload(&store, t0 + Duration::from_millis(550));
        assert_eq!(reloaded.map(|c| c.mode), Some(SpellingPolicy::Cycle));
    }

    #[test]
    fn test_reload_only_on_timestamp_change() {
        let store = MemoryStore::new(AppConfig::default());
        let mut gate = ReloadGate::default().with_observed(Some(store.modified.get()));
        let t0 = Instant::now();

        for i in 0..5 {
            assert!(gate.maybe_reload(&store, t0 + Duration::from_secs(i)).is_none());
        }
        assert_eq!(store.modified_calls.get(), 5);
        assert_eq!(store.load_calls.get(), 0);

        store.update(Some(cycle_config()));
        assert!(gate.maybe_reload(&store, t0 + Duration::from_secs(10)).is_some());
        assert!(gate.maybe_reload(&store, t0 + Duration::from_secs(11)).is_none());
        assert_eq!(store.load_calls.get(), 1);
    }

    #[test]
    fn test_failed_load_is_swallowed_and_retried() {
        let store = MemoryStore::new(AppConfig::default());
        let mut gate = ReloadGate::default().with_observed(Some(store.modified.get()));
        let t0 = Instant::now();

        store.update(None);
        assert!(gate.maybe_reload(&store, t0).is_none());
        assert_ne!(gate.last_seen, Some(store.modified.get()));

        // Fixed without touching the timestamp again: next check picks it up
        *store.config.borrow_mut() = Some(cycle_config());
        assert!(gate.maybe_reload(&store, t0 + Duration::from_secs(1)).is_some());
        assert_eq!(store.load_calls.get(), 2);
    }

    #[test]
    fn test_file_store_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileConfigStore::new(temp_dir.path().join("missing.yaml"));
        let mut gate = ReloadGate::default();

        assert!(store.modified().is_err());
        assert!(gate.maybe_reload(&store, Instant::now()).is_none());
    }

    #[test]
    fn test_file_store_picks_up_edit() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let path = temp_dir.path().join("config.yaml");
        ConfigDocument::default().save(&path)?;

        let store = FileConfigStore::new(&path);
        let mut gate = ReloadGate::default().with_observed(Some(store.modified()?));
        let t0 = Instant::now();
        assert!(gate.maybe_reload(&store, t0).is_none());

        let mut doc = ConfigDocument::default();
        doc.mode = "post".to_string();
        doc.save(&path)?;
        // Force a distinct timestamp even on coarse-grained filesystems
        let later = store.modified()? + Duration::from_secs(5);
        fs::File::options().write(true).open(&path)?.set_modified(later)?;

        let reloaded = gate.maybe_reload(&store, t0 + Duration::from_secs(1));
        assert_eq!(reloaded.map(|c| c.mode), Some(SpellingPolicy::Post));
        Ok(())
    }
}
