//! The active configuration and its hot reload.
//!
//! # Reload Sequence
//! ```text
//! load_config(path)               → candidate (old untouched on failure)
//! transplant_state(old, candidate)
//! resolver.reset()                → fatal on failure
//! active.store(candidate)         → readers see the new generation
//! old.release_resources()         → connections closed, timers cancelled
//! ```

use arc_swap::ArcSwap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use thiserror::Error;

use crate::config::cleanup::ReleasedResources;
use crate::config::error::ConfigError;
use crate::config::loader::load_config;
use crate::config::merge::{transplant_state, MergeSummary};
use crate::config::schema::Configuration;
use crate::observability::metrics;
use crate::resolver::{ResolutionChannel, ResolverError};

/// Errors from a reload attempt.
#[derive(Debug, Error)]
pub enum ReloadError {
    /// The candidate could not be built; the active configuration is unchanged.
    #[error("can't read new configuration: {0}")]
    Config(#[from] ConfigError),

    /// The resolution channel could not be recreated. The daemon must exit.
    #[error("can't reinitialize resolver channel: {0}")]
    Resolver(#[from] ResolverError),
}

impl ReloadError {
    /// Returns true if the daemon cannot continue.
    pub fn is_fatal(&self) -> bool {
        matches!(self, ReloadError::Resolver(_))
    }
}

/// What a successful reload did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReloadSummary {
    pub merged: MergeSummary,
    pub released: ReleasedResources,
    pub machines: usize,
    pub printers: usize,
}

/// Holds the active configuration generation.
///
/// Readers take cheap snapshots with [`ConfigStore::current`]; a reload publishes a
/// new generation with one atomic store.
pub struct ConfigStore {
    path: PathBuf,
    active: ArcSwap<Configuration>,
    reload_lock: Mutex<()>,
}

impl ConfigStore {
    /// Read the initial configuration from `path`.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let config = load_config(&path)?;
        Ok(Self::with_config(path, config))
    }

    /// Wrap an already parsed configuration; reloads read from `path`.
    pub fn with_config(path: impl Into<PathBuf>, config: Configuration) -> Self {
        metrics::record_topology(&config);
        Self {
            path: path.into(),
            active: ArcSwap::from_pointee(config),
            reload_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Snapshot of the active configuration.
    pub fn current(&self) -> Arc<Configuration> {
        self.active.load_full()
    }

    /// Reread the configuration file and replace the active generation.
    ///
    /// On error the active configuration is left exactly as it was.
    ///
    /// Runtime state is copied from the old generation before the swap. A write made
    /// to the old generation after that copy is not carried over, so pollers must be
    /// quiesced for the reload or take a fresh [`ConfigStore::current`] snapshot for
    /// every update.
    pub fn reload(&self, resolver: &mut dyn ResolutionChannel) -> Result<ReloadSummary, ReloadError> {
        let _guard = self.reload_lock.lock().unwrap_or_else(PoisonError::into_inner);
        tracing::debug!(path = %self.path.display(), "Rereading configuration");

        let candidate = match load_config(&self.path) {
            Ok(candidate) => candidate,
            Err(e) => {
                metrics::record_reload("rejected");
                return Err(e.into());
            }
        };

        let old = self.active.load_full();
        let merged = transplant_state(&old, &candidate);

        if let Err(e) = resolver.reset() {
            metrics::record_reload("fatal");
            return Err(e.into());
        }

        let (machines, printers) = (candidate.machines().len(), candidate.printers().len());
        metrics::record_topology(&candidate);
        self.active.store(Arc::new(candidate));

        let released = old.release_resources();
        drop(old);

        metrics::record_reload("success");
        metrics::record_transplanted(&merged);
        metrics::record_released(&released);

        let summary = ReloadSummary {
            merged,
            released,
            machines,
            printers,
        };
        tracing::info!(
            machines = summary.machines,
            printers = summary.printers,
            machines_kept = merged.machines,
            printers_kept = merged.printers,
            arches_remapped = merged.arches_remapped,
            arches_retired = merged.arches_retired,
            connections_closed = released.connections,
            timers_cancelled = released.timers,
            "Configuration reloaded"
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::parser::parse_config;
    use crate::config::schema::{ArchRef, BusyState};
    use std::io::Write;
    use tempfile::NamedTempFile;

    struct CountingChannel {
        resets: usize,
        fail: bool,
    }

    impl ResolutionChannel for CountingChannel {
        fn reset(&mut self) -> Result<(), ResolverError> {
            if self.fail {
                let err = tokio::runtime::Handle::try_current().unwrap_err();
                return Err(ResolverError::NoRuntime(err));
            }
            self.resets += 1;
            Ok(())
        }
    }

    fn topology_file(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_reload_swaps_generation() {
        let file = topology_file("sun4\n-\ncluster w20 x\nws foo\n");
        let store = ConfigStore::load(file.path()).unwrap();
        store
            .current()
            .find_machine("foo")
            .unwrap()
            .update(|s| s.busy = BusyState::Busy);

        std::fs::write(file.path(), "sun4\n-\ncluster w20 x\nws foo\nws bar\n").unwrap();
        let mut channel = CountingChannel { resets: 0, fail: false };
        let summary = store.reload(&mut channel).unwrap();

        assert_eq!(channel.resets, 1);
        assert_eq!(summary.machines, 2);
        assert_eq!(summary.merged.machines, 1);
        let current = store.current();
        assert_eq!(current.find_machine("foo").unwrap().state().busy, BusyState::Busy);
        assert!(current.find_machine("bar").is_some());
    }

    #[test]
    fn test_failed_resolver_reset_keeps_old_generation() {
        let config = parse_config("sun4\n-\ncluster w20 x\nws foo\n".as_bytes()).unwrap();
        config.find_machine("foo").unwrap().update(|s| s.arch = ArchRef::Known(0));
        let file = topology_file("-\ncluster w20 x\nws foo\n");
        let store = ConfigStore::with_config(file.path(), config);
        let before = store.current();

        let mut channel = CountingChannel { resets: 0, fail: true };
        let err = store.reload(&mut channel).unwrap_err();

        assert!(err.is_fatal());
        assert!(Arc::ptr_eq(&before, &store.current()));
        assert_eq!(store.current().find_machine("foo").unwrap().state().arch, ArchRef::Known(0));
    }

    #[test]
    fn test_missing_file_is_not_fatal() {
        let config = parse_config("-\n".as_bytes()).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let store = ConfigStore::with_config(dir.path().join("missing.conf"), config);
        let mut channel = CountingChannel { resets: 0, fail: false };

        let err = store.reload(&mut channel).unwrap_err();
        assert!(!err.is_fatal());
        assert!(matches!(err, ReloadError::Config(ConfigError::Open { .. })));
        assert_eq!(channel.resets, 0);
    }

    #[test]
    fn test_writes_to_superseded_generation_stay_behind() {
        let file = topology_file("-\ncluster w20 x\nws foo\n");
        let store = ConfigStore::load(file.path()).unwrap();
        let mut channel = CountingChannel { resets: 0, fail: false };

        // A poller still holding the old snapshot after the swap.
        let stale = store.current();
        stale.find_machine("foo").unwrap().update(|s| s.num_polls = 1);
        store.reload(&mut channel).unwrap();
        stale.find_machine("foo").unwrap().update(|s| s.num_polls = 2);

        let current = store.current();
        assert_eq!(current.find_machine("foo").unwrap().state().num_polls, 1);

        // Re-loading the snapshot before writing keeps the update.
        current.find_machine("foo").unwrap().update(|s| s.num_polls = 3);
        assert_eq!(store.current().find_machine("foo").unwrap().state().num_polls, 3);
    }
}
