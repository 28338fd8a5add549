//! Topology file watcher for hot reload.

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::mpsc;

/// Why a reload was requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReloadTrigger {
    /// The topology file was modified, created or replaced.
    FileChanged,
}

/// A watcher that monitors the topology file for changes.
///
/// The watcher only signals; the reload itself runs on the daemon's event loop so
/// that it is serialized with everything else touching the active configuration.
pub struct ConfigWatcher {
    path: PathBuf,
    poll_interval: Duration,
    trigger_tx: mpsc::UnboundedSender<ReloadTrigger>,
}

impl ConfigWatcher {
    /// Create a new ConfigWatcher.
    ///
    /// Returns the watcher and a receiver for reload triggers.
    pub fn new(path: &Path, poll_interval: Duration) -> (Self, mpsc::UnboundedReceiver<ReloadTrigger>) {
        let (trigger_tx, trigger_rx) = mpsc::unbounded_channel();

        (
            Self {
                path: path.to_path_buf(),
                poll_interval,
                trigger_tx,
            },
            trigger_rx,
        )
    }

    /// Start watching. Dropping the returned watcher stops it.
    ///
    /// The parent directory is watched so that editors replacing the file by rename
    /// are noticed too.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let tx = self.trigger_tx.clone();
        let file_name = self.path.file_name().map(|name| name.to_os_string());
        let watch_dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    let relevant = event.kind.is_modify() || event.kind.is_create();
                    let ours = event
                        .paths
                        .iter()
                        .any(|p| p.file_name().map(|n| n.to_os_string()) == file_name);
                    if relevant && ours {
                        tracing::info!("Config file change detected, scheduling reload");
                        let _ = tx.send(ReloadTrigger::FileChanged);
                    }
                }
                Err(e) => tracing::error!("Watch error: {:?}", e),
            },
            Config::default().with_poll_interval(self.poll_interval),
        )?;

        watcher.watch(&watch_dir, RecursiveMode::NonRecursive)?;

        tracing::info!(path = ?self.path, "Config watcher started");
        Ok(watcher)
    }
}
