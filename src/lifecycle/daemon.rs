//! The daemon's reload loop.

use std::sync::Arc;
use tokio::sync::{broadcast, mpsc};

use crate::config::watcher::ReloadTrigger;
use crate::config::{ConfigStore, ReloadError};
use crate::resolver::HostResolver;

/// Owns the active configuration and the resolution channel that depends on it.
pub struct Daemon {
    store: Arc<ConfigStore>,
    resolver: HostResolver,
}

impl Daemon {
    pub fn new(store: Arc<ConfigStore>, resolver: HostResolver) -> Self {
        Self { store, resolver }
    }

    pub fn store(&self) -> Arc<ConfigStore> {
        self.store.clone()
    }

    /// Serve reload triggers until shutdown.
    ///
    /// Returns an error only when a reload failed in a way the daemon cannot survive.
    pub async fn run(
        mut self,
        mut triggers: mpsc::UnboundedReceiver<ReloadTrigger>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), ReloadError> {
        let queued = self.resolver.lookup_all(&self.store.current());
        tracing::debug!(queued, "Resolving workstations");

        loop {
            tokio::select! {
                Some(trigger) = triggers.recv() => {
                    tracing::info!(?trigger, "Reloading configuration");
                    match self.store.reload(&mut self.resolver) {
                        Ok(_) => {
                            let queued = self.resolver.lookup_all(&self.store.current());
                            tracing::debug!(queued, "Resolving workstations");
                        }
                        Err(e) if e.is_fatal() => {
                            tracing::error!(error = %e, "Reload failed, aborting");
                            return Err(e);
                        }
                        Err(e) => {
                            tracing::error!(error = %e, "Reload failed, keeping current configuration");
                        }
                    }
                }
                _ = shutdown.recv() => {
                    tracing::info!("Daemon received shutdown signal, exiting loop");
                    break;
                }
            }
        }

        Ok(())
    }
}
