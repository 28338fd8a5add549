//! Resolution channel backed by Tokio tasks.

use std::net::IpAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tokio::runtime::{Handle, TryCurrentError};
use tokio::sync::mpsc;
use tokio::task::JoinSet;

use crate::config::Configuration;

/// Errors raised while (re)creating a resolution channel.
#[derive(Debug, Error)]
pub enum ResolverError {
    #[error("no async runtime to host resolver queries: {0}")]
    NoRuntime(#[from] TryCurrentError),
}

/// A channel whose outstanding queries can be abandoned wholesale.
pub trait ResolutionChannel {
    /// Destroy the channel, abandoning every outstanding query, and create a fresh one.
    fn reset(&mut self) -> Result<(), ResolverError>;
}

/// Outcome of one lookup.
#[derive(Debug, Clone)]
pub struct Resolution {
    pub host: String,
    /// Channel generation the query was issued under.
    pub generation: u64,
    pub addrs: Result<Vec<IpAddr>, String>,
}

/// Resolves hostnames with `tokio::net::lookup_host`.
#[derive(Debug)]
pub struct HostResolver {
    handle: Handle,
    queries: JoinSet<()>,
    generation: Arc<AtomicU64>,
    results: mpsc::UnboundedSender<Resolution>,
}

impl HostResolver {
    /// Create a resolver on the current runtime.
    ///
    /// Returns the resolver and the receiver its results are delivered on.
    pub fn new() -> Result<(Self, mpsc::UnboundedReceiver<Resolution>), ResolverError> {
        let handle = Handle::try_current()?;
        let (results, results_rx) = mpsc::unbounded_channel();
        Ok((
            Self {
                handle,
                queries: JoinSet::new(),
                generation: Arc::new(AtomicU64::new(0)),
                results,
            },
            results_rx,
        ))
    }

    /// Current channel generation.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    /// Shared view of the generation, for consumers running in other tasks.
    pub fn generation_counter(&self) -> Arc<AtomicU64> {
        self.generation.clone()
    }

    /// Number of lookups not yet reaped.
    pub fn outstanding(&self) -> usize {
        self.queries.len()
    }

    /// Start resolving `host`.
    pub fn lookup(&mut self, host: impl Into<String>) {
        while self.queries.try_join_next().is_some() {}

        let host = host.into();
        let generation = self.generation();
        let results = self.results.clone();
        self.queries.spawn_on(
            async move {
                let addrs = tokio::net::lookup_host((host.as_str(), 0))
                    .await
                    .map(|addrs| addrs.map(|addr| addr.ip()).collect())
                    .map_err(|e| e.to_string());
                let _ = results.send(Resolution {
                    host,
                    generation,
                    addrs,
                });
            },
            &self.handle,
        );
    }

    /// Start resolving every workstation of `config`.
    pub fn lookup_all(&mut self, config: &Configuration) -> usize {
        for machine in config.machines() {
            self.lookup(machine.name.clone());
        }
        config.machines().len()
    }
}

impl ResolutionChannel for HostResolver {
    fn reset(&mut self) -> Result<(), ResolverError> {
        let handle = Handle::try_current()?;

        let abandoned = self.queries.len();
        self.queries.abort_all();
        self.queries = JoinSet::new();
        self.handle = handle;
        let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;

        tracing::debug!(abandoned, generation, "Resolver channel recreated");
        Ok(())
    }
}

/// Log resolutions as they arrive, dropping those from an earlier generation.
pub async fn drain_resolutions(
    mut results: mpsc::UnboundedReceiver<Resolution>,
    generation: Arc<AtomicU64>,
) {
    while let Some(resolution) = results.recv().await {
        if resolution.generation != generation.load(Ordering::Acquire) {
            tracing::debug!(host = %resolution.host, "Discarding stale resolution");
            continue;
        }
        match resolution.addrs {
            Ok(addrs) => tracing::debug!(host = %resolution.host, ?addrs, "Resolved workstation"),
            Err(e) => tracing::warn!(host = %resolution.host, error = %e, "Can't resolve workstation"),
        }
    }
}
