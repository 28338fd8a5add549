//! larvnetd: cluster workstation and printer monitor.
//!
//! # Architecture Overview
//!
//! ```text
//!   topology file ──▶ config::parser ──▶ Configuration ──▶ ConfigStore (ArcSwap)
//!        │                                                     │
//!        ▼                                                     ▼
//!   config::watcher ──trigger──▶ lifecycle::Daemon ──reload──▶ merge + swap
//!                                      │
//!                                      ▼
//!                               resolver::HostResolver
//! ```

use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

use larvnetd::config::settings::{load_settings, DaemonSettings};
use larvnetd::config::watcher::ConfigWatcher;
use larvnetd::lifecycle::startup::read_initial_config;
use larvnetd::lifecycle::{Daemon, Shutdown};
use larvnetd::observability::{logging, metrics};
use larvnetd::resolver::{channel::drain_resolutions, HostResolver};

#[derive(Parser)]
#[command(name = "larvnetd")]
#[command(about = "Cluster workstation and printer monitoring daemon", long_about = None)]
struct Cli {
    /// Daemon settings file (TOML).
    #[arg(short, long)]
    settings: Option<PathBuf>,

    /// Topology file; overrides the settings file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Do not reload when the topology file changes.
    #[arg(long)]
    no_watch: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut settings = match &cli.settings {
        Some(path) => load_settings(path)?,
        None => DaemonSettings::default(),
    };
    if let Some(config) = cli.config {
        settings.config_file = config;
    }
    if cli.no_watch {
        settings.watch.enabled = false;
    }
    settings.validate()?;

    logging::init_logging(&settings.observability);
    tracing::info!("larvnetd v0.1.0 starting");

    if settings.observability.metrics_enabled {
        metrics::init_metrics(settings.observability.metrics_address.parse()?);
    }

    let store = match read_initial_config(&settings.config_file) {
        Ok(store) => Arc::new(store),
        Err(_) => std::process::exit(1),
    };

    let (resolver, resolutions) = HostResolver::new()?;
    tokio::spawn(drain_resolutions(resolutions, resolver.generation_counter()));

    let (_watcher, triggers) = if settings.watch.enabled {
        let (watcher, triggers) = ConfigWatcher::new(
            &settings.config_file,
            Duration::from_secs(settings.watch.poll_interval_secs),
        );
        (Some(watcher.run()?), triggers)
    } else {
        let (_, triggers) = mpsc::unbounded_channel();
        (None, triggers)
    };

    let shutdown = Shutdown::new();
    shutdown.trigger_on_ctrl_c();

    let daemon = Daemon::new(store, resolver);
    if let Err(e) = daemon.run(triggers, shutdown.subscribe()).await {
        tracing::error!(error = %e, "Fatal reload error");
        std::process::exit(1);
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
