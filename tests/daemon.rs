//! Reload loop and file watcher.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

use larvnetd::config::watcher::{ConfigWatcher, ReloadTrigger};
use larvnetd::config::ConfigStore;
use larvnetd::lifecycle::{Daemon, Shutdown};
use larvnetd::resolver::HostResolver;

mod common;
use common::{wait_for, TempConfig};

const TOPOLOGY: &str = "sun4\n-\ncluster w20 x3-1234\nws w20-575-1\n";

#[tokio::test]
async fn test_daemon_reloads_on_trigger() {
    let file = TempConfig::new("daemon", TOPOLOGY);
    let store = Arc::new(ConfigStore::load(file.path()).unwrap());
    let (resolver, _results) = HostResolver::new().unwrap();

    let shutdown = Shutdown::new();
    let (trigger_tx, triggers) = mpsc::unbounded_channel();
    let daemon = Daemon::new(store.clone(), resolver);
    let handle = tokio::spawn(daemon.run(triggers, shutdown.subscribe()));

    // Rejected reload: the daemon keeps running on the old configuration.
    file.rewrite("-\nws orphan\n");
    trigger_tx.send(ReloadTrigger::FileChanged).unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(!handle.is_finished());
    assert_eq!(store.current().machines().len(), 1);

    file.rewrite("sun4\n-\ncluster w20 x3-1234\nws w20-575-[1-4]\n");
    trigger_tx.send(ReloadTrigger::FileChanged).unwrap();
    let reloaded = wait_for(Duration::from_secs(5), || store.current().machines().len() == 4).await;
    assert!(reloaded, "daemon should publish the new configuration");

    shutdown.trigger();
    let result = tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("daemon should stop on shutdown")
        .unwrap();
    assert!(result.is_ok());
}

#[tokio::test]
async fn test_watcher_signals_file_change() {
    let file = TempConfig::new("watch", TOPOLOGY);
    let (watcher, mut triggers) = ConfigWatcher::new(file.path(), Duration::from_millis(100));
    let _watcher = watcher.run().unwrap();

    // Give the backend a moment to register before touching the file.
    tokio::time::sleep(Duration::from_millis(200)).await;
    file.rewrite("sun4\n-\ncluster w20 x3-1234\n");

    let trigger = tokio::time::timeout(Duration::from_secs(10), triggers.recv())
        .await
        .expect("watcher should report the change");
    assert_eq!(trigger, Some(ReloadTrigger::FileChanged));
}
