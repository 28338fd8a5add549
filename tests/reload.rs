//! Hot reload behaviour against real files.

use std::sync::Arc;
use std::time::{Duration, SystemTime};

use larvnetd::config::cleanup::{PrinterConnection, TimerHandle};
use larvnetd::config::{ArchRef, BusyState, ConfigError, ConfigStore, ParseErrorKind, ReloadError};
use larvnetd::resolver::HostResolver;
use tokio::io::AsyncReadExt;
use tokio::net::{TcpListener, TcpStream};

mod common;
use common::TempConfig;

const INITIAL: &str = "\
# priority order
rsaix
sgi
sun4   sun
-
cluster w20 x3-1234
printer ajax
ws foo
ws w20-575-[1-2]

cluster m38 x5-0000
printer helios
ws bar

cgroup main 100 200 w20 m38
option report-other other
";

fn poll_time() -> SystemTime {
    SystemTime::UNIX_EPOCH + Duration::from_secs(905_000_000)
}

#[tokio::test]
async fn test_reload_preserves_state_and_remaps_arch() {
    let file = TempConfig::new("remap", INITIAL);
    let store = ConfigStore::load(file.path()).unwrap();
    let (mut resolver, _results) = HostResolver::new().unwrap();

    let old = store.current();
    assert_eq!(old.arch_net_name(ArchRef::Known(2)), Some("sun4"));
    old.find_machine("foo").unwrap().update(|s| {
        s.busy = BusyState::Busy;
        s.arch = ArchRef::Known(2);
        s.last_status = 1;
        s.last_poll = Some(poll_time());
        s.num_polls = 7;
    });
    old.find_printer("helios").unwrap().set_status(true, 3);

    // foo moves to another cluster and sun4 moves to the front of the registry.
    file.rewrite(
        "sun4 sun\nrsaix\n-\ncluster e40 x8-1111\nws foo\nprinter helios\ncluster w20 x3-1234\nws w20-575-1\n",
    );
    let summary = store.reload(&mut resolver).unwrap();
    assert_eq!(resolver.generation(), 1);

    let new = store.current();
    assert!(!Arc::ptr_eq(&old, &new));

    let state = new.find_machine("foo").unwrap().state();
    assert_eq!(state.busy, BusyState::Busy);
    assert_eq!(state.num_polls, 7);
    assert_eq!(state.last_status, 1);
    assert_eq!(state.last_poll, Some(poll_time()));
    assert_eq!(state.arch, ArchRef::Known(0));
    assert_eq!(new.report_name(state.arch), Some("sun"));

    assert_eq!(new.find_printer("helios").unwrap().status(), (true, 3));
    assert_eq!(summary.merged.machines, 2);
    assert_eq!(summary.merged.printers, 1);
    assert_eq!(summary.machines, 2);
}

#[tokio::test]
async fn test_reload_without_arch_maps_to_other() {
    let file = TempConfig::new("retired", INITIAL);
    let store = ConfigStore::load(file.path()).unwrap();
    let (mut resolver, _results) = HostResolver::new().unwrap();

    store
        .current()
        .find_machine("foo")
        .unwrap()
        .record_poll(BusyState::Free, ArchRef::Known(2), 0, poll_time());

    file.rewrite("rsaix\nsgi\n-\ncluster w20 x3-1234\nws foo\noption report-other misc\n");
    let summary = store.reload(&mut resolver).unwrap();

    let current = store.current();
    let state = current.find_machine("foo").unwrap().state();
    assert_eq!(state.arch, ArchRef::Other);
    assert_eq!(state.num_polls, 1);
    assert_eq!(current.report_name(state.arch), Some("misc"));
    assert_eq!(summary.merged.arches_retired, 1);
}

#[tokio::test]
async fn test_grammar_error_keeps_active_configuration() {
    let file = TempConfig::new("grammar", INITIAL);
    let store = ConfigStore::load(file.path()).unwrap();
    let (mut resolver, _results) = HostResolver::new().unwrap();

    let before = store.current();
    before.find_machine("bar").unwrap().update(|s| s.num_polls = 12);

    file.rewrite("sun4\n-\nprinter early\ncluster w20 x3-1234\n");
    let err = store.reload(&mut resolver).unwrap_err();

    assert!(!err.is_fatal());
    match &err {
        ReloadError::Config(e) => assert_eq!(e.parse_kind(), Some(&ParseErrorKind::PrinterBeforeCluster)),
        other => panic!("unexpected error: {}", other),
    }
    assert_eq!(resolver.generation(), 0, "resolver untouched on rejected reload");

    let after = store.current();
    assert!(Arc::ptr_eq(&before, &after));
    assert_eq!(after.arches().len(), 3);
    assert_eq!(after.clusters().len(), 2);
    assert_eq!(after.machines().len(), 4);
    assert_eq!(after.find_machine("bar").unwrap().state().num_polls, 12);
}

#[tokio::test]
async fn test_duplicate_cgroup_membership_rejected_on_reload() {
    let file = TempConfig::new("cgroup", INITIAL);
    let store = ConfigStore::load(file.path()).unwrap();
    let (mut resolver, _results) = HostResolver::new().unwrap();

    file.rewrite("-\ncluster w20 x\ncgroup a 0 0 w20\ncgroup b 1 1 w20\n");
    let err = store.reload(&mut resolver).unwrap_err();
    assert!(matches!(
        err,
        ReloadError::Config(ConfigError::Parse {
            kind: ParseErrorKind::ClusterAlreadyGrouped(_),
            ..
        })
    ));
    assert_eq!(store.current().cgroups().len(), 1);
}

#[tokio::test]
async fn test_superseded_generation_releases_resources() {
    let file = TempConfig::new("release", INITIAL);
    let store = ConfigStore::load(file.path()).unwrap();
    let (mut resolver, _results) = HostResolver::new().unwrap();

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let client = TcpStream::connect(listener.local_addr().unwrap()).await.unwrap();
    let (mut server_side, _) = listener.accept().await.unwrap();
    let timer_task = tokio::spawn(async {
        tokio::time::sleep(Duration::from_secs(3600)).await;
    });

    // A reader keeps the old generation alive across the swap.
    let old = store.current();
    let ajax = old.find_printer("ajax").unwrap();
    ajax.set_status(true, 9);
    ajax.attach_connection(PrinterConnection::new(client));
    ajax.attach_timer(TimerHandle::from_task(&timer_task));

    file.rewrite(INITIAL);
    let summary = store.reload(&mut resolver).unwrap();
    assert_eq!(summary.released.connections, 1);
    assert_eq!(summary.released.timers, 1);

    let current = store.current();
    let new_ajax = current.find_printer("ajax").unwrap();
    assert_eq!(new_ajax.status(), (true, 9));
    assert!(!new_ajax.has_connection());
    assert!(!new_ajax.has_timer());

    assert!(!ajax.has_connection());
    let mut buf = [0u8; 4];
    assert_eq!(server_side.read(&mut buf).await.unwrap(), 0);
    assert!(timer_task.await.unwrap_err().is_cancelled());
}
