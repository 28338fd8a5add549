//! Topology data model.
//!
//! One `Configuration` is one generation of the topology: architectures, clusters,
//! printers, workstations and cluster groups, plus the global report options.
//! Cross references are positional indices into the owning generation.

use serde::Serialize;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::SystemTime;

use crate::config::cleanup::{PrinterConnection, TimerHandle};
use crate::config::collection::EntityList;

/// Index of a cluster within its generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ClusterId(pub usize);

/// Index of a cluster group within its generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct CGroupId(pub usize);

/// Reference to an architecture of the owning generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ArchRef {
    /// Not determined yet.
    #[default]
    Unknown,
    /// Determined, but not in the registry.
    Other,
    /// Position in the architecture registry.
    Known(usize),
}

/// Busy state of a workstation as last reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BusyState {
    #[default]
    Unknown,
    Free,
    Busy,
}

/// A recognized architecture.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Architecture {
    /// Name reported by workstations over the network.
    pub net_name: String,
    /// Name used in reports.
    pub report_name: String,
}

/// A cluster of workstations and printers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Cluster {
    pub name: String,
    pub phone: String,
    pub cgroup: Option<CGroupId>,
}

/// A display group of clusters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CGroup {
    pub name: String,
    pub x: i32,
    pub y: i32,
    pub clusters: Vec<ClusterId>,
}

/// Global report redirection options.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GlobalOptions {
    /// Report target for workstations of an unlisted architecture.
    pub report_other: Option<String>,
    /// Report target for workstations whose architecture is not known yet.
    pub report_unknown: Option<String>,
}

/// Runtime state of a workstation, owned by the polling code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct MachineState {
    pub busy: BusyState,
    pub arch: ArchRef,
    pub last_status: i32,
    pub last_poll: Option<SystemTime>,
    pub num_polls: u32,
}

/// A monitored workstation.
#[derive(Debug)]
pub struct Machine {
    pub name: String,
    pub cluster: ClusterId,
    state: Mutex<MachineState>,
}

impl Machine {
    pub fn new(name: impl Into<String>, cluster: ClusterId) -> Self {
        Self {
            name: name.into(),
            cluster,
            state: Mutex::new(MachineState::default()),
        }
    }

    /// Snapshot of the runtime state.
    pub fn state(&self) -> MachineState {
        *lock(&self.state)
    }

    /// Mutate the runtime state in place.
    pub fn update<F>(&self, f: F)
    where
        F: FnOnce(&mut MachineState),
    {
        f(&mut lock(&self.state));
    }

    /// Record the outcome of one poll.
    pub fn record_poll(&self, busy: BusyState, arch: ArchRef, status: i32, at: SystemTime) {
        self.update(|state| {
            state.busy = busy;
            state.arch = arch;
            state.last_status = status;
            state.last_poll = Some(at);
            state.num_polls = state.num_polls.saturating_add(1);
        });
    }
}

#[derive(Debug, Default)]
struct PrinterState {
    up: bool,
    jobs: u32,
    connection: Option<PrinterConnection>,
    timer: Option<TimerHandle>,
}

/// A monitored print queue.
#[derive(Debug)]
pub struct Printer {
    pub name: String,
    pub cluster: ClusterId,
    state: Mutex<PrinterState>,
}

impl Printer {
    pub fn new(name: impl Into<String>, cluster: ClusterId) -> Self {
        Self {
            name: name.into(),
            cluster,
            state: Mutex::new(PrinterState::default()),
        }
    }

    pub fn is_up(&self) -> bool {
        lock(&self.state).up
    }

    pub fn jobs(&self) -> u32 {
        lock(&self.state).jobs
    }

    /// Up flag and queued job count, read together.
    pub fn status(&self) -> (bool, u32) {
        let state = lock(&self.state);
        (state.up, state.jobs)
    }

    pub fn set_status(&self, up: bool, jobs: u32) {
        let mut state = lock(&self.state);
        state.up = up;
        state.jobs = jobs;
    }

    /// Install a connection, returning the one it replaces.
    pub fn attach_connection(&self, connection: PrinterConnection) -> Option<PrinterConnection> {
        lock(&self.state).connection.replace(connection)
    }

    pub fn take_connection(&self) -> Option<PrinterConnection> {
        lock(&self.state).connection.take()
    }

    pub fn has_connection(&self) -> bool {
        lock(&self.state).connection.is_some()
    }

    /// Install a pending timer, returning the one it replaces.
    pub fn attach_timer(&self, timer: TimerHandle) -> Option<TimerHandle> {
        lock(&self.state).timer.replace(timer)
    }

    pub fn has_timer(&self) -> bool {
        lock(&self.state).timer.is_some()
    }

    /// Detach the connection and timer. The caller drops them outside the lock.
    pub(crate) fn take_resources(&self) -> (Option<PrinterConnection>, Option<TimerHandle>) {
        let mut state = lock(&self.state);
        (state.connection.take(), state.timer.take())
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// One generation of the topology.
///
/// Structural fields never change once parsing succeeds; only the runtime state of
/// machines and printers is mutated while the generation is active.
#[derive(Debug, Default)]
pub struct Configuration {
    pub(crate) arches: EntityList<Architecture>,
    pub(crate) clusters: EntityList<Cluster>,
    pub(crate) printers: EntityList<Printer>,
    pub(crate) machines: EntityList<Machine>,
    pub(crate) cgroups: EntityList<CGroup>,
    pub(crate) options: GlobalOptions,
}

impl Configuration {
    pub fn arches(&self) -> &[Architecture] {
        &self.arches
    }

    pub fn clusters(&self) -> &[Cluster] {
        &self.clusters
    }

    pub fn printers(&self) -> &[Printer] {
        &self.printers
    }

    /// Workstations in canonical order (by name, then cluster).
    pub fn machines(&self) -> &[Machine] {
        &self.machines
    }

    pub fn cgroups(&self) -> &[CGroup] {
        &self.cgroups
    }

    pub fn options(&self) -> &GlobalOptions {
        &self.options
    }

    pub fn cluster(&self, id: ClusterId) -> Option<&Cluster> {
        self.clusters.get(id.0)
    }

    pub fn cgroup(&self, id: CGroupId) -> Option<&CGroup> {
        self.cgroups.get(id.0)
    }

    pub fn find_cluster(&self, name: &str) -> Option<ClusterId> {
        self.clusters.iter().position(|c| c.name == name).map(ClusterId)
    }

    /// First workstation with the given name.
    pub fn find_machine(&self, name: &str) -> Option<&Machine> {
        let index = self.machines.partition_point(|m| m.name.as_str() < name);
        self.machines.get(index).filter(|m| m.name == name)
    }

    /// First printer with the given name, regardless of cluster.
    pub fn find_printer(&self, name: &str) -> Option<&Printer> {
        self.printers.iter().find(|p| p.name == name)
    }

    /// Registry position of the architecture with the given network name.
    pub fn find_arch(&self, net_name: &str) -> Option<usize> {
        self.arches.iter().position(|a| a.net_name == net_name)
    }

    /// Network name of a registry entry; `None` for the sentinels.
    pub fn arch_net_name(&self, arch: ArchRef) -> Option<&str> {
        match arch {
            ArchRef::Known(index) => self.arches.get(index).map(|a| a.net_name.as_str()),
            ArchRef::Unknown | ArchRef::Other => None,
        }
    }

    /// Name a workstation of this architecture is reported under.
    ///
    /// Sentinels map to the `report-unknown` and `report-other` options.
    pub fn report_name(&self, arch: ArchRef) -> Option<&str> {
        match arch {
            ArchRef::Known(index) => self.arches.get(index).map(|a| a.report_name.as_str()),
            ArchRef::Other => self.options.report_other.as_deref(),
            ArchRef::Unknown => self.options.report_unknown.as_deref(),
        }
    }

    /// Put workstations in canonical order so `find_machine` can binary search.
    pub(crate) fn canonicalize(&mut self) {
        self.machines
            .sort_by(|a, b| a.name.cmp(&b.name).then(a.cluster.cmp(&b.cluster)));
    }
}
