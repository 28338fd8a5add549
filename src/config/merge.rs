//! Runtime state transplant between configuration generations.
//!
//! # Responsibilities
//! - Copy workstation runtime state onto same-named workstations of the candidate
//! - Translate architecture indices through their network names
//! - Copy printer up/jobs state onto same-named printers of the candidate
//!
//! # Design Decisions
//! - Reads the old generation and writes only runtime fields of the new one
//! - Each entity copies onto the first same-named entity of the candidate
//! - Printer connections and timers are never transplanted; they stay with the
//!   old generation and are released with it

use crate::config::schema::{ArchRef, Configuration};

/// What a transplant pass carried over.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct MergeSummary {
    /// Workstations whose state was copied.
    pub machines: usize,
    /// Printers whose state was copied.
    pub printers: usize,
    /// Workstations whose architecture moved to a different registry position.
    pub arches_remapped: usize,
    /// Workstations whose architecture is no longer in the registry.
    pub arches_retired: usize,
}

/// Map an architecture of `old` onto the registry of `new`.
///
/// Sentinels pass through. A registry entry maps to the entry of `new` with the
/// same network name, or to `ArchRef::Other` if `new` no longer lists it.
pub fn translate_arch(old: &Configuration, new: &Configuration, arch: ArchRef) -> ArchRef {
    match arch {
        ArchRef::Unknown | ArchRef::Other => arch,
        ArchRef::Known(_) => old
            .arch_net_name(arch)
            .and_then(|name| new.find_arch(name))
            .map_or(ArchRef::Other, ArchRef::Known),
    }
}

/// Copy runtime state from `old` into `new`.
pub fn transplant_state(old: &Configuration, new: &Configuration) -> MergeSummary {
    let mut summary = MergeSummary::default();

    for machine in old.machines() {
        let Some(target) = new.find_machine(&machine.name) else {
            continue;
        };
        tracing::debug!(ws = %machine.name, "Copying workstation state");

        let mut state = machine.state();
        let arch = translate_arch(old, new, state.arch);
        match (state.arch, arch) {
            (ArchRef::Known(from), ArchRef::Known(to)) if from != to => summary.arches_remapped += 1,
            (ArchRef::Known(_), ArchRef::Other) => {
                tracing::debug!(
                    ws = %machine.name,
                    arch = old.arch_net_name(state.arch).unwrap_or_default(),
                    "Architecture no longer listed"
                );
                summary.arches_retired += 1;
            }
            _ => {}
        }
        state.arch = arch;

        target.update(|target_state| *target_state = state);
        summary.machines += 1;
    }

    for printer in old.printers() {
        let Some(target) = new.find_printer(&printer.name) else {
            continue;
        };
        tracing::debug!(printer = %printer.name, "Copying printer state");

        let (up, jobs) = printer.status();
        target.set_status(up, jobs);
        summary.printers += 1;
    }

    summary
}
