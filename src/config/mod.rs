//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! topology file
//!     → lines.rs (comment stripping, trimming)
//!     → arch.rs (architecture registry block)
//!     → parser.rs (clusters, printers, workstations, cgroups, options)
//!         → range.rs (host[1-5] expansion)
//!     → Configuration (one immutable generation)
//!     → store.rs (published via ArcSwap)
//!
//! On reload trigger (watcher.rs):
//!     → parser.rs builds a candidate
//!     → merge.rs copies runtime state old → candidate
//!     → resolver channel reset
//!     → atomic swap in store.rs
//!     → cleanup.rs releases the superseded generation
//! ```
//!
//! # Design Decisions
//! - A generation is never mutated structurally; changes require a full reload
//! - Cross references are indices into the owning generation
//! - A failed parse leaves the active generation untouched

pub mod arch;
pub mod cleanup;
pub mod collection;
pub mod error;
pub mod lines;
pub mod loader;
pub mod merge;
pub mod parser;
pub mod range;
pub mod schema;
pub mod settings;
pub mod store;
pub mod watcher;

pub use error::{ConfigError, ParseErrorKind};
pub use schema::{
    ArchRef, Architecture, BusyState, CGroup, CGroupId, Cluster, ClusterId, Configuration,
    GlobalOptions, Machine, MachineState, Printer,
};
pub use settings::DaemonSettings;
pub use store::{ConfigStore, ReloadError, ReloadSummary};
