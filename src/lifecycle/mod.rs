//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Read settings → Read initial configuration (fatal on failure) → Start resolver
//!
//! Running (daemon.rs):
//!     Reload trigger → ConfigStore::reload → re-resolve workstations
//!
//! Shutdown (shutdown.rs):
//!     Ctrl+C → broadcast → reload loop exits
//! ```

pub mod daemon;
pub mod shutdown;
pub mod startup;

pub use daemon::Daemon;
pub use shutdown::Shutdown;
