//! larvnetd configuration core.
//!
//! Reads the cluster/printer/workstation topology of the monitoring daemon and
//! replaces it at runtime without losing live polling state.

pub mod config;
pub mod lifecycle;
pub mod observability;
pub mod resolver;

pub use config::{ConfigStore, Configuration};
pub use lifecycle::{Daemon, Shutdown};
