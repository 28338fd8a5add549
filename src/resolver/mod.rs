//! Asynchronous hostname resolution.
//!
//! # Data Flow
//! ```text
//! Active configuration
//!     → channel.rs lookup() per workstation name
//!     → Resolution { host, generation, addrs } on an mpsc channel
//!     → consumer drops results whose generation is stale
//!
//! On reload:
//!     ConfigStore::reload → ResolutionChannel::reset
//!     → every outstanding lookup aborted, generation bumped
//!     → new configuration published
//! ```
//!
//! # Design Decisions
//! - No per-query cancellation: a reset abandons everything in flight
//! - Reset runs synchronously inside the reload, before the swap
//! - A failed reset is fatal to the daemon

pub mod channel;

pub use channel::{HostResolver, Resolution, ResolutionChannel, ResolverError};
