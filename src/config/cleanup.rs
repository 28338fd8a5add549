//! Release of the external resources owned by a configuration generation.
//!
//! # Responsibilities
//! - Own the printer connection and printer timer through RAII handles
//! - Close every connection and cancel every timer of a discarded generation
//!
//! # Design Decisions
//! - Memory is released by ownership; only sockets and timers need explicit release
//! - `Drop for Configuration` releases on every discard path, so a rejected reload
//!   candidate cannot leak a handle
//! - A superseded generation is released eagerly at swap time, even while readers
//!   still hold its `Arc`; releasing twice is a no-op

use std::net::SocketAddr;
use tokio::net::TcpStream;
use tokio::task::{AbortHandle, JoinHandle};

use crate::config::schema::Configuration;

/// An open connection to a printer's queue daemon. Closed on drop.
#[derive(Debug)]
pub struct PrinterConnection {
    stream: TcpStream,
}

impl PrinterConnection {
    pub fn new(stream: TcpStream) -> Self {
        Self { stream }
    }

    /// Address of the remote end, if the socket is still connected.
    pub fn peer_addr(&self) -> Option<SocketAddr> {
        self.stream.peer_addr().ok()
    }

    /// Mutable access to the underlying stream for the polling code.
    pub fn stream_mut(&mut self) -> &mut TcpStream {
        &mut self.stream
    }
}

/// A pending timer registration. The timer task is aborted on drop.
#[derive(Debug)]
pub struct TimerHandle {
    abort: AbortHandle,
}

impl TimerHandle {
    pub fn new(abort: AbortHandle) -> Self {
        Self { abort }
    }

    /// Track the task behind a `JoinHandle` as a timer.
    pub fn from_task<T>(task: &JoinHandle<T>) -> Self {
        Self::new(task.abort_handle())
    }

    /// Returns true once the timer task has run to completion or was aborted.
    pub fn is_finished(&self) -> bool {
        self.abort.is_finished()
    }
}

impl Drop for TimerHandle {
    fn drop(&mut self) {
        self.abort.abort();
    }
}

/// Counts of the resources a release pass closed.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReleasedResources {
    pub connections: usize,
    pub timers: usize,
}

impl ReleasedResources {
    pub fn is_empty(&self) -> bool {
        self.connections == 0 && self.timers == 0
    }
}

impl Configuration {
    /// Close every printer connection and cancel every printer timer of this generation.
    pub fn release_resources(&self) -> ReleasedResources {
        let mut released = ReleasedResources::default();
        for printer in self.printers() {
            let (connection, timer) = printer.take_resources();
            if let Some(connection) = connection {
                tracing::debug!(printer = %printer.name, peer = ?connection.peer_addr(), "Closing printer connection");
                released.connections += 1;
            }
            if timer.is_some() {
                released.timers += 1;
            }
        }
        released
    }
}

impl Drop for Configuration {
    fn drop(&mut self) {
        let released = self.release_resources();
        if !released.is_empty() {
            tracing::debug!(
                connections = released.connections,
                timers = released.timers,
                "Released resources of dropped configuration"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::parser::parse_config;
    use std::time::Duration;
    use tokio::io::AsyncReadExt;
    use tokio::net::TcpListener;

    const TOPOLOGY: &str = "-\ncluster w20 x3-1234\nprinter ajax\nprinter helios\n";

    #[tokio::test]
    async fn test_release_closes_connection_and_cancels_timer() {
        let config = parse_config(TOPOLOGY.as_bytes()).unwrap();

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let client = TcpStream::connect(addr).await.unwrap();
        let (mut server_side, _) = listener.accept().await.unwrap();

        let timer_task = tokio::spawn(async {
            tokio::time::sleep(Duration::from_secs(3600)).await;
        });

        let ajax = config.find_printer("ajax").unwrap();
        assert!(ajax.attach_connection(PrinterConnection::new(client)).is_none());
        assert!(ajax.attach_timer(TimerHandle::from_task(&timer_task)).is_none());

        let released = config.release_resources();
        assert_eq!(released, ReleasedResources { connections: 1, timers: 1 });
        assert!(!ajax.has_connection());
        assert!(!ajax.has_timer());

        // Peer sees EOF once the connection is closed.
        let mut buf = [0u8; 8];
        let n = server_side.read(&mut buf).await.unwrap();
        assert_eq!(n, 0);

        let err = timer_task.await.unwrap_err();
        assert!(err.is_cancelled());
    }

    #[tokio::test]
    async fn test_release_twice_is_noop() {
        let config = parse_config(TOPOLOGY.as_bytes()).unwrap();
        let timer_task = tokio::spawn(async {
            tokio::time::sleep(Duration::from_secs(3600)).await;
        });
        config
            .find_printer("helios")
            .unwrap()
            .attach_timer(TimerHandle::from_task(&timer_task));

        assert_eq!(config.release_resources().timers, 1);
        assert!(config.release_resources().is_empty());
    }

    #[tokio::test]
    async fn test_drop_cancels_timer() {
        let config = parse_config(TOPOLOGY.as_bytes()).unwrap();
        let timer_task = tokio::spawn(async {
            tokio::time::sleep(Duration::from_secs(3600)).await;
        });
        config
            .find_printer("ajax")
            .unwrap()
            .attach_timer(TimerHandle::from_task(&timer_task));

        drop(config);
        assert!(timer_task.await.unwrap_err().is_cancelled());
    }
}
