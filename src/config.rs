//! Relay configuration
//!
//! [`RelayConfig`] holds every runtime setting. Only the bind address is
//! exposed on the command line; the rest are fixed protocol constants kept
//! here so tests can shorten them.

use std::net::SocketAddr;
use std::time::Duration;

/// Default listening port
pub const DEFAULT_PORT: u16 = 8080;

/// Default bind host (all interfaces)
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Interval between liveness probes and SSE heartbeats
pub const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(30);

/// Input events kept for polling displays
pub const COMMAND_BUFFER_CAPACITY: usize = 10;

#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// Address the HTTP/WebSocket listener binds to
    pub bind_addr: SocketAddr,

    /// Liveness probe period for sockets and heartbeat period for SSE streams
    pub heartbeat_interval: Duration,

    /// Capacity of the pending event buffer
    pub command_buffer_capacity: usize,
}

impl RelayConfig {
    pub fn new(bind_addr: SocketAddr) -> Self {
        Self {
            bind_addr,
            ..Self::default()
        }
    }
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], DEFAULT_PORT)),
            heartbeat_interval: HEARTBEAT_INTERVAL,
            command_buffer_capacity: COMMAND_BUFFER_CAPACITY,
        }
    }
}
