//! Connection records and the transport capability they own

use std::fmt;
use std::net::SocketAddr;
use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::types::{Event, Role, TransportError};

/// Opaque per-process connection identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(pub(crate) u64);

impl ConnectionId {
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Why the relay is closing a transport
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    /// Normal teardown: the peer left or delivery failed
    Disconnected,
    /// Missed a liveness probe
    Inactive,
    /// The relay is stopping
    ShuttingDown,
}

impl CloseReason {
    /// Text carried in the close frame
    pub fn as_str(self) -> &'static str {
        match self {
            CloseReason::Disconnected => "Server closed connection",
            CloseReason::Inactive => "Heartbeat timeout",
            CloseReason::ShuttingDown => "Server shutting down",
        }
    }
}

impl fmt::Display for CloseReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a connection came from, for logging
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PeerInfo {
    pub addr: Option<SocketAddr>,
    pub user_agent: Option<String>,
}

impl PeerInfo {
    pub fn new(addr: Option<SocketAddr>, user_agent: Option<String>) -> Self {
        Self { addr, user_agent }
    }
}

impl fmt::Display for PeerInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.addr {
            Some(addr) => write!(f, "{}", addr)?,
            None => f.write_str("unknown peer")?,
        }
        if let Some(agent) = &self.user_agent {
            write!(f, " ({})", agent)?;
        }
        Ok(())
    }
}

/// What a transport binding must provide to the relay core.
///
/// Implementations must not block: `push` hands the event to the
/// connection's own task and returns.
pub trait Transport: Send + Sync {
    /// Deliver an event to the remote end.
    fn push(&self, event: &Event) -> Result<(), TransportError>;

    /// Whether this transport answers liveness probes.
    fn supports_probe(&self) -> bool {
        false
    }

    /// Send a liveness probe. Only called when `supports_probe` is true.
    fn probe(&self) -> Result<(), TransportError> {
        Ok(())
    }

    /// Force the transport closed. Safe to call more than once.
    fn close(&self, reason: CloseReason);
}

/// A live connection, exclusively owned by the registry
pub struct Connection {
    pub id: ConnectionId,
    pub role: Role,
    pub alive: bool,
    pub connected_at: DateTime<Utc>,
    pub(crate) transport: Arc<dyn Transport>,
}

impl Connection {
    pub(crate) fn new(id: ConnectionId, role: Role, transport: Arc<dyn Transport>) -> Self {
        Self {
            id,
            role,
            alive: true,
            connected_at: Utc::now(),
            transport,
        }
    }

    /// Close the underlying transport
    pub fn close(&self, reason: CloseReason) {
        self.transport.close(reason);
    }
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("id", &self.id)
            .field("role", &self.role)
            .field("alive", &self.alive)
            .field("connected_at", &self.connected_at)
            .finish_non_exhaustive()
    }
}
