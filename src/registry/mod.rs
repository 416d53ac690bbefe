//! Connection registry
//!
//! Tracks every live connection, partitioned by declared role. The registry
//! is the only owner of connection records and their transport handles;
//! everything else refers to connections by [`ConnectionId`].

mod connection;

pub use connection::{CloseReason, Connection, ConnectionId, PeerInfo, Transport};

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::debug;

use crate::types::{Event, Role, TransportError};

#[derive(Default)]
struct Inner {
    connections: HashMap<ConnectionId, Connection>,
    /// Registration order per role
    controllers: Vec<ConnectionId>,
    displays: Vec<ConnectionId>,
}

impl Inner {
    fn partition_mut(&mut self, role: Role) -> Option<&mut Vec<ConnectionId>> {
        match role {
            Role::Controller => Some(&mut self.controllers),
            Role::Display => Some(&mut self.displays),
            Role::Unspecified => None,
        }
    }

    fn partition(&self, role: Role) -> &[ConnectionId] {
        match role {
            Role::Controller => &self.controllers,
            Role::Display => &self.displays,
            Role::Unspecified => &[],
        }
    }
}

/// Probe-capable connections split by liveness outcome for one heartbeat tick
pub struct ProbeRound {
    /// Connections that never acknowledged the previous probe
    pub expired: Vec<ConnectionId>,
    /// Connections to probe now; their alive flag has been cleared
    pub to_probe: Vec<(ConnectionId, Arc<dyn Transport>)>,
}

/// Registry of live connections
pub struct ConnectionRegistry {
    inner: Mutex<Inner>,
    next_id: AtomicU64,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Store a new connection and return its identity
    pub fn accept(&self, role_hint: Option<Role>, transport: Arc<dyn Transport>) -> ConnectionId {
        let id = ConnectionId(self.next_id.fetch_add(1, Ordering::SeqCst));
        let role = role_hint.unwrap_or_default();

        let mut inner = self.inner.lock();
        inner
            .connections
            .insert(id, Connection::new(id, role, transport));
        if let Some(partition) = inner.partition_mut(role) {
            partition.push(id);
        }
        id
    }

    /// Set the role of a connection. Last write wins.
    ///
    /// Returns false when the connection is already gone.
    pub fn assign_role(&self, id: ConnectionId, role: Role) -> bool {
        let mut inner = self.inner.lock();
        let previous = match inner.connections.get_mut(&id) {
            Some(conn) => std::mem::replace(&mut conn.role, role),
            None => {
                debug!("role assignment for {} ignored, connection is gone", id);
                return false;
            }
        };

        if previous != role {
            if let Some(partition) = inner.partition_mut(previous) {
                partition.retain(|other| *other != id);
            }
            if let Some(partition) = inner.partition_mut(role) {
                partition.push(id);
            }
        }
        true
    }

    /// Remove a connection from the map and its role partition.
    ///
    /// Returns the record the first time; `None` on every later call.
    pub fn remove(&self, id: ConnectionId) -> Option<Connection> {
        let mut inner = self.inner.lock();
        let conn = inner.connections.remove(&id)?;
        if let Some(partition) = inner.partition_mut(conn.role) {
            partition.retain(|other| *other != id);
        }
        Some(conn)
    }

    /// Remove every connection, e.g. at shutdown
    pub fn drain_all(&self) -> Vec<Connection> {
        let mut inner = self.inner.lock();
        inner.controllers.clear();
        inner.displays.clear();
        inner.connections.drain().map(|(_, conn)| conn).collect()
    }

    /// Call `f` for every connection in `role`, in registration order.
    ///
    /// Iterates a snapshot taken under the lock, so `f` may remove
    /// connections (including the one it was handed).
    pub fn for_each_in_role<F>(&self, role: Role, mut f: F)
    where
        F: FnMut(ConnectionId, &dyn Transport),
    {
        let snapshot: Vec<(ConnectionId, Arc<dyn Transport>)> = {
            let inner = self.inner.lock();
            inner
                .partition(role)
                .iter()
                .filter_map(|id| {
                    inner
                        .connections
                        .get(id)
                        .map(|conn| (*id, Arc::clone(&conn.transport)))
                })
                .collect()
        };

        for (id, transport) in snapshot {
            f(id, transport.as_ref());
        }
    }

    /// Push an event to a single connection
    pub fn send_to(&self, id: ConnectionId, event: &Event) -> Result<(), TransportError> {
        let transport = self
            .inner
            .lock()
            .connections
            .get(&id)
            .map(|conn| Arc::clone(&conn.transport))
            .ok_or(TransportError::Closed)?;
        transport.push(event)
    }

    /// Record a probe acknowledgment
    pub fn mark_alive(&self, id: ConnectionId) {
        if let Some(conn) = self.inner.lock().connections.get_mut(&id) {
            conn.alive = true;
        }
    }

    /// Split probe-capable connections into expired and to-probe sets
    pub fn begin_probe_round(&self) -> ProbeRound {
        let mut round = ProbeRound {
            expired: Vec::new(),
            to_probe: Vec::new(),
        };

        let mut inner = self.inner.lock();
        for conn in inner.connections.values_mut() {
            if !conn.transport.supports_probe() {
                continue;
            }
            if conn.alive {
                conn.alive = false;
                round.to_probe.push((conn.id, Arc::clone(&conn.transport)));
            } else {
                round.expired.push(conn.id);
            }
        }
        round
    }

    pub fn contains(&self, id: ConnectionId) -> bool {
        self.inner.lock().connections.contains_key(&id)
    }

    pub fn role_of(&self, id: ConnectionId) -> Option<Role> {
        self.inner.lock().connections.get(&id).map(|conn| conn.role)
    }

    pub fn is_alive(&self, id: ConnectionId) -> Option<bool> {
        self.inner.lock().connections.get(&id).map(|conn| conn.alive)
    }

    /// Ids in a role partition, in registration order
    pub fn ids_in_role(&self, role: Role) -> Vec<ConnectionId> {
        self.inner.lock().partition(role).to_vec()
    }

    pub fn role_count(&self, role: Role) -> usize {
        let inner = self.inner.lock();
        match role {
            Role::Unspecified => inner
                .connections
                .values()
                .filter(|conn| conn.role == Role::Unspecified)
                .count(),
            other => inner.partition(other).len(),
        }
    }

    pub fn len(&self) -> usize {
        self.inner.lock().connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for ConnectionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
