//! Message relay
//!
//! [`RelayServer`] owns the registry, the pending event buffer, the state
//! cache and the liveness monitor. Both transport bindings drive it through
//! the same operations:
//!
//! - input from a controller is pushed to displays ([`RelayServer::push_input`])
//!   or buffered for polling displays ([`RelayServer::buffer_input`]);
//! - state updates from a display are cached and fanned out to controllers
//!   ([`RelayServer::update_state`]);
//! - registration only touches the registry ([`RelayServer::register`]).

mod buffer;
mod state;

pub use buffer::PendingEventBuffer;
pub use state::StateCache;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::RelayConfig;
use crate::liveness::{run_tick, LivenessMonitor};
use crate::registry::{CloseReason, ConnectionId, ConnectionRegistry, PeerInfo, Transport};
use crate::types::{Event, EventKind, GameState, Role};

/// Snapshot of relay counters
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RelayStats {
    pub connections: usize,
    pub controllers: usize,
    pub displays: usize,
    pub unregistered: usize,
    pub pending_events: usize,
    pub game_state: GameState,
}

/// The relay core shared by every transport binding
pub struct RelayServer {
    config: RelayConfig,
    registry: Arc<ConnectionRegistry>,
    pending: PendingEventBuffer,
    state: StateCache,
    sequence_counter: AtomicU64,
    monitor: Mutex<Option<LivenessMonitor>>,
}

impl RelayServer {
    /// Build a relay without starting the liveness monitor
    pub fn new(config: RelayConfig) -> Self {
        Self {
            pending: PendingEventBuffer::new(config.command_buffer_capacity),
            registry: Arc::new(ConnectionRegistry::new()),
            state: StateCache::new(),
            sequence_counter: AtomicU64::new(0),
            monitor: Mutex::new(None),
            config,
        }
    }

    /// Build a relay and spawn its liveness monitor.
    ///
    /// Must be called inside a Tokio runtime.
    pub fn start(config: RelayConfig) -> Arc<Self> {
        let relay = Arc::new(Self::new(config));
        let monitor =
            LivenessMonitor::spawn(Arc::downgrade(&relay), relay.config.heartbeat_interval);
        *relay.monitor.lock() = Some(monitor);
        relay
    }

    pub fn config(&self) -> &RelayConfig {
        &self.config
    }

    pub fn registry(&self) -> &ConnectionRegistry {
        &self.registry
    }

    /// Create an event with the next sequence id
    pub fn next_event(&self, kind: EventKind) -> Event {
        let id = self.sequence_counter.fetch_add(1, Ordering::SeqCst);
        Event::new(id, kind)
    }

    /// Accept a new connection
    pub fn connect(&self, role_hint: Option<Role>, transport: Arc<dyn Transport>) -> ConnectionId {
        self.connect_from(role_hint, transport, &PeerInfo::default())
    }

    /// Accept a new connection, logging where it came from
    pub fn connect_from(
        &self,
        role_hint: Option<Role>,
        transport: Arc<dyn Transport>,
        peer: &PeerInfo,
    ) -> ConnectionId {
        let id = self.registry.accept(role_hint, transport);
        info!(
            "Client {} connected from {} as {} (total connections: {})",
            id,
            peer,
            role_hint.unwrap_or_default(),
            self.registry.len()
        );
        id
    }

    /// Tear down a connection. Idempotent; returns true only the first time.
    pub fn disconnect(&self, id: ConnectionId) -> bool {
        self.teardown(id, CloseReason::Disconnected)
    }

    /// Remove and close a connection with the given reason
    fn teardown(&self, id: ConnectionId, reason: CloseReason) -> bool {
        match self.registry.remove(id) {
            Some(conn) => {
                conn.close(reason);
                info!(
                    "Client {} ({}) disconnected: {}. Remaining - controllers: {}, displays: {}",
                    id,
                    conn.role,
                    reason,
                    self.registry.role_count(Role::Controller),
                    self.registry.role_count(Role::Display)
                );
                true
            }
            None => false,
        }
    }

    /// Run one liveness round over the socket connections.
    ///
    /// Returns the connections torn down for missing the previous probe.
    pub fn check_liveness(&self) -> Vec<ConnectionId> {
        run_tick(&self.registry, |id| self.teardown(id, CloseReason::Inactive))
    }

    /// Assign a role and acknowledge it to the connection.
    ///
    /// Returns false when the connection is already gone.
    pub fn register(&self, id: ConnectionId, role: Role) -> bool {
        if !self.registry.assign_role(id, role) {
            return false;
        }
        info!(
            "Client {} registered as {} (total {}s: {})",
            id,
            role,
            role,
            self.registry.role_count(role)
        );

        let ack = self.next_event(EventKind::Registration { role });
        if let Err(e) = self.registry.send_to(id, &ack) {
            warn!("Failed to acknowledge registration of {}: {}", id, e);
            self.disconnect(id);
        }
        true
    }

    /// Deliver an input event to every display right now.
    ///
    /// Returns the number of displays that received it.
    pub fn push_input(&self, origin: Option<ConnectionId>) -> usize {
        let event = self.next_event(EventKind::Input);
        let delivered = self.broadcast(Role::Display, &event);
        match origin {
            Some(id) => info!("Flap from {} forwarded to {} display(s)", id, delivered),
            None => info!("Flap forwarded to {} display(s)", delivered),
        }
        delivered
    }

    /// Queue an input event for the next display poll
    pub fn buffer_input(&self) -> Event {
        let event = self.next_event(EventKind::Input);
        let evicted = self.pending.push(event.clone());
        if evicted > 0 {
            debug!("Pending buffer full, evicted {} oldest event(s)", evicted);
        }
        info!(
            "Flap {} queued ({} pending)",
            event.id,
            self.pending.len()
        );
        event
    }

    /// Take every queued input event
    pub fn drain_commands(&self) -> Vec<Event> {
        let commands = self.pending.drain();
        debug!("Display poll returned {} command(s)", commands.len());
        commands
    }

    /// Cache a new authoritative state and push it to every controller.
    ///
    /// Returns the number of controllers notified.
    pub fn update_state(&self, state: GameState) -> usize {
        let previous = self.state.set(state);
        let event = self.next_event(EventKind::StateUpdate { state });
        let notified = self.broadcast(Role::Controller, &event);
        info!(
            "Game state {} -> {}, pushed to {} controller(s)",
            previous, state, notified
        );
        notified
    }

    pub fn game_state(&self) -> GameState {
        self.state.get()
    }

    /// Push `event` to every connection in `role`.
    ///
    /// A failed destination is torn down; delivery to the rest continues.
    pub fn broadcast(&self, role: Role, event: &Event) -> usize {
        let mut delivered = 0;
        self.registry.for_each_in_role(role, |id, transport| {
            match transport.push(event) {
                Ok(()) => delivered += 1,
                Err(e) => {
                    warn!("Delivery of {} to {} failed: {}", event.kind.name(), id, e);
                    self.disconnect(id);
                }
            }
        });
        delivered
    }

    pub fn stats(&self) -> RelayStats {
        RelayStats {
            connections: self.registry.len(),
            controllers: self.registry.role_count(Role::Controller),
            displays: self.registry.role_count(Role::Display),
            unregistered: self.registry.role_count(Role::Unspecified),
            pending_events: self.pending.len(),
            game_state: self.state.get(),
        }
    }

    /// Stop the liveness monitor and close every connection
    pub fn shutdown(&self) {
        if let Some(monitor) = self.monitor.lock().take() {
            monitor.stop();
        }
        let connections = self.registry.drain_all();
        info!("Closing {} connection(s)", connections.len());
        for conn in connections {
            conn.close(CloseReason::ShuttingDown);
        }
    }
}
