//! Liveness monitor
//!
//! A single periodic task that reclaims socket connections whose peer
//! vanished without closing. Each tick, a connection that has not
//! acknowledged the previous probe is removed and force-closed; every other
//! probe-capable connection is probed again. One missed acknowledgment is
//! fatal. Transports that cannot be probed (SSE streams) are exempt.

use std::sync::Weak;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info};

use crate::registry::{ConnectionId, ConnectionRegistry};
use crate::relay::RelayServer;

/// Handle to the running heartbeat task. Dropping it cancels the task.
pub struct LivenessMonitor {
    handle: JoinHandle<()>,
}

impl LivenessMonitor {
    /// Spawn the heartbeat task. Must be called inside a Tokio runtime.
    ///
    /// The task holds the relay weakly and exits once it is gone.
    pub fn spawn(relay: Weak<RelayServer>, period: Duration) -> Self {
        let handle = tokio::spawn(async move {
            // First tick one full period after start: new connections are
            // assumed alive until then.
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;
                let Some(relay) = relay.upgrade() else {
                    break;
                };
                let removed = relay.check_liveness();
                if !removed.is_empty() {
                    info!(
                        "Terminated {} inactive connection(s), {} remaining",
                        removed.len(),
                        relay.registry().len()
                    );
                }
            }
        });

        Self { handle }
    }

    /// Stop the heartbeat task
    pub fn stop(self) {
        // Drop aborts the task.
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for LivenessMonitor {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Run one heartbeat tick; returns the connections it tore down.
///
/// `teardown` removes and closes a connection, returning false if it was
/// already gone.
pub fn run_tick<F>(registry: &ConnectionRegistry, mut teardown: F) -> Vec<ConnectionId>
where
    F: FnMut(ConnectionId) -> bool,
{
    let round = registry.begin_probe_round();
    let mut removed = Vec::new();

    for id in round.expired {
        info!("Terminating inactive connection {}", id);
        if teardown(id) {
            removed.push(id);
        }
    }

    for (id, transport) in round.to_probe {
        if transport.probe().is_err() {
            debug!("Probe to {} failed, dropping connection", id);
            if teardown(id) {
                removed.push(id);
            }
        }
    }

    removed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RelayConfig;
    use crate::registry::test_support::RecordingTransport;
    use crate::registry::CloseReason;
    use crate::types::Role;
    use std::sync::atomic::Ordering;
    use std::sync::Arc;

    fn tick(registry: &ConnectionRegistry) -> Vec<ConnectionId> {
        run_tick(registry, |id| match registry.remove(id) {
            Some(conn) => {
                conn.close(CloseReason::Inactive);
                true
            }
            None => false,
        })
    }

    fn relay_with_heartbeat(period: Duration) -> Arc<RelayServer> {
        Arc::new(RelayServer::new(RelayConfig {
            heartbeat_interval: period,
            ..RelayConfig::default()
        }))
    }

    #[test]
    fn test_first_tick_probes_without_removing() {
        let registry = ConnectionRegistry::new();
        let transport = RecordingTransport::probing();
        let id = registry.accept(Some(Role::Display), transport.clone());

        assert!(tick(&registry).is_empty());
        assert!(registry.contains(id));
        assert_eq!(transport.probes.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_missed_ack_removes_and_closes() {
        let registry = ConnectionRegistry::new();
        let transport = RecordingTransport::probing();
        let id = registry.accept(Some(Role::Display), transport.clone());

        tick(&registry);
        let removed = tick(&registry);

        assert_eq!(removed, vec![id]);
        assert!(!registry.contains(id));
        assert!(registry.ids_in_role(Role::Display).is_empty());
        assert!(transport.is_closed());
    }

    #[test]
    fn test_acknowledged_probe_keeps_connection() {
        let registry = ConnectionRegistry::new();
        let id = registry.accept(Some(Role::Controller), RecordingTransport::probing());

        for _ in 0..5 {
            tick(&registry);
            registry.mark_alive(id);
        }

        assert!(registry.contains(id));
    }

    #[test]
    fn test_polling_transport_is_exempt() {
        let registry = ConnectionRegistry::new();
        let id = registry.accept(Some(Role::Controller), RecordingTransport::polling());

        tick(&registry);
        tick(&registry);
        tick(&registry);

        assert!(registry.contains(id));
    }

    #[test]
    fn test_already_removed_connection_is_skipped() {
        let registry = ConnectionRegistry::new();
        let id = registry.accept(None, RecordingTransport::probing());

        tick(&registry);
        registry.remove(id);

        assert!(tick(&registry).is_empty());
    }

    #[test]
    fn test_relay_teardown_uses_inactive_reason() {
        let relay = relay_with_heartbeat(Duration::from_secs(30));
        let transport = RecordingTransport::probing();
        let id = relay.connect(Some(Role::Display), transport.clone());

        assert!(relay.check_liveness().is_empty());
        assert_eq!(relay.check_liveness(), vec![id]);

        assert!(!relay.registry().contains(id));
        assert_eq!(*transport.close_reason.lock(), Some(CloseReason::Inactive));
    }

    #[tokio::test(start_paused = true)]
    async fn test_spawned_monitor_reaps_silent_connection() {
        let relay = relay_with_heartbeat(Duration::from_secs(30));
        let transport = RecordingTransport::probing();
        let id = relay.connect(Some(Role::Display), transport.clone());

        let monitor = LivenessMonitor::spawn(Arc::downgrade(&relay), Duration::from_secs(30));

        tokio::time::sleep(Duration::from_secs(31)).await;
        assert!(relay.registry().contains(id));
        assert_eq!(transport.probes.load(Ordering::SeqCst), 1);

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert!(!relay.registry().contains(id));
        assert!(transport.is_closed());

        monitor.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_monitor_stops_ticking() {
        let relay = relay_with_heartbeat(Duration::from_secs(30));
        let id = relay.connect(Some(Role::Display), RecordingTransport::probing());

        let monitor = LivenessMonitor::spawn(Arc::downgrade(&relay), Duration::from_secs(30));
        drop(monitor);

        tokio::time::sleep(Duration::from_secs(120)).await;
        assert!(relay.registry().contains(id));
    }

    #[tokio::test(start_paused = true)]
    async fn test_monitor_exits_when_relay_is_dropped() {
        let relay = relay_with_heartbeat(Duration::from_secs(30));
        let monitor = LivenessMonitor::spawn(Arc::downgrade(&relay), Duration::from_secs(30));
        drop(relay);

        tokio::time::sleep(Duration::from_secs(31)).await;
        assert!(monitor.is_finished());
    }
}
