//! Integration tests for the relay core

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use flap_relay::{
    CloseReason, Event, EventKind, GameState, RelayConfig, RelayServer, Role, Transport,
    TransportError,
};

/// Transport that records what it was sent
#[derive(Default)]
struct TestTransport {
    received: Mutex<Vec<Event>>,
    probes: AtomicUsize,
    closed: AtomicBool,
    close_reason: Mutex<Option<CloseReason>>,
    probe_capable: bool,
}

impl TestTransport {
    fn socket() -> Arc<Self> {
        Arc::new(Self {
            probe_capable: true,
            ..Self::default()
        })
    }

    fn stream() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn inputs(&self) -> usize {
        self.received
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.kind == EventKind::Input)
            .count()
    }

    fn states(&self) -> Vec<GameState> {
        self.received
            .lock()
            .unwrap()
            .iter()
            .filter_map(|e| match e.kind {
                EventKind::StateUpdate { state } => Some(state),
                _ => None,
            })
            .collect()
    }
}

impl Transport for TestTransport {
    fn push(&self, event: &Event) -> Result<(), TransportError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(TransportError::Closed);
        }
        self.received.lock().unwrap().push(event.clone());
        Ok(())
    }

    fn supports_probe(&self) -> bool {
        self.probe_capable
    }

    fn probe(&self) -> Result<(), TransportError> {
        self.probes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn close(&self, reason: CloseReason) {
        self.closed.store(true, Ordering::SeqCst);
        self.close_reason.lock().unwrap().get_or_insert(reason);
    }
}

fn setup_relay(capacity: usize) -> RelayServer {
    RelayServer::new(RelayConfig {
        command_buffer_capacity: capacity,
        ..RelayConfig::default()
    })
}

#[test]
fn test_buffer_keeps_last_capacity_events() {
    for (pushes, capacity) in [(11, 10), (3, 2), (50, 7)] {
        let relay = setup_relay(capacity);
        let pushed: Vec<u64> = (0..pushes).map(|_| relay.buffer_input().id).collect();

        let drained: Vec<u64> = relay.drain_commands().iter().map(|e| e.id).collect();

        assert_eq!(drained, pushed[pushes - capacity..].to_vec());
        assert!(relay.drain_commands().is_empty());
    }
}

#[test]
fn test_state_query_default_then_latest() {
    let relay = setup_relay(10);
    assert_eq!(relay.game_state(), GameState::Idle);

    relay.update_state(GameState::Active);
    assert_eq!(relay.game_state(), GameState::Active);
    assert_eq!(relay.game_state(), GameState::Active);

    relay.update_state(GameState::Ended);
    assert_eq!(relay.game_state(), GameState::Ended);
}

#[test]
fn test_broadcast_respects_roles() {
    let relay = setup_relay(10);
    let display = TestTransport::socket();
    let controller = TestTransport::socket();
    let d = relay.connect(None, display.clone());
    let c = relay.connect(None, controller.clone());
    relay.register(d, Role::Display);
    relay.register(c, Role::Controller);

    relay.push_input(Some(c));
    relay.update_state(GameState::Active);

    assert_eq!(display.inputs(), 1);
    assert!(display.states().is_empty());
    assert_eq!(controller.inputs(), 0);
    assert_eq!(controller.states(), vec![GameState::Active]);
}

#[test]
fn test_flap_reaches_two_displays_once_in_partition_order() {
    let relay = setup_relay(10);
    let order = Arc::new(Mutex::new(Vec::new()));

    struct OrderedTransport {
        name: &'static str,
        order: Arc<Mutex<Vec<&'static str>>>,
    }

    impl Transport for OrderedTransport {
        fn push(&self, event: &Event) -> Result<(), TransportError> {
            if event.kind == EventKind::Input {
                self.order.lock().unwrap().push(self.name);
            }
            Ok(())
        }

        fn close(&self, _reason: CloseReason) {}
    }

    for name in ["first", "second"] {
        let id = relay.connect(
            None,
            Arc::new(OrderedTransport {
                name,
                order: Arc::clone(&order),
            }),
        );
        relay.register(id, Role::Display);
    }

    assert_eq!(relay.push_input(None), 2);
    assert_eq!(*order.lock().unwrap(), vec!["first", "second"]);
}

#[test]
fn test_missed_heartbeat_removes_connection() {
    let relay = setup_relay(10);
    let silent = TestTransport::socket();
    let responsive = TestTransport::socket();
    let silent_id = relay.connect(Some(Role::Display), silent.clone());
    let responsive_id = relay.connect(Some(Role::Display), responsive.clone());

    relay.check_liveness();
    relay.registry().mark_alive(responsive_id);
    let removed = relay.check_liveness();

    assert_eq!(removed, vec![silent_id]);
    assert!(silent.closed.load(Ordering::SeqCst));
    assert_eq!(
        *silent.close_reason.lock().unwrap(),
        Some(CloseReason::Inactive)
    );
    assert_eq!(relay.push_input(None), 1);
    assert_eq!(silent.inputs(), 0);
    assert_eq!(responsive.inputs(), 1);
}

#[test]
fn test_stream_subscribers_are_exempt_from_liveness() {
    let relay = setup_relay(10);
    let stream = TestTransport::stream();
    let id = relay.connect(Some(Role::Controller), stream.clone());

    for _ in 0..3 {
        relay.check_liveness();
    }

    assert!(relay.registry().contains(id));
    assert_eq!(stream.probes.load(Ordering::SeqCst), 0);
}

#[test]
fn test_double_removal_is_noop() {
    let relay = setup_relay(10);
    let transport = TestTransport::socket();
    let id = relay.connect(Some(Role::Display), transport);

    assert!(relay.disconnect(id));
    assert!(!relay.disconnect(id));

    // A liveness tick after an explicit close is also harmless
    assert!(relay.check_liveness().is_empty());
    assert!(!relay.register(id, Role::Controller));
}

#[test]
fn test_shutdown_closes_with_shutdown_reason() {
    let relay = setup_relay(10);
    let socket = TestTransport::socket();
    let stream = TestTransport::stream();
    relay.connect(Some(Role::Display), socket.clone());
    relay.connect(Some(Role::Controller), stream.clone());

    relay.shutdown();

    assert!(relay.registry().is_empty());
    for transport in [&socket, &stream] {
        assert_eq!(
            *transport.close_reason.lock().unwrap(),
            Some(CloseReason::ShuttingDown)
        );
    }
}

#[test]
fn test_concurrent_inputs_all_delivered() {
    let relay = Arc::new(setup_relay(10));
    let display = TestTransport::socket();
    relay.connect(Some(Role::Display), display.clone());

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let relay = Arc::clone(&relay);
            std::thread::spawn(move || {
                for _ in 0..25 {
                    relay.push_input(None);
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(display.inputs(), 200);
}
