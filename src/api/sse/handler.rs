//! SSE subscribe handler

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::{ConnectInfo, Query, State},
    http::HeaderMap,
    response::{
        sse::{Event as SseFrame, Sse},
        IntoResponse,
    },
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::time::{interval_at, Instant};

use super::transport::{StreamFrame, StreamTransport};
use super::SseEvent;
use crate::api::peer_info;
use crate::registry::ConnectionId;
use crate::relay::RelayServer;
use crate::types::{EventKind, Role};

/// Query parameters for the subscribe stream
#[derive(Debug, Deserialize)]
pub struct SubscribeParams {
    /// `mobile`/`controller` or `game`/`display`; defaults to controller
    #[serde(rename = "clientType")]
    pub client_type: Option<String>,
}

/// Removes the subscriber when the response stream is dropped
struct SubscriptionGuard {
    relay: Arc<RelayServer>,
    id: ConnectionId,
}

impl Drop for SubscriptionGuard {
    fn drop(&mut self) {
        self.relay.disconnect(self.id);
    }
}

fn frame<T: Serialize>(record: &T) -> SseFrame {
    SseFrame::default().data(serde_json::to_string(record).unwrap_or_default())
}

/// GET /api/connect - SSE stream for server→client events
pub async fn subscribe_handler(
    State(relay): State<Arc<RelayServer>>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    Query(params): Query<SubscribeParams>,
) -> impl IntoResponse {
    let role = params
        .client_type
        .as_deref()
        .and_then(Role::from_client_type)
        .unwrap_or(Role::Controller);

    let (tx, mut rx) = mpsc::unbounded_channel();
    let peer = peer_info(connect_info, &headers);
    let id = relay.connect_from(Some(role), Arc::new(StreamTransport::new(tx)), &peer);

    let connected = SseEvent::Connected {
        message: "Connected to relay server".to_string(),
        connection_id: id.as_u64(),
        game_state: relay.game_state(),
        timestamp: Utc::now(),
    };
    let period = relay.config().heartbeat_interval;
    let guard = SubscriptionGuard { relay, id };

    let stream = async_stream::stream! {
        let guard = guard;

        yield Ok::<_, Infallible>(frame(&connected));

        let mut heartbeat = interval_at(Instant::now() + period, period);
        loop {
            let next = tokio::select! {
                _ = heartbeat.tick() => Some(frame(&guard.relay.next_event(EventKind::Heartbeat))),
                received = rx.recv() => match received {
                    Some(StreamFrame::Event(event)) => Some(frame(&event)),
                    Some(StreamFrame::Close) | None => None,
                },
            };

            match next {
                Some(record) => yield Ok(record),
                None => break,
            }
        }
    };

    Sse::new(stream)
}
