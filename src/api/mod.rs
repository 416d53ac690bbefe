//! API module for HTTP, WebSocket and SSE endpoints
//!
//! Both transport bindings drive the same [`crate::relay::RelayServer`].

pub mod http;
pub mod sse;
pub mod websocket;

use std::net::SocketAddr;

use axum::extract::ConnectInfo;
use axum::http::{header, HeaderMap};

use crate::registry::PeerInfo;

pub use http::create_router;

/// Peer address (when the server was built with connect info) and User-Agent
pub(crate) fn peer_info(
    connect_info: Option<ConnectInfo<SocketAddr>>,
    headers: &HeaderMap,
) -> PeerInfo {
    let user_agent = headers
        .get(header::USER_AGENT)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);
    PeerInfo::new(connect_info.map(|ConnectInfo(addr)| addr), user_agent)
}
