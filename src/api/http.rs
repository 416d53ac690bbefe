//! HTTP server setup with Axum

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::State,
    http::{header, Method},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::sse::{command_handler, subscribe_handler};
use super::websocket::ws_handler;
use crate::relay::RelayServer;

/// Create the Axum router with all endpoints
pub fn create_router(relay: Arc<RelayServer>) -> Router {
    // Browser clients are served from anywhere
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .max_age(Duration::from_secs(86400));

    Router::new()
        // WebSocket endpoint
        .route("/", get(ws_handler))
        .route("/ws", get(ws_handler))
        // Event stream + commands
        .route("/api/connect", get(subscribe_handler).post(command_handler))
        // Health check
        .route("/health", get(health_check))
        .route("/api/stats", get(stats))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(relay)
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}

/// GET /api/stats - Connection counts and relay state
async fn stats(State(relay): State<Arc<RelayServer>>) -> impl IntoResponse {
    Json(relay.stats())
}
