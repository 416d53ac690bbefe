//! Flap Relay
//!
//! A small real-time relay that lets a phone ("controller") drive a game
//! running in a browser ("display") without the two ever talking directly.
//!
//! # Features
//!
//! - **Two bindings, one core**: a WebSocket binding with bare string
//!   commands, and an SSE + JSON polling binding for hosts without sockets
//! - **Role-partitioned registry**: input fans out to displays, state
//!   updates fan out to controllers
//! - **Liveness**: sockets that miss one heartbeat are reaped
//! - **Late joiners**: the last reported game state is cached and served
//!
//! # Modules
//!
//! - `types`: Events, roles, game state and errors
//! - `registry`: Connection registry and the `Transport` capability
//! - `relay`: Relay core, pending event buffer and state cache
//! - `liveness`: Heartbeat task
//! - `api`: Axum router, WebSocket and SSE bindings
//! - `config`: Runtime configuration
//!
//! # Example
//!
//! ```no_run
//! use flap_relay::{create_router, RelayConfig, RelayServer};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = RelayConfig::default();
//!     let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
//!     let relay = RelayServer::start(config);
//!     axum::serve(listener, create_router(relay)).await?;
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod config;
pub mod liveness;
pub mod registry;
pub mod relay;
pub mod types;

// Re-export commonly used items at crate root
pub use api::create_router;
pub use config::RelayConfig;
pub use registry::{CloseReason, ConnectionId, ConnectionRegistry, PeerInfo, Transport};
pub use relay::RelayServer;
pub use types::{Event, EventKind, GameState, RelayError, RelayResult, Role, TransportError};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
