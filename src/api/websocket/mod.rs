//! Persistent socket binding
//!
//! Endpoint at `/ws` (and `/` for clients that connect to the bare host).
//! Clients speak bare strings:
//!
//! - `flap`: input, forwarded verbatim to every display
//! - `game-client` / `mobile-client`: register, acknowledged with
//!   `game-connected` / `mobile-connected`
//! - `game-state:<n>`: state update from a display, pushed to controllers
//!
//! Liveness uses WebSocket Ping/Pong frames driven by the relay's monitor.

pub mod events;
pub mod handler;
pub mod transport;

pub use handler::ws_handler;
pub use transport::SocketTransport;
