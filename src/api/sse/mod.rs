//! Event-stream + polling binding
//!
//! For hosts that cannot keep a WebSocket open.
//!
//! ## Endpoints
//! - `GET /api/connect` - SSE stream: `connected`, then `ping` every
//!   heartbeat interval, then state updates as they happen
//! - `POST /api/connect` - JSON commands (`flap`, `register`, `getCommands`,
//!   `getGameState`, `updateGameState`)

pub mod command;
pub mod handler;
pub mod transport;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::types::GameState;

pub use command::command_handler;
pub use handler::subscribe_handler;
pub use transport::StreamTransport;

/// Records generated by the stream itself rather than the relay.
///
/// Heartbeats are relay events of kind `ping`.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum SseEvent {
    /// Sent once when the stream opens
    Connected {
        message: String,
        #[serde(rename = "connectionId")]
        connection_id: u64,
        #[serde(rename = "gameState")]
        game_state: GameState,
        timestamp: DateTime<Utc>,
    },
}
