//! Relay events

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{GameState, Role};

/// Kind-specific payload of an event
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum EventKind {
    /// Controller input
    #[serde(rename = "flap")]
    Input,

    /// Authoritative state reported by a display
    #[serde(rename = "gameState")]
    StateUpdate {
        #[serde(rename = "gameState")]
        state: GameState,
    },

    /// Role declaration; acknowledged back to the origin only
    #[serde(rename = "register")]
    Registration { role: Role },

    /// Liveness heartbeat
    #[serde(rename = "ping")]
    Heartbeat,
}

impl EventKind {
    pub fn name(&self) -> &'static str {
        match self {
            EventKind::Input => "flap",
            EventKind::StateUpdate { .. } => "gameState",
            EventKind::Registration { .. } => "register",
            EventKind::Heartbeat => "ping",
        }
    }
}

/// An immutable relay event
///
/// `id` comes from a process-wide counter and only orders events inside the
/// pending buffer. It is not a logical clock.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    #[serde(flatten)]
    pub kind: EventKind,

    pub id: u64,

    pub timestamp: DateTime<Utc>,
}

impl Event {
    pub fn new(id: u64, kind: EventKind) -> Self {
        Self {
            kind,
            id,
            timestamp: Utc::now(),
        }
    }
}
