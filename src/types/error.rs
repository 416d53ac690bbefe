//! Error types

use thiserror::Error;

use super::GameState;

/// Failures surfaced to the client that originated a command
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RelayError {
    /// The command or event type is not part of the protocol
    #[error("unknown message type: {0}")]
    UnknownCommand(String),

    /// A state update carried a value outside the game state enumeration
    #[error("invalid game state {0} (expected 0..={})", GameState::MAX)]
    InvalidGameState(i64),

    /// A state update carried something other than an integer
    #[error("game state must be an integer, got {0}")]
    MalformedGameState(String),

    /// A state update arrived without a value
    #[error("missing game state")]
    MissingGameState,
}

/// Failure to write to a single destination
///
/// Always handled locally by tearing down that destination.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum TransportError {
    #[error("transport closed")]
    Closed,
}
