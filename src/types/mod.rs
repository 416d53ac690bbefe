//! Data types for the relay
//!
//! This module contains the core data structures shared by the registry,
//! the relay and both transport bindings.

mod error;
mod event;
mod game_state;
mod role;

pub use error::{RelayError, TransportError};
pub use event::{Event, EventKind};
pub use game_state::GameState;
pub use role::Role;

/// Result type for relay operations
pub type RelayResult<T> = Result<T, RelayError>;
