//! Shared state cache

use parking_lot::Mutex;

use crate::types::GameState;

/// Last authoritative game state reported by a display
#[derive(Default)]
pub struct StateCache {
    value: Mutex<GameState>,
}

impl StateCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrite the cached value, returning the previous one
    pub fn set(&self, state: GameState) -> GameState {
        std::mem::replace(&mut *self.value.lock(), state)
    }

    pub fn get(&self) -> GameState {
        *self.value.lock()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_before_set_returns_default() {
        let cache = StateCache::new();
        assert_eq!(cache.get(), GameState::Idle);
    }

    #[test]
    fn test_set_overwrites() {
        let cache = StateCache::new();
        assert_eq!(cache.set(GameState::Active), GameState::Idle);
        assert_eq!(cache.get(), GameState::Active);
        assert_eq!(cache.get(), GameState::Active);

        cache.set(GameState::Ended);
        assert_eq!(cache.get(), GameState::Ended);
    }
}
