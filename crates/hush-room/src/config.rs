//! Room configuration.

use serde::{Deserialize, Serialize};

/// Fewest players any room may be configured to start with.
pub const MIN_PLAYERS: usize = 4;

/// Largest roster any room may be configured to hold.
pub const MAX_PLAYERS: usize = 8;

/// Roster limits shared by every room in a registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomConfig {
    /// Minimum players required to start, and to keep playing. Dropping
    /// below this sends the room back to Waiting.
    pub min_players: usize,

    /// Maximum players allowed in the room.
    pub max_players: usize,
}

impl RoomConfig {
    /// Returns `true` if the limits stay inside
    /// `MIN_PLAYERS..=MAX_PLAYERS` and are not inverted.
    pub fn is_valid(&self) -> bool {
        MIN_PLAYERS <= self.min_players
            && self.min_players <= self.max_players
            && self.max_players <= MAX_PLAYERS
    }
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            min_players: MIN_PLAYERS,
            max_players: MAX_PLAYERS,
        }
    }
}
