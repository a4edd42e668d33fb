//! Queue and game configuration

use serde::{Deserialize, Serialize};

/// Queue admission settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueSettings {
    /// Players needed to form a game
    pub capacity: usize,
    /// Idle time after which a queue entry is removed
    pub idle_timeout_seconds: u64,
    /// Wait after a finished game before the player may queue again
    pub requeue_delay_seconds: u64,
}

impl Default for QueueSettings {
    fn default() -> Self {
        Self {
            capacity: 10,
            idle_timeout_seconds: 45 * 60,
            requeue_delay_seconds: 15,
        }
    }
}

impl QueueSettings {
    pub fn idle_timeout(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.idle_timeout_seconds as i64)
    }

    pub fn requeue_delay(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.requeue_delay_seconds as i64)
    }
}

/// Game formation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GameSettings {
    pub team_size: usize,
    /// Shuffles are rejected once the reshuffle counter reaches this value
    pub shuffle_limit: u32,
    /// Maps rolled for balanced queues
    pub balanced_map_count: usize,
    /// Maps rolled for drafted games
    pub draft_map_count: usize,
}

impl Default for GameSettings {
    fn default() -> Self {
        Self {
            team_size: 5,
            shuffle_limit: 4,
            balanced_map_count: 1,
            draft_map_count: 2,
        }
    }
}

impl GameSettings {
    pub fn map_count(&self, uses_draft: bool) -> usize {
        if uses_draft {
            self.draft_map_count
        } else {
            self.balanced_map_count
        }
    }
}
