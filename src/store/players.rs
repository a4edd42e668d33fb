//! Player profile storage

use crate::error::{MatchmakingError, Result};
use crate::types::{Player, PlayerId, PlayerIdentity, PlayerRating};
use std::collections::HashMap;
use std::sync::RwLock;

/// Trait for player profile operations
pub trait PlayerStore: Send + Sync {
    /// Get a player's profile
    fn get(&self, player_id: PlayerId) -> Result<Option<Player>>;

    /// Get profiles for multiple players, skipping unknown ids
    fn get_many(&self, player_ids: &[PlayerId]) -> Result<HashMap<PlayerId, Player>>;

    /// Create the profile on first sight, otherwise refresh the display name
    fn ensure(&self, identity: &PlayerIdentity, initial_rating: PlayerRating) -> Result<Player>;

    /// Store or replace a profile
    fn save(&self, player: Player) -> Result<()>;

    /// Store several profiles in one write
    fn save_many(&self, players: Vec<Player>) -> Result<()>;

    /// Number of known players
    fn count(&self) -> Result<usize>;
}

/// In-memory player storage
#[derive(Debug, Default)]
pub struct InMemoryPlayerStore {
    players: RwLock<HashMap<PlayerId, Player>>,
}

impl InMemoryPlayerStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PlayerStore for InMemoryPlayerStore {
    fn get(&self, player_id: PlayerId) -> Result<Option<Player>> {
        let players = self
            .players
            .read()
            .map_err(|_| MatchmakingError::lock_poisoned("players read"))?;

        Ok(players.get(&player_id).cloned())
    }

    fn get_many(&self, player_ids: &[PlayerId]) -> Result<HashMap<PlayerId, Player>> {
        let players = self
            .players
            .read()
            .map_err(|_| MatchmakingError::lock_poisoned("players read"))?;

        Ok(player_ids
            .iter()
            .filter_map(|id| players.get(id).map(|p| (*id, p.clone())))
            .collect())
    }

    fn ensure(&self, identity: &PlayerIdentity, initial_rating: PlayerRating) -> Result<Player> {
        let mut players = self
            .players
            .write()
            .map_err(|_| MatchmakingError::lock_poisoned("players write"))?;

        let player = players
            .entry(identity.id)
            .or_insert_with(|| Player::new(identity, initial_rating));
        if player.name != identity.name {
            player.name = identity.name.clone();
        }

        Ok(player.clone())
    }

    fn save(&self, player: Player) -> Result<()> {
        let mut players = self
            .players
            .write()
            .map_err(|_| MatchmakingError::lock_poisoned("players write"))?;

        players.insert(player.id, player);
        Ok(())
    }

    fn save_many(&self, updated: Vec<Player>) -> Result<()> {
        let mut players = self
            .players
            .write()
            .map_err(|_| MatchmakingError::lock_poisoned("players write"))?;

        for player in updated {
            players.insert(player.id, player);
        }
        Ok(())
    }

    fn count(&self) -> Result<usize> {
        let players = self
            .players
            .read()
            .map_err(|_| MatchmakingError::lock_poisoned("players read"))?;

        Ok(players.len())
    }
}
