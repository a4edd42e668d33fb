//! Active game and draft state storage
//!
//! A game and its draft state live behind one lock so they are always
//! written and deleted together.

use crate::error::{MatchmakingError, Result};
use crate::game::Game;
use crate::types::{DraftState, GameId, PlayerId, QueueKind};
use std::collections::HashMap;
use std::sync::RwLock;

/// Trait for active game operations
pub trait GameStore: Send + Sync {
    /// Store a game together with its draft state
    ///
    /// Passing `None` deletes any draft state the game had.
    fn save(&self, game: Game, draft: Option<DraftState>) -> Result<()>;

    fn get(&self, game_id: GameId) -> Result<Option<Game>>;

    /// The active game a player is seated in, drafted or not
    fn find_by_player(&self, player_id: PlayerId) -> Result<Option<Game>>;

    fn draft(&self, game_id: GameId) -> Result<Option<DraftState>>;

    /// Delete a game and its draft state in one step
    fn remove(&self, game_id: GameId) -> Result<Option<(Game, Option<DraftState>)>>;

    /// Active games, optionally restricted to one queue, oldest first
    fn active(&self, queue: Option<QueueKind>) -> Result<Vec<Game>>;
}

#[derive(Debug, Default)]
struct GameTables {
    games: HashMap<GameId, Game>,
    drafts: HashMap<GameId, DraftState>,
}

/// In-memory game storage
#[derive(Debug, Default)]
pub struct InMemoryGameStore {
    tables: RwLock<GameTables>,
}

impl InMemoryGameStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl GameStore for InMemoryGameStore {
    fn save(&self, game: Game, draft: Option<DraftState>) -> Result<()> {
        let mut tables = self
            .tables
            .write()
            .map_err(|_| MatchmakingError::lock_poisoned("games write"))?;

        match draft {
            Some(draft) => {
                tables.drafts.insert(game.id, draft);
            }
            None => {
                tables.drafts.remove(&game.id);
            }
        }
        tables.games.insert(game.id, game);
        Ok(())
    }

    fn get(&self, game_id: GameId) -> Result<Option<Game>> {
        let tables = self
            .tables
            .read()
            .map_err(|_| MatchmakingError::lock_poisoned("games read"))?;

        Ok(tables.games.get(&game_id).cloned())
    }

    fn find_by_player(&self, player_id: PlayerId) -> Result<Option<Game>> {
        let tables = self
            .tables
            .read()
            .map_err(|_| MatchmakingError::lock_poisoned("games read"))?;

        Ok(tables
            .games
            .values()
            .find(|g| g.is_active() && g.contains(player_id))
            .cloned())
    }

    fn draft(&self, game_id: GameId) -> Result<Option<DraftState>> {
        let tables = self
            .tables
            .read()
            .map_err(|_| MatchmakingError::lock_poisoned("games read"))?;

        Ok(tables.drafts.get(&game_id).cloned())
    }

    fn remove(&self, game_id: GameId) -> Result<Option<(Game, Option<DraftState>)>> {
        let mut tables = self
            .tables
            .write()
            .map_err(|_| MatchmakingError::lock_poisoned("games write"))?;

        let draft = tables.drafts.remove(&game_id);
        Ok(tables.games.remove(&game_id).map(|game| (game, draft)))
    }

    fn active(&self, queue: Option<QueueKind>) -> Result<Vec<Game>> {
        let tables = self
            .tables
            .read()
            .map_err(|_| MatchmakingError::lock_poisoned("games read"))?;

        let mut games: Vec<Game> = tables
            .games
            .values()
            .filter(|g| g.is_active() && queue.map_or(true, |q| g.queue == q))
            .cloned()
            .collect();
        games.sort_by_key(|g| g.started_at);
        Ok(games)
    }
}
