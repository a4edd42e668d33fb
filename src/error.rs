//! Error types for the coordinator
//!
//! Business conditions (wrong turn, not in game, ...) are recoverable and
//! surfaced to the command layer as typed values. Storage and internal
//! failures are fatal and are never retried here.

use crate::types::{GameId, PlayerId, QueueKind, Team};

/// Result type alias for convenience
pub type Result<T, E = MatchmakingError> = std::result::Result<T, E>;

/// Every failure a core operation can report
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MatchmakingError {
    #[error("Player {player_id} is not in a game")]
    NotInGame { player_id: PlayerId },

    #[error("Player {player_id} is already in a game")]
    AlreadyInGame { player_id: PlayerId },

    #[error("It is team {team_to_pick}'s turn to pick")]
    WrongTurn { team_to_pick: Team },

    #[error("Expected {expected} picks, got {actual}")]
    WrongPickCount { expected: usize, actual: usize },

    #[error("Drafting is already finished for game {game_id}")]
    DraftAlreadyComplete { game_id: GameId },

    #[error("Player {player_id} is not a captain")]
    NotCaptain { player_id: PlayerId },

    #[error("Game {game_id} is still drafting")]
    DraftInProgress { game_id: GameId },

    #[error("Teams can only be shuffled {limit} times")]
    TooManyShuffles { limit: u32 },

    #[error("Map number {map_number} is invalid, game has {available} maps")]
    InvalidMapNumber { map_number: usize, available: usize },

    #[error("Invalid request: {reason}")]
    InvalidRequest { reason: String },

    #[error("Game {game_id} ended in a tie and cannot be flipped")]
    TieNotReversible { game_id: GameId },

    #[error("Game not found: {game_id}")]
    GameNotFound { game_id: GameId },

    #[error("Player {player_id} cannot be picked")]
    InvalidPick { player_id: PlayerId },

    #[error("Queue {queue} has {count} of {capacity} players")]
    QueueNotFull {
        queue: QueueKind,
        count: usize,
        capacity: usize,
    },

    #[error("Storage failure: {message}")]
    Storage { message: String },

    #[error("Configuration error: {message}")]
    ConfigurationError { message: String },

    #[error("Internal service error: {message}")]
    InternalError { message: String },
}

impl MatchmakingError {
    /// Whether the caller can render this as a user-facing message
    /// instead of treating it as a fault
    pub fn is_recoverable(&self) -> bool {
        !matches!(
            self,
            MatchmakingError::Storage { .. }
                | MatchmakingError::ConfigurationError { .. }
                | MatchmakingError::InternalError { .. }
        )
    }

    pub(crate) fn lock_poisoned(what: &str) -> Self {
        MatchmakingError::Storage {
            message: format!("Failed to acquire {} lock", what),
        }
    }
}
