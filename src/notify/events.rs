//! Events handed to the notification layer

use crate::game::Game;
use crate::rating::RatingChange;
use crate::types::{DraftState, FinishedGameRecord, GameId, PlayerId, QueueKind};
use serde::{Deserialize, Serialize};

/// Something participants should be told about
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MatchEvent {
    PlayerQueued {
        player_id: PlayerId,
        name: String,
        queue: QueueKind,
        count: usize,
    },
    QueueEntryExpired {
        player_id: PlayerId,
        name: String,
        queue: QueueKind,
    },
    GameStarted {
        game: Game,
        quality: f64,
    },
    DraftStarted {
        game: Game,
        draft: DraftState,
    },
    /// A pick was applied; `draft` is `None` once every player is assigned
    DraftUpdated {
        game: Game,
        draft: Option<DraftState>,
    },
    TeamsShuffled {
        game: Game,
        quality: f64,
    },
    PlayersSwapped {
        first: PlayerId,
        second: PlayerId,
        games: Vec<GameId>,
    },
    PlayerSubbed {
        game_id: GameId,
        requester: PlayerId,
        target: PlayerId,
    },
    MapsUpdated {
        game_id: GameId,
        maps: Vec<String>,
    },
    GameFinished {
        record: FinishedGameRecord,
        rating_changes: Vec<RatingChange>,
    },
    GameCancelled {
        game_id: GameId,
        cancelled_by: PlayerId,
    },
    ResultsFlipped {
        record: FinishedGameRecord,
    },
}

impl MatchEvent {
    /// Short name for logging
    pub fn kind(&self) -> &'static str {
        match self {
            MatchEvent::PlayerQueued { .. } => "PlayerQueued",
            MatchEvent::QueueEntryExpired { .. } => "QueueEntryExpired",
            MatchEvent::GameStarted { .. } => "GameStarted",
            MatchEvent::DraftStarted { .. } => "DraftStarted",
            MatchEvent::DraftUpdated { .. } => "DraftUpdated",
            MatchEvent::TeamsShuffled { .. } => "TeamsShuffled",
            MatchEvent::PlayersSwapped { .. } => "PlayersSwapped",
            MatchEvent::PlayerSubbed { .. } => "PlayerSubbed",
            MatchEvent::MapsUpdated { .. } => "MapsUpdated",
            MatchEvent::GameFinished { .. } => "GameFinished",
            MatchEvent::GameCancelled { .. } => "GameCancelled",
            MatchEvent::ResultsFlipped { .. } => "ResultsFlipped",
        }
    }
}
