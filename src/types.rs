//! Common types used throughout the coordinator

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use skillratings::trueskill::TrueSkillRating;
use std::collections::HashMap;
use std::str::FromStr;
use uuid::Uuid;

/// Stable numeric identifier of a player, assigned by the front end
pub type PlayerId = u64;

/// Unique identifier for games
pub type GameId = Uuid;

/// Opaque reference to a notification message shown to a captain
pub type MessageRef = u64;

/// A player as identified by the command layer
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlayerIdentity {
    pub id: PlayerId,
    pub name: String,
}

impl PlayerIdentity {
    pub fn new(id: PlayerId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

/// Named waiting pools players can join
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueueKind {
    Quickplay,
    Newbloods,
    Competitive,
    Test,
}

impl QueueKind {
    pub const ALL: [QueueKind; 4] = [
        QueueKind::Quickplay,
        QueueKind::Newbloods,
        QueueKind::Competitive,
        QueueKind::Test,
    ];

    /// Competitive games are formed by a captain draft instead of balancing
    pub fn uses_draft(&self) -> bool {
        matches!(self, QueueKind::Competitive)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            QueueKind::Quickplay => "quickplay",
            QueueKind::Newbloods => "newbloods",
            QueueKind::Competitive => "competitive",
            QueueKind::Test => "test",
        }
    }
}

impl std::fmt::Display for QueueKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QueueKind {
    type Err = crate::error::MatchmakingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        QueueKind::ALL
            .into_iter()
            .find(|queue| queue.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| crate::error::MatchmakingError::InvalidRequest {
                reason: format!("Unknown queue: {}", s),
            })
    }
}

/// Target of a queue removal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueSelector {
    Single(QueueKind),
    All,
}

/// Skill rating for a player (mean and uncertainty)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlayerRating {
    pub rating: f64,
    pub uncertainty: f64,
}

impl Default for PlayerRating {
    fn default() -> Self {
        TrueSkillRating::new().into()
    }
}

impl From<TrueSkillRating> for PlayerRating {
    fn from(rating: TrueSkillRating) -> Self {
        Self {
            rating: rating.rating,
            uncertainty: rating.uncertainty,
        }
    }
}

impl From<PlayerRating> for TrueSkillRating {
    fn from(rating: PlayerRating) -> Self {
        Self {
            rating: rating.rating,
            uncertainty: rating.uncertainty,
        }
    }
}

/// Declared home region of a player
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Region {
    #[default]
    NotSet,
    NorthAmerica,
    Europe,
    Australia,
}

impl FromStr for Region {
    type Err = crate::error::MatchmakingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "NA" => Ok(Region::NorthAmerica),
            "EU" => Ok(Region::Europe),
            "AU" => Ok(Region::Australia),
            "NOT SET" | "NONE" => Ok(Region::NotSet),
            _ => Err(crate::error::MatchmakingError::InvalidRequest {
                reason: format!("Unknown region: {}", s),
            }),
        }
    }
}

/// Outcome of a finished game from one player's point of view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Outcome {
    Win,
    Loss,
    Tie,
}

impl Outcome {
    /// Win and loss trade places, a tie stays a tie
    pub fn reversed(self) -> Self {
        match self {
            Outcome::Win => Outcome::Loss,
            Outcome::Loss => Outcome::Win,
            Outcome::Tie => Outcome::Tie,
        }
    }
}

/// Win rate, undefined when a player has neither wins nor losses
pub fn calculate_win_rate(wins: u32, losses: u32) -> Option<f64> {
    if wins == 0 && losses == 0 {
        return None;
    }
    Some(wins as f64 / (wins + losses) as f64)
}

/// Persistent player profile
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub rating: PlayerRating,
    pub games_played: u32,
    pub wins: u32,
    pub losses: u32,
    pub ties: u32,
    pub region: Region,
    pub last_played: Option<DateTime<Utc>>,
    /// Earliest time the player may queue again
    pub delay_target: Option<DateTime<Utc>>,
    pub hide_stats: bool,
    pub created_at: DateTime<Utc>,
}

impl Player {
    /// Create a profile for a player seen for the first time
    pub fn new(identity: &PlayerIdentity, rating: PlayerRating) -> Self {
        Self {
            id: identity.id,
            name: identity.name.clone(),
            rating,
            games_played: 0,
            wins: 0,
            losses: 0,
            ties: 0,
            region: Region::NotSet,
            last_played: None,
            delay_target: None,
            hide_stats: true,
            created_at: Utc::now(),
        }
    }

    pub fn win_rate(&self) -> Option<f64> {
        calculate_win_rate(self.wins, self.losses)
    }

    fn count_mut(&mut self, outcome: Outcome) -> &mut u32 {
        match outcome {
            Outcome::Win => &mut self.wins,
            Outcome::Loss => &mut self.losses,
            Outcome::Tie => &mut self.ties,
        }
    }

    /// Apply a finished game to the aggregate counters
    pub fn record_game(&mut self, outcome: Outcome, ended_at: DateTime<Utc>, delay: chrono::Duration) {
        self.games_played += 1;
        *self.count_mut(outcome) += 1;
        self.last_played = Some(ended_at);
        self.delay_target = Some(ended_at + delay);
    }

    /// Move one counted result from `from` to `to`
    pub fn reassign_outcome(&mut self, from: Outcome, to: Outcome) {
        let previous = self.count_mut(from);
        *previous = previous.saturating_sub(1);
        *self.count_mut(to) += 1;
    }
}

/// A player waiting in a queue
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueEntry {
    pub player_id: PlayerId,
    pub name: String,
    pub queue: QueueKind,
    pub enqueued_at: DateTime<Utc>,
}

/// One of the two sides of a game
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Team {
    One,
    Two,
}

impl Team {
    pub fn number(&self) -> u8 {
        match self {
            Team::One => 1,
            Team::Two => 2,
        }
    }

    pub fn other(&self) -> Team {
        match self {
            Team::One => Team::Two,
            Team::Two => Team::One,
        }
    }
}

impl std::fmt::Display for Team {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.number())
    }
}

/// Lifecycle of a game
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameStatus {
    /// Formed, captains still drafting
    Pending,
    Started,
    Finished,
}

/// Flattened view of a player seated in a game
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserInGame {
    pub player_id: PlayerId,
    pub name: String,
    pub is_captain: bool,
    /// `None` while the player is waiting to be drafted
    pub team: Option<Team>,
}

/// Turn state of a captain draft
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DraftState {
    pub game_id: GameId,
    pub team_to_pick: Team,
    pub picks_required: usize,
    /// Captain id to the message showing them the draft
    pub messages: HashMap<PlayerId, MessageRef>,
}

/// Per-player result of a finished game
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerGameResult {
    pub player_id: PlayerId,
    pub name: String,
    pub team: Team,
    pub outcome: Outcome,
}

/// Immutable historical projection of a finished game
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinishedGameRecord {
    pub game_id: GameId,
    pub queue: QueueKind,
    pub maps: Vec<String>,
    pub started_at: Option<DateTime<Utc>>,
    pub ended_at: DateTime<Utc>,
    pub results: Vec<PlayerGameResult>,
}

impl FinishedGameRecord {
    pub fn is_tie(&self) -> bool {
        self.results.iter().any(|r| r.outcome == Outcome::Tie)
    }

    /// Names on the winning side; on a tie every participant is listed here
    pub fn winners(&self) -> Vec<String> {
        self.names_where(|outcome| outcome != Outcome::Loss)
    }

    pub fn losers(&self) -> Vec<String> {
        self.names_where(|outcome| outcome == Outcome::Loss)
    }

    pub fn player_ids_with(&self, outcome: Outcome) -> Vec<PlayerId> {
        self.results
            .iter()
            .filter(|r| r.outcome == outcome)
            .map(|r| r.player_id)
            .collect()
    }

    fn names_where(&self, keep: impl Fn(Outcome) -> bool) -> Vec<String> {
        self.results
            .iter()
            .filter(|r| keep(r.outcome))
            .map(|r| r.name.clone())
            .collect()
    }
}
