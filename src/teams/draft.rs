//! Captain draft state machine
//!
//! Captains alternate picks starting with team one. How many players a
//! captain takes per turn comes from a `PickOrder`, so other cadences can
//! be plugged in without touching the turn logic.

use crate::error::{MatchmakingError, Result};
use crate::game::Game;
use crate::types::{DraftState, GameStatus, PlayerId, Team};
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::debug;

/// Decides how many players the captain on turn must pick
pub trait PickOrder: Send + Sync {
    /// Picks required when `remaining` players are still unassigned
    fn picks_required(&self, remaining: usize) -> usize;
}

/// The 1-2-2-2-1 cadence for 5v5 drafts
///
/// One pick when 8 or 1 players are left, two otherwise.
#[derive(Debug, Clone, Copy, Default)]
pub struct BalancedPickOrder;

impl PickOrder for BalancedPickOrder {
    fn picks_required(&self, remaining: usize) -> usize {
        match remaining {
            8 | 1 => 1,
            n => n.min(2),
        }
    }
}

/// Outcome of an accepted pick
#[derive(Debug, Clone, PartialEq)]
pub struct PickOutcome {
    pub game: Game,
    /// `None` once every player has been drafted and the game started
    pub draft: Option<DraftState>,
}

/// Runs captain drafts
#[derive(Clone)]
pub struct DraftEngine {
    order: Arc<dyn PickOrder>,
}

impl Default for DraftEngine {
    fn default() -> Self {
        Self::new(Arc::new(BalancedPickOrder))
    }
}

impl DraftEngine {
    pub fn new(order: Arc<dyn PickOrder>) -> Self {
        Self { order }
    }

    /// Opening draft state for a freshly formed game
    pub fn begin(&self, game: &Game) -> DraftState {
        DraftState {
            game_id: game.id,
            team_to_pick: Team::One,
            picks_required: self.order.picks_required(game.unassigned.len()),
            messages: HashMap::new(),
        }
    }

    /// Apply a captain's pick
    ///
    /// Nothing is changed unless every check passes. When the last player
    /// is drafted the returned game is STARTED and the draft state is gone.
    pub fn pick(
        &self,
        game: &Game,
        draft: Option<&DraftState>,
        captain: PlayerId,
        picks: &[PlayerId],
        now: DateTime<Utc>,
    ) -> Result<PickOutcome> {
        let draft = draft.ok_or(MatchmakingError::DraftAlreadyComplete { game_id: game.id })?;

        if !game.is_captain(captain) {
            return Err(MatchmakingError::NotCaptain { player_id: captain });
        }

        let team = game
            .team_of(captain)
            .ok_or(MatchmakingError::NotCaptain { player_id: captain })?;
        if team != draft.team_to_pick {
            return Err(MatchmakingError::WrongTurn {
                team_to_pick: draft.team_to_pick,
            });
        }

        if picks.len() != draft.picks_required {
            return Err(MatchmakingError::WrongPickCount {
                expected: draft.picks_required,
                actual: picks.len(),
            });
        }

        let mut seen = HashSet::new();
        for player_id in picks {
            let unassigned = game.unassigned.iter().any(|p| p.id == *player_id);
            if !unassigned || !seen.insert(*player_id) {
                return Err(MatchmakingError::InvalidPick {
                    player_id: *player_id,
                });
            }
        }

        let mut game = game.clone();
        if !game.assign(team, picks) {
            return Err(MatchmakingError::InternalError {
                message: "Validated pick could not be applied".to_string(),
            });
        }

        debug!(
            "Team {} picked {:?} in game {}, {} left",
            team,
            picks,
            game.id,
            game.unassigned.len()
        );

        if game.unassigned.is_empty() {
            game.status = GameStatus::Started;
            game.started_at = Some(now);
            return Ok(PickOutcome { game, draft: None });
        }

        let next = DraftState {
            game_id: game.id,
            team_to_pick: team.other(),
            picks_required: self.order.picks_required(game.unassigned.len()),
            messages: draft.messages.clone(),
        };
        Ok(PickOutcome {
            game,
            draft: Some(next),
        })
    }
}
