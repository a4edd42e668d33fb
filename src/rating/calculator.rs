//! Skill model trait
//!
//! This module defines the interface the coordinator uses to score proposed
//! teams and to move ratings after a result.

use crate::types::{PlayerId, PlayerRating};
use serde::{Deserialize, Serialize};

/// Rating movement for one player
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatingChange {
    pub player_id: PlayerId,
    pub old_rating: PlayerRating,
    pub new_rating: PlayerRating,
}

impl RatingChange {
    pub fn delta(&self) -> f64 {
        self.new_rating.rating - self.old_rating.rating
    }
}

/// Result of a rating update
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RatingUpdate {
    /// Rating changes for every listed player, first side then second side
    pub changes: Vec<RatingChange>,
    /// Quality of the match before the update (0.0 to 1.0, higher is better)
    pub match_quality: f64,
}

/// Trait for scoring matches and updating ratings after games
pub trait SkillModel: Send + Sync {
    /// Get the rating given to new players
    fn initial_rating(&self) -> PlayerRating;

    /// Estimate how evenly matched two teams are (0.0 to 1.0)
    ///
    /// Symmetric in its arguments.
    fn quality(&self, team_one: &[PlayerRating], team_two: &[PlayerRating]) -> f64;

    /// Calculate new ratings after a game
    ///
    /// # Arguments
    /// * `first` - the winning side, or one side of a tie
    /// * `second` - the losing side, or the other side of a tie
    /// * `tie` - whether the game was drawn
    fn rate(
        &self,
        first: &[(PlayerId, PlayerRating)],
        second: &[(PlayerId, PlayerRating)],
        tie: bool,
    ) -> crate::error::Result<RatingUpdate>;
}
