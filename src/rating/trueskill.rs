//! TrueSkill rating system implementation
//!
//! This module provides the concrete skill model using the two-team
//! TrueSkill functions from the skillratings crate.

use crate::config::RatingConfig;
use crate::error::MatchmakingError;
use crate::rating::calculator::{RatingChange, RatingUpdate, SkillModel};
use crate::types::{PlayerId, PlayerRating};
use skillratings::trueskill::{
    match_quality_two_teams, trueskill_two_teams, TrueSkillConfig, TrueSkillRating,
};
use skillratings::Outcomes;
use tracing::debug;

/// TrueSkill calculator for two-team games
#[derive(Debug)]
pub struct TrueSkillCalculator {
    config: RatingConfig,
    trueskill: TrueSkillConfig,
}

impl TrueSkillCalculator {
    /// Create a new TrueSkill calculator
    pub fn new(config: RatingConfig) -> crate::error::Result<Self> {
        config.validate()?;

        let trueskill = TrueSkillConfig {
            draw_probability: config.draw_probability,
            beta: config.beta,
            default_dynamics: config.dynamics,
        };

        Ok(Self { config, trueskill })
    }

    fn to_trueskill(ratings: &[PlayerRating]) -> Vec<TrueSkillRating> {
        ratings.iter().map(|r| (*r).into()).collect()
    }
}

impl SkillModel for TrueSkillCalculator {
    fn initial_rating(&self) -> PlayerRating {
        PlayerRating {
            rating: self.config.initial_rating,
            uncertainty: self.config.initial_uncertainty,
        }
    }

    fn quality(&self, team_one: &[PlayerRating], team_two: &[PlayerRating]) -> f64 {
        if team_one.is_empty() || team_two.is_empty() {
            return 0.0;
        }

        let quality = match_quality_two_teams(
            &Self::to_trueskill(team_one),
            &Self::to_trueskill(team_two),
            &self.trueskill,
        );

        quality.clamp(0.0, 1.0)
    }

    fn rate(
        &self,
        first: &[(PlayerId, PlayerRating)],
        second: &[(PlayerId, PlayerRating)],
        tie: bool,
    ) -> crate::error::Result<RatingUpdate> {
        if first.is_empty() || second.is_empty() {
            return Err(MatchmakingError::InvalidRequest {
                reason: "Both sides need players for a rating update".to_string(),
            });
        }

        let first_ratings: Vec<PlayerRating> = first.iter().map(|(_, r)| *r).collect();
        let second_ratings: Vec<PlayerRating> = second.iter().map(|(_, r)| *r).collect();
        let match_quality = self.quality(&first_ratings, &second_ratings);

        let outcome = if tie { Outcomes::DRAW } else { Outcomes::WIN };
        let (new_first, new_second) = trueskill_two_teams(
            &Self::to_trueskill(&first_ratings),
            &Self::to_trueskill(&second_ratings),
            &outcome,
            &self.trueskill,
        );

        let changes: Vec<RatingChange> = first
            .iter()
            .zip(new_first)
            .chain(second.iter().zip(new_second))
            .map(|((player_id, old_rating), new_rating)| RatingChange {
                player_id: *player_id,
                old_rating: *old_rating,
                new_rating: new_rating.into(),
            })
            .collect();

        debug!(
            "Rated {} players (tie: {}, quality: {:.3})",
            changes.len(),
            tie,
            match_quality
        );

        Ok(RatingUpdate {
            changes,
            match_quality,
        })
    }
}
