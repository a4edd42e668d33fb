//! Balanced team formation
//!
//! Every way to split the roster into two equal teams is enumerated once,
//! scored by the skill model and ranked best first. Formation takes rank 0;
//! each reshuffle takes the next rank, so a game never sees the same split
//! twice until the ranking is exhausted.

use crate::error::{MatchmakingError, Result};
use crate::game::TeamRoster;
use crate::rating::SkillModel;
use crate::types::{PlayerIdentity, PlayerRating};
use rand::Rng;
use std::sync::Arc;
use tracing::{debug, warn};

/// Largest roster the bitmask enumeration accepts
pub const MAX_ROSTER: usize = 20;

/// A roster member with the rating used for balancing
#[derive(Debug, Clone, PartialEq)]
pub struct RatedPlayer {
    pub identity: PlayerIdentity,
    pub rating: PlayerRating,
}

impl RatedPlayer {
    pub fn new(identity: PlayerIdentity, rating: PlayerRating) -> Self {
        Self { identity, rating }
    }
}

/// One unordered split of the roster into two teams
#[derive(Debug, Clone, PartialEq)]
pub struct Partition {
    pub team_one: Vec<PlayerIdentity>,
    pub team_two: Vec<PlayerIdentity>,
    pub quality: f64,
}

/// A ranked partition picked for a game
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    pub partition: Partition,
    /// Rank actually used after any wrap-around
    pub rank: u32,
    /// The requested rank was past the end of the ranking
    pub wrapped: bool,
}

/// Forms balanced teams from a full roster
#[derive(Clone)]
pub struct TeamBalancer {
    model: Arc<dyn SkillModel>,
    team_size: usize,
}

impl TeamBalancer {
    pub fn new(model: Arc<dyn SkillModel>, team_size: usize) -> Self {
        Self { model, team_size }
    }

    pub fn team_size(&self) -> usize {
        self.team_size
    }

    /// All partitions of the roster, best quality first
    ///
    /// The roster is ordered by player id before enumeration, and the
    /// lowest id is always placed on team one so each split appears once.
    /// Equal qualities keep enumeration order.
    pub fn ranked_partitions(&self, roster: &[RatedPlayer]) -> Result<Vec<Partition>> {
        let size = roster.len();
        if self.team_size == 0 || size != self.team_size * 2 {
            return Err(MatchmakingError::InvalidRequest {
                reason: format!(
                    "Need exactly {} players to form teams, got {}",
                    self.team_size * 2,
                    size
                ),
            });
        }
        if size > MAX_ROSTER {
            return Err(MatchmakingError::InvalidRequest {
                reason: format!("Cannot enumerate teams for {} players", size),
            });
        }

        let mut sorted: Vec<&RatedPlayer> = roster.iter().collect();
        sorted.sort_by_key(|p| p.identity.id);
        for pair in sorted.windows(2) {
            if pair[0].identity.id == pair[1].identity.id {
                return Err(MatchmakingError::InvalidRequest {
                    reason: format!("Player {} is listed twice", pair[0].identity.id),
                });
            }
        }

        let mut partitions = Vec::new();
        for mask in 0u32..(1u32 << size) {
            if mask & 1 == 0 || mask.count_ones() as usize != self.team_size {
                continue;
            }

            let (mut one, mut two) = (Vec::new(), Vec::new());
            let (mut one_ratings, mut two_ratings) = (Vec::new(), Vec::new());
            for (bit, player) in sorted.iter().enumerate() {
                if mask & (1 << bit) != 0 {
                    one.push(player.identity.clone());
                    one_ratings.push(player.rating);
                } else {
                    two.push(player.identity.clone());
                    two_ratings.push(player.rating);
                }
            }

            partitions.push(Partition {
                quality: self.model.quality(&one_ratings, &two_ratings),
                team_one: one,
                team_two: two,
            });
        }

        partitions.sort_by(|a, b| b.quality.total_cmp(&a.quality));
        debug!("Ranked {} partitions for {} players", partitions.len(), size);
        Ok(partitions)
    }

    /// Pick the partition at `rank`, wrapping to the start of the ranking
    /// when `rank` runs past the end
    pub fn select(&self, roster: &[RatedPlayer], rank: u32) -> Result<Selection> {
        let mut partitions = self.ranked_partitions(roster)?;
        let total = partitions.len() as u32;

        let wrapped = rank >= total;
        let used = if wrapped {
            warn!(
                "Reshuffle rank {} is past the {} available partitions, wrapping around",
                rank, total
            );
            rank % total
        } else {
            rank
        };

        Ok(Selection {
            partition: partitions.swap_remove(used as usize),
            rank: used,
            wrapped,
        })
    }
}

/// Turn a partition into rosters with one random captain per side
pub fn with_random_captains<R: Rng + ?Sized>(
    partition: &Partition,
    rng: &mut R,
) -> (TeamRoster, TeamRoster) {
    let mut roster = |slots: &[PlayerIdentity]| {
        let captain = if slots.is_empty() {
            None
        } else {
            Some(rng.random_range(0..slots.len()))
        };
        TeamRoster::new(slots.to_vec(), captain)
    };

    let one = roster(&partition.team_one);
    let two = roster(&partition.team_two);
    (one, two)
}
