//! Read side over finished games and player profiles

use crate::error::{MatchmakingError, Result};
use crate::history::leaderboard::{DateRange, Leaderboard};
use crate::locks::KeyedLocks;
use crate::store::Stores;
use crate::types::{FinishedGameRecord, PlayerId, PlayerRating, Region};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

/// Number of records shown by default in recent history
pub const DEFAULT_HISTORY_LIMIT: usize = 5;

/// Public view of a player's profile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileView {
    pub player_id: PlayerId,
    pub name: String,
    pub games_played: u32,
    pub wins: u32,
    pub losses: u32,
    pub ties: u32,
    pub win_rate: Option<f64>,
    pub region: Region,
    pub last_played: Option<DateTime<Utc>>,
    /// `None` when the player hides their stats
    pub rating: Option<PlayerRating>,
}

/// History, leaderboards and profile settings
#[derive(Clone)]
pub struct HistoryService {
    stores: Stores,
    player_locks: Arc<KeyedLocks<PlayerId>>,
}

impl HistoryService {
    /// `player_locks` must be the table admission and game results use,
    /// so profile edits never interleave with them
    pub fn new(stores: Stores, player_locks: Arc<KeyedLocks<PlayerId>>) -> Self {
        Self {
            stores,
            player_locks,
        }
    }

    /// Up to `limit` finished games, most recent first
    pub fn recent(&self, limit: usize) -> Result<Vec<FinishedGameRecord>> {
        self.stores.results.recent(limit)
    }

    /// Leaderboard for a year, a month, or all time
    pub fn leaderboard(&self, year: Option<i32>, month: Option<u32>) -> Result<Leaderboard> {
        let range = DateRange::resolve(year, month, Utc::now().date_naive())?;
        let records = self
            .stores
            .results
            .in_range(range.start_instant(), range.end_instant())?;

        debug!(
            "Building leaderboard for {:?}..{:?} from {} games",
            range.start,
            range.end,
            records.len()
        );
        Ok(Leaderboard::build(range, &records))
    }

    pub fn profile(&self, player_id: PlayerId) -> Result<Option<ProfileView>> {
        Ok(self.stores.players.get(player_id)?.map(|player| ProfileView {
            player_id: player.id,
            win_rate: player.win_rate(),
            rating: (!player.hide_stats).then_some(player.rating),
            name: player.name,
            games_played: player.games_played,
            wins: player.wins,
            losses: player.losses,
            ties: player.ties,
            region: player.region,
            last_played: player.last_played,
        }))
    }

    pub async fn set_region(&self, player_id: PlayerId, region: Region) -> Result<()> {
        let _guard = self.player_locks.lock(&player_id).await;
        let mut player = self
            .stores
            .players
            .get(player_id)?
            .ok_or_else(|| unknown_player(player_id))?;

        player.region = region;
        self.stores.players.save(player)?;
        info!("Player {} set region {:?}", player_id, region);
        Ok(())
    }

    pub async fn set_stats_visibility(&self, player_id: PlayerId, visible: bool) -> Result<()> {
        let _guard = self.player_locks.lock(&player_id).await;
        let mut player = self
            .stores
            .players
            .get(player_id)?
            .ok_or_else(|| unknown_player(player_id))?;

        player.hide_stats = !visible;
        self.stores.players.save(player)?;
        debug!("Player {} stats visible: {}", player_id, visible);
        Ok(())
    }
}

fn unknown_player(player_id: PlayerId) -> MatchmakingError {
    MatchmakingError::InvalidRequest {
        reason: format!("Player {} has no profile yet", player_id),
    }
}
