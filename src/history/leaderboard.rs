//! Leaderboard aggregation over finished game records

use crate::error::{MatchmakingError, Result};
use crate::types::{calculate_win_rate, FinishedGameRecord, Outcome, PlayerId};
use chrono::{DateTime, Datelike, Months, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Entries kept in each player ranking
pub const TOP_PLAYERS: usize = 10;
/// Entries kept in the map ranking
pub const TOP_MAPS: usize = 3;
/// Games needed to enter the restricted win rate ranking
pub const MIN_GAMES_FOR_WIN_RATE: u32 = 5;

/// Calendar range a leaderboard covers; both ends unset means all time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl DateRange {
    pub fn all_time() -> Self {
        Self {
            start: None,
            end: None,
        }
    }

    /// Resolve the optional year and month into a range
    ///
    /// A month without a year refers to `today`'s year.
    pub fn resolve(year: Option<i32>, month: Option<u32>, today: NaiveDate) -> Result<Self> {
        let year = match (year, month) {
            (None, None) => return Ok(Self::all_time()),
            (Some(year), _) => year,
            (None, Some(_)) => today.year(),
        };

        let invalid = || MatchmakingError::InvalidRequest {
            reason: format!("Invalid leaderboard period: year {:?}, month {:?}", year, month),
        };

        let (start, end) = match month {
            Some(month) => {
                let start = NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(invalid)?;
                let end = start
                    .checked_add_months(Months::new(1))
                    .and_then(|next| next.pred_opt())
                    .ok_or_else(invalid)?;
                (start, end)
            }
            None => (
                NaiveDate::from_ymd_opt(year, 1, 1).ok_or_else(invalid)?,
                NaiveDate::from_ymd_opt(year, 12, 31).ok_or_else(invalid)?,
            ),
        };

        Ok(Self {
            start: Some(start),
            end: Some(end),
        })
    }

    /// First instant of the range
    pub fn start_instant(&self) -> Option<DateTime<Utc>> {
        self.start
            .and_then(|date| date.and_hms_opt(0, 0, 0))
            .map(|dt| dt.and_utc())
    }

    /// Last instant of the range, inclusive
    pub fn end_instant(&self) -> Option<DateTime<Utc>> {
        self.end
            .and_then(|date| date.and_hms_nano_opt(23, 59, 59, 999_999_999))
            .map(|dt| dt.and_utc())
    }
}

/// A map and how often it was played
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapCount {
    pub map: String,
    pub count: usize,
}

/// One row of a player ranking
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedPlayer<T> {
    pub player_id: PlayerId,
    pub name: String,
    pub value: T,
}

/// Per-player totals within a range
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerStats {
    pub player_id: PlayerId,
    pub name: String,
    pub games: u32,
    pub wins: u32,
    pub losses: u32,
    pub ties: u32,
}

impl PlayerStats {
    fn new(player_id: PlayerId, name: String) -> Self {
        Self {
            player_id,
            name,
            games: 0,
            wins: 0,
            losses: 0,
            ties: 0,
        }
    }

    fn record(&mut self, outcome: Outcome) {
        self.games += 1;
        match outcome {
            Outcome::Win => self.wins += 1,
            Outcome::Loss => self.losses += 1,
            Outcome::Tie => self.ties += 1,
        }
    }

    /// Ties count toward games only
    pub fn win_rate(&self) -> Option<f64> {
        calculate_win_rate(self.wins, self.losses)
    }
}

/// Statistics derived from the records of one period
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Leaderboard {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub total_games: usize,
    pub most_popular_maps: Vec<MapCount>,
    pub most_games_played: Vec<RankedPlayer<u32>>,
    pub most_games_won: Vec<RankedPlayer<u32>>,
    pub highest_win_rate: Vec<RankedPlayer<f64>>,
    pub unique_players: usize,
}

impl Leaderboard {
    /// Aggregate `records`, which must already be limited to `range`
    pub fn build(range: DateRange, records: &[FinishedGameRecord]) -> Self {
        let stats = player_stats(records);

        Self {
            start_date: range.start,
            end_date: range.end,
            total_games: records.len(),
            most_popular_maps: popular_maps(records),
            most_games_played: top_by(&stats, |s| s.games),
            most_games_won: top_by(&stats, |s| s.wins),
            highest_win_rate: highest_win_rates(&stats),
            unique_players: stats.len(),
        }
    }
}

/// Per-player totals in first-seen order
pub fn player_stats(records: &[FinishedGameRecord]) -> Vec<PlayerStats> {
    let mut index: HashMap<PlayerId, usize> = HashMap::new();
    let mut stats: Vec<PlayerStats> = Vec::new();

    for result in records.iter().flat_map(|r| &r.results) {
        let position = *index.entry(result.player_id).or_insert_with(|| {
            stats.push(PlayerStats::new(result.player_id, result.name.clone()));
            stats.len() - 1
        });
        stats[position].record(result.outcome);
    }
    stats
}

/// Most played maps; equal counts keep first-seen order
pub fn popular_maps(records: &[FinishedGameRecord]) -> Vec<MapCount> {
    let mut counts: Vec<MapCount> = Vec::new();

    for map in records.iter().flat_map(|r| &r.maps) {
        match counts.iter_mut().find(|c| &c.map == map) {
            Some(count) => count.count += 1,
            None => counts.push(MapCount {
                map: map.clone(),
                count: 1,
            }),
        }
    }

    counts.sort_by(|a, b| b.count.cmp(&a.count));
    counts.truncate(TOP_MAPS);
    counts
}

fn top_by(stats: &[PlayerStats], key: impl Fn(&PlayerStats) -> u32) -> Vec<RankedPlayer<u32>> {
    let mut ranked: Vec<&PlayerStats> = stats.iter().collect();
    ranked.sort_by_key(|s| std::cmp::Reverse(key(s)));

    ranked
        .into_iter()
        .take(TOP_PLAYERS)
        .map(|s| RankedPlayer {
            player_id: s.player_id,
            name: s.name.clone(),
            value: key(s),
        })
        .collect()
}

/// Best win rates among players with at least five games, or among everyone
/// with a defined win rate when fewer than ten players qualify
pub fn highest_win_rates(stats: &[PlayerStats]) -> Vec<RankedPlayer<f64>> {
    let mut rated: Vec<(&PlayerStats, f64)> = stats
        .iter()
        .filter_map(|s| s.win_rate().map(|rate| (s, rate)))
        .collect();
    rated.sort_by(|a, b| b.1.total_cmp(&a.1));

    let qualified: Vec<(&PlayerStats, f64)> = rated
        .iter()
        .filter(|(s, _)| s.games >= MIN_GAMES_FOR_WIN_RATE)
        .cloned()
        .collect();
    let pool = if qualified.len() >= TOP_PLAYERS {
        qualified
    } else {
        rated
    };

    pool.into_iter()
        .take(TOP_PLAYERS)
        .map(|(s, rate)| RankedPlayer {
            player_id: s.player_id,
            name: s.name.clone(),
            value: rate,
        })
        .collect()
}
