//! Finished game record storage (append-only apart from result flips)

use crate::error::{MatchmakingError, Result};
use crate::types::{FinishedGameRecord, GameId};
use chrono::{DateTime, Utc};
use std::sync::RwLock;

/// Trait for finished game records
pub trait ResultStore: Send + Sync {
    fn append(&self, record: FinishedGameRecord) -> Result<()>;

    fn get(&self, game_id: GameId) -> Result<Option<FinishedGameRecord>>;

    /// Replace a stored record; `false` if the game is unknown
    fn update(&self, record: FinishedGameRecord) -> Result<bool>;

    /// Up to `limit` records, most recently ended first
    fn recent(&self, limit: usize) -> Result<Vec<FinishedGameRecord>>;

    /// Records ended within the inclusive range, oldest first
    fn in_range(
        &self,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> Result<Vec<FinishedGameRecord>>;
}

/// In-memory result storage
#[derive(Debug, Default)]
pub struct InMemoryResultStore {
    records: RwLock<Vec<FinishedGameRecord>>,
}

impl InMemoryResultStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ResultStore for InMemoryResultStore {
    fn append(&self, record: FinishedGameRecord) -> Result<()> {
        let mut records = self
            .records
            .write()
            .map_err(|_| MatchmakingError::lock_poisoned("results write"))?;

        records.push(record);
        Ok(())
    }

    fn get(&self, game_id: GameId) -> Result<Option<FinishedGameRecord>> {
        let records = self
            .records
            .read()
            .map_err(|_| MatchmakingError::lock_poisoned("results read"))?;

        Ok(records.iter().find(|r| r.game_id == game_id).cloned())
    }

    fn update(&self, record: FinishedGameRecord) -> Result<bool> {
        let mut records = self
            .records
            .write()
            .map_err(|_| MatchmakingError::lock_poisoned("results write"))?;

        match records.iter_mut().find(|r| r.game_id == record.game_id) {
            Some(stored) => {
                *stored = record;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn recent(&self, limit: usize) -> Result<Vec<FinishedGameRecord>> {
        let records = self
            .records
            .read()
            .map_err(|_| MatchmakingError::lock_poisoned("results read"))?;

        let mut recent: Vec<FinishedGameRecord> = records.clone();
        recent.sort_by(|a, b| b.ended_at.cmp(&a.ended_at));
        recent.truncate(limit);
        Ok(recent)
    }

    fn in_range(
        &self,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> Result<Vec<FinishedGameRecord>> {
        let records = self
            .records
            .read()
            .map_err(|_| MatchmakingError::lock_poisoned("results read"))?;

        let mut found: Vec<FinishedGameRecord> = records
            .iter()
            .filter(|r| start.map_or(true, |s| r.ended_at >= s))
            .filter(|r| end.map_or(true, |e| r.ended_at <= e))
            .cloned()
            .collect();
        found.sort_by_key(|r| r.ended_at);
        Ok(found)
    }
}
