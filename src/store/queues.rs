//! Queue entry storage
//!
//! Entries keep their place in line when refreshed; only the timestamp
//! used for idle expiry moves.

use crate::error::{MatchmakingError, Result};
use crate::types::{PlayerId, QueueEntry, QueueKind};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::RwLock;

/// Trait for queue entry operations
pub trait QueueStore: Send + Sync {
    /// Find a player's entry in one queue
    fn find(&self, player_id: PlayerId, queue: QueueKind) -> Result<Option<QueueEntry>>;

    /// Append an entry and return the new size of its queue
    fn insert(&self, entry: QueueEntry) -> Result<usize>;

    /// Move an entry's timestamp forward; `false` if it is not queued
    fn refresh(&self, player_id: PlayerId, queue: QueueKind, now: DateTime<Utc>) -> Result<bool>;

    /// Remove one entry; `false` if it was not there
    fn remove(&self, player_id: PlayerId, queue: QueueKind) -> Result<bool>;

    /// Remove a player from every queue, returning the queues they left
    fn remove_all(&self, player_id: PlayerId) -> Result<Vec<QueueKind>>;

    /// Remove several players from every queue
    fn remove_players(&self, player_ids: &[PlayerId]) -> Result<usize>;

    /// Entries of one queue in line order
    fn entries(&self, queue: QueueKind) -> Result<Vec<QueueEntry>>;

    fn count(&self, queue: QueueKind) -> Result<usize>;

    /// Entries of every queue whose timestamp is older than `cutoff`
    fn stale(&self, cutoff: DateTime<Utc>) -> Result<Vec<QueueEntry>>;

    /// Remove the entry only if it is still older than `cutoff`
    fn remove_if_stale(
        &self,
        player_id: PlayerId,
        queue: QueueKind,
        cutoff: DateTime<Utc>,
    ) -> Result<Option<QueueEntry>>;

    /// Atomically remove and return the first `n` entries of a queue
    ///
    /// Fails with `QueueNotFull` and removes nothing when fewer are waiting.
    fn take_first(&self, queue: QueueKind, n: usize) -> Result<Vec<QueueEntry>>;

    /// Put entries back at the front of their queue in the given order,
    /// skipping players who queued again in the meantime
    fn restore(&self, entries: Vec<QueueEntry>) -> Result<()>;
}

/// In-memory queue storage
#[derive(Debug, Default)]
pub struct InMemoryQueueStore {
    queues: RwLock<HashMap<QueueKind, Vec<QueueEntry>>>,
}

impl InMemoryQueueStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl QueueStore for InMemoryQueueStore {
    fn find(&self, player_id: PlayerId, queue: QueueKind) -> Result<Option<QueueEntry>> {
        let queues = self
            .queues
            .read()
            .map_err(|_| MatchmakingError::lock_poisoned("queues read"))?;

        Ok(queues
            .get(&queue)
            .and_then(|entries| entries.iter().find(|e| e.player_id == player_id))
            .cloned())
    }

    fn insert(&self, entry: QueueEntry) -> Result<usize> {
        let mut queues = self
            .queues
            .write()
            .map_err(|_| MatchmakingError::lock_poisoned("queues write"))?;

        let entries = queues.entry(entry.queue).or_default();
        if !entries.iter().any(|e| e.player_id == entry.player_id) {
            entries.push(entry);
        }
        Ok(entries.len())
    }

    fn refresh(&self, player_id: PlayerId, queue: QueueKind, now: DateTime<Utc>) -> Result<bool> {
        let mut queues = self
            .queues
            .write()
            .map_err(|_| MatchmakingError::lock_poisoned("queues write"))?;

        match queues
            .get_mut(&queue)
            .and_then(|entries| entries.iter_mut().find(|e| e.player_id == player_id))
        {
            Some(entry) => {
                entry.enqueued_at = now;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn remove(&self, player_id: PlayerId, queue: QueueKind) -> Result<bool> {
        let mut queues = self
            .queues
            .write()
            .map_err(|_| MatchmakingError::lock_poisoned("queues write"))?;

        let Some(entries) = queues.get_mut(&queue) else {
            return Ok(false);
        };
        let before = entries.len();
        entries.retain(|e| e.player_id != player_id);
        Ok(entries.len() != before)
    }

    fn remove_all(&self, player_id: PlayerId) -> Result<Vec<QueueKind>> {
        let mut queues = self
            .queues
            .write()
            .map_err(|_| MatchmakingError::lock_poisoned("queues write"))?;

        let mut left = Vec::new();
        for (queue, entries) in queues.iter_mut() {
            let before = entries.len();
            entries.retain(|e| e.player_id != player_id);
            if entries.len() != before {
                left.push(*queue);
            }
        }
        left.sort();
        Ok(left)
    }

    fn remove_players(&self, player_ids: &[PlayerId]) -> Result<usize> {
        let mut queues = self
            .queues
            .write()
            .map_err(|_| MatchmakingError::lock_poisoned("queues write"))?;

        let mut removed = 0;
        for entries in queues.values_mut() {
            let before = entries.len();
            entries.retain(|e| !player_ids.contains(&e.player_id));
            removed += before - entries.len();
        }
        Ok(removed)
    }

    fn entries(&self, queue: QueueKind) -> Result<Vec<QueueEntry>> {
        let queues = self
            .queues
            .read()
            .map_err(|_| MatchmakingError::lock_poisoned("queues read"))?;

        Ok(queues.get(&queue).cloned().unwrap_or_default())
    }

    fn count(&self, queue: QueueKind) -> Result<usize> {
        let queues = self
            .queues
            .read()
            .map_err(|_| MatchmakingError::lock_poisoned("queues read"))?;

        Ok(queues.get(&queue).map(Vec::len).unwrap_or(0))
    }

    fn stale(&self, cutoff: DateTime<Utc>) -> Result<Vec<QueueEntry>> {
        let queues = self
            .queues
            .read()
            .map_err(|_| MatchmakingError::lock_poisoned("queues read"))?;

        Ok(queues
            .values()
            .flatten()
            .filter(|e| e.enqueued_at < cutoff)
            .cloned()
            .collect())
    }

    fn remove_if_stale(
        &self,
        player_id: PlayerId,
        queue: QueueKind,
        cutoff: DateTime<Utc>,
    ) -> Result<Option<QueueEntry>> {
        let mut queues = self
            .queues
            .write()
            .map_err(|_| MatchmakingError::lock_poisoned("queues write"))?;

        let Some(entries) = queues.get_mut(&queue) else {
            return Ok(None);
        };
        match entries
            .iter()
            .position(|e| e.player_id == player_id && e.enqueued_at < cutoff)
        {
            Some(index) => Ok(Some(entries.remove(index))),
            None => Ok(None),
        }
    }

    fn take_first(&self, queue: QueueKind, n: usize) -> Result<Vec<QueueEntry>> {
        let mut queues = self
            .queues
            .write()
            .map_err(|_| MatchmakingError::lock_poisoned("queues write"))?;

        let entries = queues.entry(queue).or_default();
        if entries.len() < n {
            return Err(MatchmakingError::QueueNotFull {
                queue,
                count: entries.len(),
                capacity: n,
            });
        }
        Ok(entries.drain(..n).collect())
    }

    fn restore(&self, restored: Vec<QueueEntry>) -> Result<()> {
        let mut queues = self
            .queues
            .write()
            .map_err(|_| MatchmakingError::lock_poisoned("queues write"))?;

        for entry in restored.into_iter().rev() {
            let entries = queues.entry(entry.queue).or_default();
            if !entries.iter().any(|e| e.player_id == entry.player_id) {
                entries.insert(0, entry);
            }
        }
        Ok(())
    }
}
