//! Queue admission and idle expiry
//!
//! The manager only tracks who is waiting. Reaching capacity is reported
//! through `AdmitResult::should_start`; forming the game is the caller's
//! job.

use crate::config::QueueSettings;
use crate::error::Result;
use crate::locks::KeyedLocks;
use crate::metrics::MetricsCollector;
use crate::notify::{MatchEvent, Notifier};
use crate::rating::SkillModel;
use crate::store::Stores;
use crate::types::{PlayerId, PlayerIdentity, QueueEntry, QueueKind, QueueSelector};
use crate::utils::seconds_until;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info};

/// Result of asking to join a queue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AdmitResult {
    /// Added; `count` is the new size of the queue
    Admitted { count: usize },
    /// Already waiting; the entry's idle timer was reset
    AlreadyQueued,
    AlreadyInGame,
    /// Re-queue delay still running
    Delayed { seconds: u64 },
}

impl AdmitResult {
    /// Whether this admission filled the queue
    pub fn should_start(&self, capacity: usize) -> bool {
        matches!(self, AdmitResult::Admitted { count } if *count >= capacity)
    }

    pub fn label(&self) -> &'static str {
        match self {
            AdmitResult::Admitted { .. } => "admitted",
            AdmitResult::AlreadyQueued => "already_queued",
            AdmitResult::AlreadyInGame => "already_in_game",
            AdmitResult::Delayed { .. } => "delayed",
        }
    }
}

/// Snapshot of one queue
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueStatus {
    pub queue: QueueKind,
    /// Entries in line order
    pub entries: Vec<QueueEntry>,
    pub count: usize,
    /// A game from this queue is drafting or in progress
    pub is_live: bool,
}

/// Tracks waiting players per queue
pub struct QueueManager {
    stores: Stores,
    model: Arc<dyn SkillModel>,
    settings: QueueSettings,
    player_locks: Arc<KeyedLocks<PlayerId>>,
    notifier: Notifier,
    metrics: Arc<MetricsCollector>,
}

impl QueueManager {
    pub fn new(
        stores: Stores,
        model: Arc<dyn SkillModel>,
        settings: QueueSettings,
        player_locks: Arc<KeyedLocks<PlayerId>>,
        notifier: Notifier,
        metrics: Arc<MetricsCollector>,
    ) -> Self {
        Self {
            stores,
            model,
            settings,
            player_locks,
            notifier,
            metrics,
        }
    }

    pub fn capacity(&self) -> usize {
        self.settings.capacity
    }

    /// Ask for `identity` to join `queue`
    ///
    /// Checks run in order: already in a game, already queued (refreshes
    /// the entry), re-queue delay unless `skip_delay`, then admission.
    pub async fn admit(
        &self,
        identity: &PlayerIdentity,
        queue: QueueKind,
        skip_delay: bool,
    ) -> Result<AdmitResult> {
        let _guard = self.player_locks.lock(&identity.id).await;
        let now = Utc::now();

        let player = self
            .stores
            .players
            .ensure(identity, self.model.initial_rating())?;

        let result = if self.stores.games.find_by_player(identity.id)?.is_some() {
            AdmitResult::AlreadyInGame
        } else if self.stores.queues.refresh(identity.id, queue, now)? {
            AdmitResult::AlreadyQueued
        } else if let Some(seconds) = player
            .delay_target
            .filter(|_| !skip_delay)
            .and_then(|target| seconds_until(target, now))
        {
            AdmitResult::Delayed { seconds }
        } else {
            let count = self.stores.queues.insert(QueueEntry {
                player_id: identity.id,
                name: identity.name.clone(),
                queue,
                enqueued_at: now,
            })?;

            self.metrics.set_players_waiting(queue, count);
            self.notifier.notify(MatchEvent::PlayerQueued {
                player_id: identity.id,
                name: identity.name.clone(),
                queue,
                count,
            });
            AdmitResult::Admitted { count }
        };

        self.metrics.record_admission(queue, result.label());
        info!(
            "Admission for player {} to {}: {:?}",
            identity.id, queue, result
        );
        Ok(result)
    }

    /// Remove a player from one queue or all of them
    ///
    /// Returns the queues the player actually left.
    pub async fn remove(&self, player_id: PlayerId, selector: QueueSelector) -> Result<Vec<QueueKind>> {
        let _guard = self.player_locks.lock(&player_id).await;

        let left = match selector {
            QueueSelector::Single(queue) => {
                if self.stores.queues.remove(player_id, queue)? {
                    vec![queue]
                } else {
                    vec![]
                }
            }
            QueueSelector::All => self.stores.queues.remove_all(player_id)?,
        };

        for queue in &left {
            self.metrics
                .set_players_waiting(*queue, self.stores.queues.count(*queue)?);
        }
        debug!("Player {} left queues {:?}", player_id, left);
        Ok(left)
    }

    /// Entries, size and liveness of one queue
    pub fn status(&self, queue: QueueKind) -> Result<QueueStatus> {
        let entries = self.stores.queues.entries(queue)?;
        let is_live = !self.stores.games.active(Some(queue))?.is_empty();

        Ok(QueueStatus {
            queue,
            count: entries.len(),
            entries,
            is_live,
        })
    }

    /// Size of every queue
    pub fn counts(&self) -> Result<BTreeMap<QueueKind, usize>> {
        QueueKind::ALL
            .iter()
            .map(|queue| Ok((*queue, self.stores.queues.count(*queue)?)))
            .collect()
    }

    /// Remove entries idle for longer than the configured threshold
    ///
    /// Each entry is re-checked under the player's lock right before it is
    /// deleted, so a concurrent re-add keeps the player queued.
    pub async fn sweep(&self, now: DateTime<Utc>) -> Result<Vec<QueueEntry>> {
        let cutoff = now - self.settings.idle_timeout();
        let candidates = self.stores.queues.stale(cutoff)?;

        let mut removed = Vec::new();
        for candidate in candidates {
            let _guard = self.player_locks.lock(&candidate.player_id).await;

            let Some(entry) =
                self.stores
                    .queues
                    .remove_if_stale(candidate.player_id, candidate.queue, cutoff)?
            else {
                continue;
            };

            info!(
                "Removed player {} from {} after idling",
                entry.player_id, entry.queue
            );
            self.metrics.record_entry_expired(entry.queue);
            self.metrics
                .set_players_waiting(entry.queue, self.stores.queues.count(entry.queue)?);
            self.notifier.notify(MatchEvent::QueueEntryExpired {
                player_id: entry.player_id,
                name: entry.name.clone(),
                queue: entry.queue,
            });
            removed.push(entry);
        }

        Ok(removed)
    }
}

impl std::fmt::Debug for QueueManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueueManager")
            .field("settings", &self.settings)
            .finish()
    }
}

/// Converts a queue name from the command layer, accepting "all"
pub fn parse_selector(name: &str) -> Result<QueueSelector> {
    if name.eq_ignore_ascii_case("all") {
        return Ok(QueueSelector::All);
    }
    name.parse().map(QueueSelector::Single)
}
