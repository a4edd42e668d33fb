//! Game lifecycle management
//!
//! This module owns every mutation of an active game: formation from a full
//! queue, captain drafts, shuffles, swaps, subs, map rerolls, cancellation
//! and finishing. Mutations of one game are serialized through a per-game
//! lock and validated completely before anything is written.
//!
//! Lock order is queue, then game, then players. Profile writes happen only
//! while the affected players' locks are held.

use crate::config::{AppConfig, GameSettings, ServerSettings};
use crate::error::{MatchmakingError, Result};
use crate::game::roster::{Game, TeamRoster};
use crate::game::server::pick_suggested_server;
use crate::locks::KeyedLocks;
use crate::maps::MapSelector;
use crate::metrics::MetricsCollector;
use crate::notify::{MatchEvent, Notifier};
use crate::rating::SkillModel;
use crate::store::Stores;
use crate::teams::{with_random_captains, DraftEngine, PickOutcome, RatedPlayer, TeamBalancer};
use crate::types::{
    DraftState, FinishedGameRecord, GameId, GameStatus, MessageRef, Outcome, Player,
    PlayerGameResult, PlayerId, PlayerIdentity, PlayerRating, QueueKind, Team,
};
use crate::utils::generate_game_id;
use chrono::Utc;
use rand::rngs::StdRng;
use rand::seq::index::sample;
use rand::SeedableRng;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::OwnedMutexGuard;
use tracing::{debug, info, warn};

/// How often a game lookup is retried when the player moved between the
/// lookup and acquiring the game lock
const LOOKUP_ATTEMPTS: usize = 3;

/// How often formation re-claims a queue that is still full after dropping
/// players who were seated elsewhere
const CLAIM_ATTEMPTS: usize = 3;

/// Settings the lifecycle manager needs
#[derive(Debug, Clone)]
pub struct LifecycleSettings {
    pub game: GameSettings,
    /// Players taken from a queue to form one game
    pub capacity: usize,
    pub requeue_delay: chrono::Duration,
    pub servers: ServerSettings,
}

impl From<&AppConfig> for LifecycleSettings {
    fn from(config: &AppConfig) -> Self {
        Self {
            game: config.game.clone(),
            capacity: config.queue.capacity,
            requeue_delay: config.queue.requeue_delay(),
            servers: config.servers.clone(),
        }
    }
}

impl Default for LifecycleSettings {
    fn default() -> Self {
        Self::from(&AppConfig::default())
    }
}

/// Owns active games and their transitions
pub struct GameManager {
    stores: Stores,
    model: Arc<dyn SkillModel>,
    balancer: TeamBalancer,
    drafts: DraftEngine,
    maps: MapSelector,
    settings: LifecycleSettings,
    game_locks: KeyedLocks<GameId>,
    queue_locks: KeyedLocks<QueueKind>,
    player_locks: Arc<KeyedLocks<PlayerId>>,
    rng: Mutex<StdRng>,
    notifier: Notifier,
    metrics: Arc<MetricsCollector>,
}

impl GameManager {
    /// Create a new game manager
    pub fn new(
        stores: Stores,
        model: Arc<dyn SkillModel>,
        maps: MapSelector,
        settings: LifecycleSettings,
        player_locks: Arc<KeyedLocks<PlayerId>>,
        notifier: Notifier,
        metrics: Arc<MetricsCollector>,
    ) -> Self {
        Self {
            balancer: TeamBalancer::new(model.clone(), settings.game.team_size),
            drafts: DraftEngine::default(),
            stores,
            model,
            maps,
            settings,
            game_locks: KeyedLocks::new(),
            queue_locks: KeyedLocks::new(),
            player_locks,
            rng: Mutex::new(StdRng::from_os_rng()),
            notifier,
            metrics,
        }
    }

    /// Replace the draft engine (and with it the pick order)
    pub fn with_draft_engine(mut self, drafts: DraftEngine) -> Self {
        self.drafts = drafts;
        self
    }

    /// Make captain, map and server choices reproducible
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = Mutex::new(StdRng::seed_from_u64(seed));
        self
    }

    pub fn settings(&self) -> &LifecycleSettings {
        &self.settings
    }

    fn with_rng<T>(&self, f: impl FnOnce(&mut StdRng) -> Result<T>) -> Result<T> {
        let mut rng = self
            .rng
            .lock()
            .map_err(|_| MatchmakingError::lock_poisoned("rng"))?;
        f(&mut rng)
    }

    /// Lock the game `player_id` is seated in and return its current state
    async fn lock_game_of(&self, player_id: PlayerId) -> Result<(OwnedMutexGuard<()>, Game)> {
        for _ in 0..LOOKUP_ATTEMPTS {
            let Some(game) = self.stores.games.find_by_player(player_id)? else {
                break;
            };

            let guard = self.game_locks.lock(&game.id).await;
            match self.stores.games.get(game.id)? {
                Some(current) if current.is_active() && current.contains(player_id) => {
                    return Ok((guard, current));
                }
                _ => debug!("Player {} moved while locking game {}", player_id, game.id),
            }
        }

        Err(MatchmakingError::NotInGame { player_id })
    }

    /// Profiles for every identity, creating any that are missing
    fn profiles_for(&self, identities: &[PlayerIdentity]) -> Result<HashMap<PlayerId, Player>> {
        let ids: Vec<PlayerId> = identities.iter().map(|p| p.id).collect();
        let mut profiles = self.stores.players.get_many(&ids)?;

        for identity in identities {
            if !profiles.contains_key(&identity.id) {
                let created = self
                    .stores
                    .players
                    .ensure(identity, self.model.initial_rating())?;
                profiles.insert(identity.id, created);
            }
        }
        Ok(profiles)
    }

    fn rating_of(&self, profiles: &HashMap<PlayerId, Player>, player_id: PlayerId) -> PlayerRating {
        profiles
            .get(&player_id)
            .map(|p| p.rating)
            .unwrap_or_else(|| self.model.initial_rating())
    }

    fn rated_roster(
        &self,
        identities: &[PlayerIdentity],
        profiles: &HashMap<PlayerId, Player>,
    ) -> Vec<RatedPlayer> {
        identities
            .iter()
            .map(|identity| {
                RatedPlayer::new(identity.clone(), self.rating_of(profiles, identity.id))
            })
            .collect()
    }

    fn save_preserving_draft(&self, game: Game) -> Result<()> {
        let draft = self.stores.games.draft(game.id)?;
        self.stores.games.save(game, draft)
    }

    /// Take the first `capacity` entries of a queue and lock their players
    ///
    /// Players seated in another game meanwhile are dropped from the queue
    /// and the rest go back to the front. If the queue is still full after
    /// that, the claim is retried.
    async fn claim_roster(
        &self,
        queue: QueueKind,
    ) -> Result<(Vec<PlayerIdentity>, Vec<OwnedMutexGuard<()>>)> {
        let capacity = self.settings.capacity;

        for _ in 0..CLAIM_ATTEMPTS {
            let entries = self.stores.queues.take_first(queue, capacity)?;
            let ids: Vec<PlayerId> = entries.iter().map(|e| e.player_id).collect();
            let guards = self.player_locks.lock_many(&ids).await;

            let mut busy = Vec::new();
            for id in &ids {
                if self.stores.games.find_by_player(*id)?.is_some() {
                    busy.push(*id);
                }
            }

            if busy.is_empty() {
                let identities = entries
                    .into_iter()
                    .map(|e| PlayerIdentity::new(e.player_id, e.name))
                    .collect();
                return Ok((identities, guards));
            }

            warn!(
                "Players {:?} were seated elsewhere while forming a {} game",
                busy, queue
            );
            let free = entries
                .into_iter()
                .filter(|e| !busy.contains(&e.player_id))
                .collect();
            // Free entries go back while their players are still locked
            self.stores.queues.restore(free)?;
            drop(guards);

            if self.stores.queues.count(queue)? < capacity {
                break;
            }
        }

        Err(MatchmakingError::QueueNotFull {
            queue,
            count: self.stores.queues.count(queue)?,
            capacity,
        })
    }

    /// Form a game from a full queue
    ///
    /// Balanced queues get a STARTED game with the best partition. Draft
    /// queues get a PENDING game with captains chosen and everyone else
    /// unassigned.
    pub async fn form_teams(&self, queue: QueueKind) -> Result<Game> {
        if queue.uses_draft() {
            return self.start_draft(queue).await.map(|(game, _)| game);
        }

        let _queue_guard = self.queue_locks.lock(&queue).await;
        let (identities, _player_guards) = self.claim_roster(queue).await?;
        let profiles = self.profiles_for(&identities)?;
        let roster = self.rated_roster(&identities, &profiles);
        let regions: Vec<_> = profiles.values().map(|p| p.region).collect();

        let timer = self.metrics.start_timer();
        let selection = self.balancer.select(&roster, 0)?;
        self.metrics.record_balancing(timer.stop());

        let now = Utc::now();
        let (team_one, team_two, maps, server) = self.with_rng(|rng| {
            let (one, two) = with_random_captains(&selection.partition, rng);
            let maps = self
                .maps
                .select(self.settings.game.balanced_map_count, &[], rng)?;
            let server = pick_suggested_server(&regions, now, &self.settings.servers, rng);
            Ok((one, two, maps, server))
        })?;

        let game = Game {
            id: generate_game_id(),
            queue,
            status: GameStatus::Started,
            maps,
            started_at: Some(now),
            ended_at: None,
            reshuffles: selection.rank + 1,
            server,
            team_one,
            team_two,
            unassigned: Vec::new(),
        };

        let ids = game.player_ids();
        self.stores.games.save(game.clone(), None)?;
        self.stores.queues.remove_players(&ids)?;

        let quality = selection.partition.quality;
        self.metrics.record_game_formed(queue, Some(quality));
        self.metrics
            .set_players_waiting(queue, self.stores.queues.count(queue)?);
        info!(
            "Formed {} game {} with quality {:.3} on {:?}",
            queue, game.id, quality, game.maps
        );
        self.notifier.notify(MatchEvent::GameStarted {
            game: game.clone(),
            quality,
        });

        Ok(game)
    }

    /// Form a drafting game from a full queue
    pub async fn start_draft(&self, queue: QueueKind) -> Result<(Game, DraftState)> {
        let _queue_guard = self.queue_locks.lock(&queue).await;
        let (identities, _player_guards) = self.claim_roster(queue).await?;
        let profiles = self.profiles_for(&identities)?;
        let regions: Vec<_> = profiles.values().map(|p| p.region).collect();

        if identities.len() < 2 {
            return Err(MatchmakingError::InvalidRequest {
                reason: "A draft needs at least two players".to_string(),
            });
        }

        let now = Utc::now();
        let (first, second, maps, server) = self.with_rng(|rng| {
            let captains = sample(rng, identities.len(), 2);
            let (first, second) = (captains.index(0), captains.index(1));
            let maps = self
                .maps
                .select(self.settings.game.draft_map_count, &[], rng)?;
            let server = pick_suggested_server(&regions, now, &self.settings.servers, rng);
            Ok((first, second, maps, server))
        })?;

        let unassigned = identities
            .iter()
            .enumerate()
            .filter(|(index, _)| *index != first && *index != second)
            .map(|(_, identity)| identity.clone())
            .collect();

        let game = Game {
            id: generate_game_id(),
            queue,
            status: GameStatus::Pending,
            maps,
            started_at: None,
            ended_at: None,
            reshuffles: 0,
            server,
            team_one: TeamRoster::new(vec![identities[first].clone()], Some(0)),
            team_two: TeamRoster::new(vec![identities[second].clone()], Some(0)),
            unassigned,
        };
        let draft = self.drafts.begin(&game);

        let ids = game.player_ids();
        self.stores.games.save(game.clone(), Some(draft.clone()))?;
        self.stores.queues.remove_players(&ids)?;

        self.metrics.record_game_formed(queue, None);
        self.metrics
            .set_players_waiting(queue, self.stores.queues.count(queue)?);
        info!(
            "Started draft for {} game {}, captains {} and {}",
            queue, game.id, identities[first].id, identities[second].id
        );
        self.notifier.notify(MatchEvent::DraftStarted {
            game: game.clone(),
            draft: draft.clone(),
        });

        Ok((game, draft))
    }

    /// Apply a captain's draft pick
    pub async fn pick(&self, captain: PlayerId, picks: &[PlayerId]) -> Result<PickOutcome> {
        let (_guard, game) = self.lock_game_of(captain).await?;
        let draft = self.stores.games.draft(game.id)?;

        let outcome = self
            .drafts
            .pick(&game, draft.as_ref(), captain, picks, Utc::now())?;
        self.stores
            .games
            .save(outcome.game.clone(), outcome.draft.clone())?;

        self.metrics.record_draft_pick();
        match &outcome.draft {
            Some(next) => debug!(
                "Game {} draft: team {} to pick {}",
                game.id, next.team_to_pick, next.picks_required
            ),
            None => info!("Draft complete, game {} started", game.id),
        }
        self.notifier.notify(MatchEvent::DraftUpdated {
            game: outcome.game.clone(),
            draft: outcome.draft.clone(),
        });

        Ok(outcome)
    }

    /// Store the captain message references shown for a draft
    pub async fn update_draft_messages(
        &self,
        game_id: GameId,
        messages: HashMap<PlayerId, MessageRef>,
    ) -> Result<DraftState> {
        let _guard = self.game_locks.lock(&game_id).await;

        let game = self
            .stores
            .games
            .get(game_id)?
            .ok_or(MatchmakingError::GameNotFound { game_id })?;
        let mut draft = self
            .stores
            .games
            .draft(game_id)?
            .ok_or(MatchmakingError::DraftAlreadyComplete { game_id })?;

        draft.messages = messages;
        self.stores.games.save(game, Some(draft.clone()))?;
        Ok(draft)
    }

    /// Re-form teams at the next partition rank
    pub async fn shuffle(&self, player_id: PlayerId) -> Result<Game> {
        let (_guard, mut game) = self.lock_game_of(player_id).await?;

        if !game.is_captain(player_id) {
            return Err(MatchmakingError::NotCaptain { player_id });
        }
        if game.is_drafting() {
            return Err(MatchmakingError::DraftInProgress { game_id: game.id });
        }
        let limit = self.settings.game.shuffle_limit;
        if game.reshuffles >= limit {
            return Err(MatchmakingError::TooManyShuffles { limit });
        }

        let identities = game.participants();
        let profiles = self.profiles_for(&identities)?;
        let roster = self.rated_roster(&identities, &profiles);

        let timer = self.metrics.start_timer();
        let selection = self.balancer.select(&roster, game.reshuffles)?;
        self.metrics.record_balancing(timer.stop());

        let (team_one, team_two) =
            self.with_rng(|rng| Ok(with_random_captains(&selection.partition, rng)))?;
        game.team_one = team_one;
        game.team_two = team_two;
        game.reshuffles += 1;

        self.stores.games.save(game.clone(), None)?;

        let quality = selection.partition.quality;
        self.metrics.record_shuffle(quality, selection.wrapped);
        info!(
            "Shuffled game {} to rank {} (quality {:.3})",
            game.id, selection.rank, quality
        );
        self.notifier.notify(MatchEvent::TeamsShuffled {
            game: game.clone(),
            quality,
        });

        Ok(game)
    }

    /// Exchange the seats of two players, in one game or across two
    ///
    /// Captaincy stays with the seat.
    pub async fn swap(&self, first: PlayerId, second: PlayerId) -> Result<Vec<GameId>> {
        if first == second {
            return Err(MatchmakingError::InvalidRequest {
                reason: "Cannot swap a player with themselves".to_string(),
            });
        }

        for _ in 0..LOOKUP_ATTEMPTS {
            let first_game = self
                .stores
                .games
                .find_by_player(first)?
                .ok_or(MatchmakingError::NotInGame { player_id: first })?;
            let second_game = self
                .stores
                .games
                .find_by_player(second)?
                .ok_or(MatchmakingError::NotInGame { player_id: second })?;

            let _guards = self
                .game_locks
                .lock_many(&[first_game.id, second_game.id])
                .await;

            let current_first = self
                .stores
                .games
                .get(first_game.id)?
                .filter(|g| g.contains(first));
            let current_second = self
                .stores
                .games
                .get(second_game.id)?
                .filter(|g| g.contains(second));
            let (Some(mut game_a), Some(mut game_b)) = (current_first, current_second) else {
                continue;
            };

            let seat_a = game_a
                .seat_of(first)
                .ok_or(MatchmakingError::NotInGame { player_id: first })?;
            let seat_b = game_b
                .seat_of(second)
                .ok_or(MatchmakingError::NotInGame { player_id: second })?;
            let identity_a = game_a
                .occupant(seat_a)
                .cloned()
                .ok_or(MatchmakingError::NotInGame { player_id: first })?;
            let identity_b = game_b
                .occupant(seat_b)
                .cloned()
                .ok_or(MatchmakingError::NotInGame { player_id: second })?;

            let games = if game_a.id == game_b.id {
                game_a.replace_occupant(seat_a, identity_b);
                game_a.replace_occupant(seat_b, identity_a);
                let ids = vec![game_a.id];
                self.save_preserving_draft(game_a)?;
                ids
            } else {
                game_a.replace_occupant(seat_a, identity_b);
                game_b.replace_occupant(seat_b, identity_a);
                let ids = vec![game_a.id, game_b.id];
                self.save_preserving_draft(game_a)?;
                self.save_preserving_draft(game_b)?;
                ids
            };

            info!("Swapped players {} and {} in {:?}", first, second, games);
            self.notifier.notify(MatchEvent::PlayersSwapped {
                first,
                second,
                games: games.clone(),
            });
            return Ok(games);
        }

        Err(MatchmakingError::NotInGame { player_id: first })
    }

    /// Put `requester` into `target`'s seat
    pub async fn sub(&self, requester: &PlayerIdentity, target: PlayerId) -> Result<Game> {
        if self.stores.games.find_by_player(requester.id)?.is_some() {
            return Err(MatchmakingError::AlreadyInGame {
                player_id: requester.id,
            });
        }

        let (_game_guard, mut game) = self.lock_game_of(target).await?;
        let _player_guard = self.player_locks.lock(&requester.id).await;

        if self.stores.games.find_by_player(requester.id)?.is_some() {
            return Err(MatchmakingError::AlreadyInGame {
                player_id: requester.id,
            });
        }
        if game.is_drafting() {
            return Err(MatchmakingError::DraftInProgress { game_id: game.id });
        }
        let seat = game
            .seat_of(target)
            .ok_or(MatchmakingError::NotInGame { player_id: target })?;

        self.stores
            .players
            .ensure(requester, self.model.initial_rating())?;
        game.replace_occupant(seat, requester.clone());
        self.stores.games.save(game.clone(), None)?;
        let left = self.stores.queues.remove_all(requester.id)?;

        info!(
            "Player {} subbed in for {} in game {} (left queues {:?})",
            requester.id, target, game.id, left
        );
        self.notifier.notify(MatchEvent::PlayerSubbed {
            game_id: game.id,
            requester: requester.id,
            target,
        });

        Ok(game)
    }

    /// Delete the player's game and any draft state with it
    pub async fn cancel(&self, player_id: PlayerId) -> Result<Game> {
        let (_guard, game) = self.lock_game_of(player_id).await?;

        if game.status == GameStatus::Finished {
            return Err(MatchmakingError::InvalidRequest {
                reason: "Finished games cannot be cancelled".to_string(),
            });
        }

        let (removed, _draft) = self
            .stores
            .games
            .remove(game.id)?
            .ok_or(MatchmakingError::GameNotFound { game_id: game.id })?;

        self.metrics.record_game_cancelled();
        info!("Game {} cancelled by player {}", removed.id, player_id);
        self.notifier.notify(MatchEvent::GameCancelled {
            game_id: removed.id,
            cancelled_by: player_id,
        });

        Ok(removed)
    }

    /// Record the result reported by `player_id` for their own team
    pub async fn finish(&self, player_id: PlayerId, outcome: Outcome) -> Result<FinishedGameRecord> {
        let (_guard, game) = self.lock_game_of(player_id).await?;

        if game.is_drafting() {
            return Err(MatchmakingError::DraftInProgress { game_id: game.id });
        }
        let team = game
            .team_of(player_id)
            .ok_or(MatchmakingError::NotInGame { player_id })?;

        let tie = outcome == Outcome::Tie;
        let winning = match outcome {
            Outcome::Win | Outcome::Tie => team,
            Outcome::Loss => team.other(),
        };
        let outcome_for = |side: Team| {
            if tie {
                Outcome::Tie
            } else if side == winning {
                Outcome::Win
            } else {
                Outcome::Loss
            }
        };

        let _player_guards = self.player_locks.lock_many(&game.player_ids()).await;
        let mut profiles = self.profiles_for(&game.participants())?;
        let side = |roster: &TeamRoster| -> Vec<(PlayerId, PlayerRating)> {
            roster
                .slots
                .iter()
                .map(|p| (p.id, self.rating_of(&profiles, p.id)))
                .collect()
        };
        let first = side(game.team(winning));
        let second = side(game.team(winning.other()));

        let timer = self.metrics.start_timer();
        let update = self.model.rate(&first, &second, tie)?;
        self.metrics.record_rating_update(timer.stop());

        let now = Utc::now();
        let mut results = Vec::new();
        for side in [Team::One, Team::Two] {
            for identity in &game.team(side).slots {
                results.push(PlayerGameResult {
                    player_id: identity.id,
                    name: identity.name.clone(),
                    team: side,
                    outcome: outcome_for(side),
                });
            }
        }

        for change in &update.changes {
            if let Some(profile) = profiles.get_mut(&change.player_id) {
                profile.rating = change.new_rating;
            }
        }
        for result in &results {
            if let Some(profile) = profiles.get_mut(&result.player_id) {
                profile.record_game(result.outcome, now, self.settings.requeue_delay);
            }
        }

        let record = FinishedGameRecord {
            game_id: game.id,
            queue: game.queue,
            maps: game.maps.clone(),
            started_at: game.started_at,
            ended_at: now,
            results,
        };

        self.stores
            .players
            .save_many(profiles.into_values().collect())?;
        self.stores.results.append(record.clone())?;
        self.stores.games.remove(game.id)?;

        self.metrics.record_game_finished(tie);
        info!(
            "Game {} finished: team {} reported {:?}",
            game.id, team, outcome
        );
        self.notifier.notify(MatchEvent::GameFinished {
            record: record.clone(),
            rating_changes: update.changes,
        });

        Ok(record)
    }

    /// Reverse a recorded win/loss
    ///
    /// Outcomes and counters swap, and a fresh rating update is applied with
    /// the sides reversed. That second update is not an exact inverse of the
    /// first.
    pub async fn flip_results(&self, game_id: GameId) -> Result<FinishedGameRecord> {
        let _guard = self.game_locks.lock(&game_id).await;

        let mut record = self
            .stores
            .results
            .get(game_id)?
            .ok_or(MatchmakingError::GameNotFound { game_id })?;
        if record.is_tie() {
            return Err(MatchmakingError::TieNotReversible { game_id });
        }

        let identities: Vec<PlayerIdentity> = record
            .results
            .iter()
            .map(|r| PlayerIdentity::new(r.player_id, r.name.clone()))
            .collect();
        let ids: Vec<PlayerId> = identities.iter().map(|p| p.id).collect();
        let _player_guards = self.player_locks.lock_many(&ids).await;
        let mut profiles = self.profiles_for(&identities)?;

        let side = |ids: Vec<PlayerId>| -> Vec<(PlayerId, PlayerRating)> {
            ids.into_iter()
                .map(|id| (id, self.rating_of(&profiles, id)))
                .collect()
        };
        let new_winners = side(record.player_ids_with(Outcome::Loss));
        let new_losers = side(record.player_ids_with(Outcome::Win));

        let update = self.model.rate(&new_winners, &new_losers, false)?;

        for change in &update.changes {
            if let Some(profile) = profiles.get_mut(&change.player_id) {
                profile.rating = change.new_rating;
            }
        }
        for result in record.results.iter_mut() {
            let flipped = result.outcome.reversed();
            if let Some(profile) = profiles.get_mut(&result.player_id) {
                profile.reassign_outcome(result.outcome, flipped);
            }
            result.outcome = flipped;
        }

        self.stores
            .players
            .save_many(profiles.into_values().collect())?;
        self.stores.results.update(record.clone())?;

        self.metrics.record_results_flipped();
        info!("Flipped results of game {}", game_id);
        self.notifier.notify(MatchEvent::ResultsFlipped {
            record: record.clone(),
        });

        Ok(record)
    }

    /// Reroll one map, numbered from 1
    pub async fn remap_single_slot(&self, player_id: PlayerId, map_number: usize) -> Result<Vec<String>> {
        let (_guard, mut game) = self.lock_game_of(player_id).await?;

        if !game.is_captain(player_id) {
            return Err(MatchmakingError::NotCaptain { player_id });
        }
        if map_number == 0 || map_number > game.maps.len() {
            return Err(MatchmakingError::InvalidMapNumber {
                map_number,
                available: game.maps.len(),
            });
        }

        let maps = self.with_rng(|rng| self.maps.reroll_slot(&game.maps, map_number - 1, rng))?;
        game.maps = maps.clone();
        let game_id = game.id;
        self.save_preserving_draft(game)?;

        info!("Map {} of game {} rerolled: {:?}", map_number, game_id, maps);
        self.notifier.notify(MatchEvent::MapsUpdated {
            game_id,
            maps: maps.clone(),
        });
        Ok(maps)
    }

    /// Reroll every map of the player's game
    pub async fn reroll_maps(&self, player_id: PlayerId) -> Result<Vec<String>> {
        let (_guard, mut game) = self.lock_game_of(player_id).await?;

        if !game.is_captain(player_id) {
            return Err(MatchmakingError::NotCaptain { player_id });
        }

        let count = game.maps.len();
        let maps = self.with_rng(|rng| self.maps.select(count, &[], rng))?;
        game.maps = maps.clone();
        let game_id = game.id;
        self.save_preserving_draft(game)?;

        info!("Maps of game {} rerolled: {:?}", game_id, maps);
        self.notifier.notify(MatchEvent::MapsUpdated {
            game_id,
            maps: maps.clone(),
        });
        Ok(maps)
    }

    /// The active game a player is in, if any
    pub fn game_for_player(&self, player_id: PlayerId) -> Result<Option<Game>> {
        self.stores.games.find_by_player(player_id)
    }

    pub fn game(&self, game_id: GameId) -> Result<Option<Game>> {
        self.stores.games.get(game_id)
    }

    pub fn draft_state(&self, game_id: GameId) -> Result<Option<DraftState>> {
        self.stores.games.draft(game_id)
    }

    /// Active games, optionally for one queue only
    pub fn active_games(&self, queue: Option<QueueKind>) -> Result<Vec<Game>> {
        self.stores.games.active(queue)
    }
}

impl std::fmt::Debug for GameManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GameManager")
            .field("settings", &self.settings)
            .finish()
    }
}
