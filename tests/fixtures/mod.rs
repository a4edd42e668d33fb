//! Test fixtures and recording implementations for integration testing

#![allow(dead_code)]

use async_trait::async_trait;
use pug_room::config::AppConfig;
use pug_room::error::Result;
use pug_room::game::Game;
use pug_room::notify::{EventPublisher, MatchEvent};
use pug_room::store::Stores;
use pug_room::types::{PlayerId, PlayerIdentity, QueueKind};
use pug_room::Coordinator;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Event publisher that keeps every delivered event for inspection
#[derive(Debug, Default)]
pub struct RecordingPublisher {
    events: Arc<Mutex<Vec<MatchEvent>>>,
}

impl RecordingPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    /// All events delivered so far
    pub fn events(&self) -> Vec<MatchEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    /// Count delivered events of one kind
    pub fn count_events_of_kind(&self, kind: &str) -> usize {
        self.events()
            .iter()
            .filter(|event| event.kind() == kind)
            .count()
    }

    /// Wait until at least `count` events of `kind` arrived
    ///
    /// Delivery happens on a background task, so assertions on events must
    /// wait for it.
    pub async fn wait_for_events(&self, kind: &str, count: usize) -> bool {
        for _ in 0..100 {
            if self.count_events_of_kind(kind) >= count {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        false
    }
}

#[async_trait]
impl EventPublisher for RecordingPublisher {
    async fn publish(&self, event: MatchEvent) -> Result<()> {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
        Ok(())
    }
}

/// Coordinator over fresh in-memory stores with a recording publisher
pub fn create_test_system(seed: u64) -> (Coordinator, Arc<RecordingPublisher>) {
    create_test_system_with(AppConfig::default(), seed)
}

pub fn create_test_system_with(
    config: AppConfig,
    seed: u64,
) -> (Coordinator, Arc<RecordingPublisher>) {
    let publisher = Arc::new(RecordingPublisher::new());
    let coordinator =
        Coordinator::with_parts(config, Stores::in_memory(), publisher.clone(), Some(seed))
            .expect("Failed to create coordinator");
    (coordinator, publisher)
}

pub fn player(id: PlayerId) -> PlayerIdentity {
    PlayerIdentity::new(id, format!("player{}", id))
}

pub fn players(ids: std::ops::RangeInclusive<PlayerId>) -> Vec<PlayerIdentity> {
    ids.map(player).collect()
}

/// Admit every player in order and return the game the last admission formed
pub async fn fill_queue(
    coordinator: &Coordinator,
    queue: QueueKind,
    ids: std::ops::RangeInclusive<PlayerId>,
) -> Game {
    let mut formed = None;
    for identity in players(ids) {
        let admission = coordinator
            .admit(&identity, queue, false)
            .await
            .expect("admission failed");
        formed = admission.game;
    }
    formed.expect("queue did not form a game")
}

/// Captain id of one side of a game
pub fn captain(game: &Game, team: pug_room::types::Team) -> PlayerId {
    game.team(team)
        .captain()
        .expect("team has a captain")
        .id
}
