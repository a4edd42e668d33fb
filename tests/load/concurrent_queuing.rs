//! Concurrent admission and profile update tests
//!
//! Many operations race through the coordinator at once. The per-player and
//! per-queue locks must keep every player in at most one place, and no
//! profile write may overwrite another.

use futures::future::join_all;
use pug_room::types::{Outcome, PlayerId, QueueKind, Region, Team};
use pug_room::AdmitResult;
use std::collections::HashSet;
use std::sync::Arc;

use crate::fixtures::{captain, create_test_system, fill_queue, player};

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_same_player_admitted_once() {
    let (coordinator, _publisher) = create_test_system(31);
    let coordinator = Arc::new(coordinator);

    let attempts = (0..20).map(|_| {
        let coordinator = coordinator.clone();
        tokio::spawn(async move {
            coordinator
                .admit(&player(7), QueueKind::Quickplay, false)
                .await
        })
    });

    let results: Vec<AdmitResult> = join_all(attempts)
        .await
        .into_iter()
        .map(|joined| joined.unwrap().unwrap().result)
        .collect();

    let admitted = results
        .iter()
        .filter(|r| matches!(r, AdmitResult::Admitted { .. }))
        .count();
    assert_eq!(admitted, 1);
    assert_eq!(
        results
            .iter()
            .filter(|r| **r == AdmitResult::AlreadyQueued)
            .count(),
        19
    );
    assert_eq!(
        coordinator.queues().status(QueueKind::Quickplay).unwrap().count,
        1
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_hundred_players_never_share_a_game() {
    let (coordinator, _publisher) = create_test_system(32);
    let coordinator = Arc::new(coordinator);

    let admissions = (1..=100).map(|id: PlayerId| {
        let coordinator = coordinator.clone();
        tokio::spawn(async move {
            coordinator
                .admit(&player(id), QueueKind::Quickplay, false)
                .await
        })
    });

    let formed: Vec<_> = join_all(admissions)
        .await
        .into_iter()
        .filter_map(|joined| joined.unwrap().unwrap().game)
        .collect();

    // Players admitted after a lost formation race can remain queued
    let games = coordinator.games().active_games(Some(QueueKind::Quickplay)).unwrap();
    let waiting = coordinator.queues().status(QueueKind::Quickplay).unwrap().count;
    assert_eq!(games.len() * 10 + waiting, 100);
    assert_eq!(formed.len(), games.len());

    let mut seen = HashSet::new();
    for game in &games {
        assert_eq!(game.player_ids().len(), 10);
        for id in game.player_ids() {
            assert!(seen.insert(id), "player {} is in two games", id);
        }
    }

    let queued: HashSet<PlayerId> = coordinator
        .queues()
        .status(QueueKind::Quickplay)
        .unwrap()
        .entries
        .iter()
        .map(|e| e.player_id)
        .collect();
    assert!(queued.is_disjoint(&seen));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_parallel_queues_do_not_share_players() {
    let (coordinator, _publisher) = create_test_system(33);
    let coordinator = Arc::new(coordinator);

    // Every player joins two queues at once
    let admissions = (1..=10).flat_map(|id: PlayerId| {
        [QueueKind::Quickplay, QueueKind::Newbloods]
            .into_iter()
            .map(move |queue| (id, queue))
    });
    let tasks = admissions.map(|(id, queue)| {
        let coordinator = coordinator.clone();
        tokio::spawn(async move { coordinator.admit(&player(id), queue, false).await })
    });
    join_all(tasks).await;

    let games = coordinator.games().active_games(None).unwrap();
    assert_eq!(games.len(), 1);

    let counts = coordinator.queues().counts().unwrap();
    assert_eq!(counts[&QueueKind::Quickplay], 0);
    assert_eq!(counts[&QueueKind::Newbloods], 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_region_change_during_finish_is_kept() {
    for round in 0..100u64 {
        let (coordinator, _publisher) = create_test_system(100 + round);
        let coordinator = Arc::new(coordinator);
        let game = fill_queue(&coordinator, QueueKind::Quickplay, 1..=10).await;
        let reporter = captain(&game, Team::One);
        let editor = game.team_two.slots[0].id;

        let finishing = {
            let coordinator = coordinator.clone();
            tokio::spawn(async move { coordinator.games().finish(reporter, Outcome::Win).await })
        };
        let editing = {
            let coordinator = coordinator.clone();
            tokio::spawn(async move {
                coordinator
                    .history()
                    .set_region(editor, Region::Europe)
                    .await
            })
        };
        finishing.await.unwrap().unwrap();
        editing.await.unwrap().unwrap();

        let profile = coordinator.stores().players.get(editor).unwrap().unwrap();
        assert_eq!(profile.region, Region::Europe, "round {}", round);
        assert_eq!(profile.games_played, 1, "round {}", round);
        assert_eq!(profile.losses, 1, "round {}", round);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_flip_during_next_finish_keeps_both() {
    for round in 0..50u64 {
        let (coordinator, _publisher) = create_test_system(500 + round);
        let coordinator = Arc::new(coordinator);

        let earlier = fill_queue(&coordinator, QueueKind::Quickplay, 1..=10).await;
        let first_winners = earlier.team_one.player_ids();
        coordinator
            .games()
            .finish(captain(&earlier, Team::One), Outcome::Win)
            .await
            .unwrap();

        let mut current = None;
        for id in 1..=10 {
            current = coordinator
                .admit(&player(id), QueueKind::Quickplay, true)
                .await
                .unwrap()
                .game;
        }
        let current = current.expect("second game should form");
        let reporter = captain(&current, Team::Two);

        let flipping = {
            let coordinator = coordinator.clone();
            tokio::spawn(async move { coordinator.games().flip_results(earlier.id).await })
        };
        let finishing = {
            let coordinator = coordinator.clone();
            tokio::spawn(async move { coordinator.games().finish(reporter, Outcome::Tie).await })
        };
        flipping.await.unwrap().unwrap();
        finishing.await.unwrap().unwrap();

        for id in 1..=10 {
            let profile = coordinator.stores().players.get(id).unwrap().unwrap();
            assert_eq!(profile.games_played, 2, "round {} player {}", round, id);
            assert_eq!(profile.ties, 1, "round {} player {}", round, id);
            assert_eq!(profile.wins + profile.losses, 1, "round {} player {}", round, id);
            if first_winners.contains(&id) {
                assert_eq!(profile.losses, 1, "round {} player {}", round, id);
            }
        }
    }
}
