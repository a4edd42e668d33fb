//! Game lifecycle integration tests
//!
//! Shuffles, swaps, subs, cancellation, finishing and result flips against
//! games formed through real queue admission.

use chrono::{Duration, Utc};
use pug_room::error::MatchmakingError;
use pug_room::game::Game;
use pug_room::types::{GameStatus, Outcome, PlayerId, QueueKind, QueueSelector, Team};
use pug_room::AdmitResult;
use std::collections::{BTreeSet, HashMap, HashSet};

use crate::fixtures::{captain, create_test_system, fill_queue, player};

/// The unordered pair of teams a game currently has
fn partition_key(game: &Game) -> BTreeSet<BTreeSet<PlayerId>> {
    [&game.team_one, &game.team_two]
        .into_iter()
        .map(|team| team.player_ids().into_iter().collect())
        .collect()
}

#[tokio::test]
async fn test_shuffles_never_repeat_a_partition() {
    let (coordinator, publisher) = create_test_system(3);
    let mut game = fill_queue(&coordinator, QueueKind::Quickplay, 1..=10).await;
    let games = coordinator.games();

    let mut seen = HashSet::new();
    seen.insert(partition_key(&game));

    for expected in 2..=4 {
        game = games.shuffle(captain(&game, Team::Two)).await.unwrap();
        assert_eq!(game.reshuffles, expected);
        assert!(seen.insert(partition_key(&game)), "partition repeated");

        let ids: HashSet<_> = game.player_ids().into_iter().collect();
        assert_eq!(ids.len(), 10);
        assert!(game.team_one.captain().is_some());
        assert!(game.team_two.captain().is_some());
    }

    let err = games.shuffle(captain(&game, Team::One)).await.unwrap_err();
    assert_eq!(err, MatchmakingError::TooManyShuffles { limit: 4 });
    assert!(publisher.wait_for_events("TeamsShuffled", 3).await);
}

#[tokio::test]
async fn test_shuffle_uses_current_roster() {
    let (coordinator, _publisher) = create_test_system(4);
    let game = fill_queue(&coordinator, QueueKind::Quickplay, 1..=10).await;
    let games = coordinator.games();

    let target = game.team_two.slots[1].id;
    games.sub(&player(11), target).await.unwrap();

    let current = games.game_for_player(11).unwrap().unwrap();
    let shuffled = games.shuffle(captain(&current, Team::One)).await.unwrap();
    assert!(shuffled.contains(11));
    assert!(!shuffled.contains(target));
}

#[tokio::test]
async fn test_swap_keeps_captaincy_with_the_slot() {
    let (coordinator, publisher) = create_test_system(5);
    let game = fill_queue(&coordinator, QueueKind::Quickplay, 1..=10).await;
    let games = coordinator.games();

    let old_captain = captain(&game, Team::One);
    let other = game
        .team_two
        .slots
        .iter()
        .map(|p| p.id)
        .find(|id| !game.is_captain(*id))
        .unwrap();

    let changed = games.swap(old_captain, other).await.unwrap();
    assert_eq!(changed, vec![game.id]);

    let swapped = games.game(game.id).unwrap().unwrap();
    assert_eq!(swapped.team_of(other), Some(Team::One));
    assert_eq!(swapped.team_of(old_captain), Some(Team::Two));
    assert!(swapped.is_captain(other));
    assert!(!swapped.is_captain(old_captain));
    assert_eq!(swapped.team_one.len(), 5);
    assert!(publisher.wait_for_events("PlayersSwapped", 1).await);

    let err = games.swap(other, 99).await.unwrap_err();
    assert_eq!(err, MatchmakingError::NotInGame { player_id: 99 });
    let err = games.swap(other, other).await.unwrap_err();
    assert!(matches!(err, MatchmakingError::InvalidRequest { .. }));
}

#[tokio::test]
async fn test_swap_across_games() {
    let (coordinator, _publisher) = create_test_system(6);
    let first = fill_queue(&coordinator, QueueKind::Quickplay, 1..=10).await;
    let second = fill_queue(&coordinator, QueueKind::Newbloods, 11..=20).await;
    let games = coordinator.games();

    let changed = games.swap(1, 11).await.unwrap();
    assert_eq!(changed.len(), 2);

    assert_eq!(games.game_for_player(1).unwrap().unwrap().id, second.id);
    assert_eq!(games.game_for_player(11).unwrap().unwrap().id, first.id);
}

#[tokio::test]
async fn test_sub_rules() {
    let (coordinator, publisher) = create_test_system(7);
    let game = fill_queue(&coordinator, QueueKind::Quickplay, 1..=10).await;
    let games = coordinator.games();

    // Requester already playing
    let err = games.sub(&player(2), 3).await.unwrap_err();
    assert_eq!(err, MatchmakingError::AlreadyInGame { player_id: 2 });

    // Target not playing
    let err = games.sub(&player(11), 12).await.unwrap_err();
    assert_eq!(err, MatchmakingError::NotInGame { player_id: 12 });

    // A queued requester leaves every queue when subbing in
    coordinator
        .admit(&player(11), QueueKind::Newbloods, false)
        .await
        .unwrap();
    let captain_one = captain(&game, Team::One);
    let updated = games.sub(&player(11), captain_one).await.unwrap();
    assert!(updated.is_captain(11));
    assert_eq!(
        coordinator.queues().status(QueueKind::Newbloods).unwrap().count,
        0
    );
    assert!(publisher.wait_for_events("PlayerSubbed", 1).await);

    // No subs during a draft
    let draft = fill_queue(&coordinator, QueueKind::Competitive, 21..=30).await;
    let target = draft.unassigned[0].id;
    let err = games.sub(&player(31), target).await.unwrap_err();
    assert_eq!(err, MatchmakingError::DraftInProgress { game_id: draft.id });
}

#[tokio::test]
async fn test_tie_updates_counters_only() {
    let (coordinator, _publisher) = create_test_system(8);
    let game = fill_queue(&coordinator, QueueKind::Quickplay, 1..=10).await;

    let record = coordinator
        .games()
        .finish(captain(&game, Team::Two), Outcome::Tie)
        .await
        .unwrap();
    assert!(record.is_tie());
    assert_eq!(record.winners().len(), 10);
    assert!(record.losers().is_empty());

    for id in 1..=10 {
        let profile = coordinator.stores().players.get(id).unwrap().unwrap();
        assert_eq!(profile.ties, 1);
        assert_eq!(profile.wins, 0);
        assert_eq!(profile.losses, 0);
        assert_eq!(profile.games_played, 1);
        assert!(profile.last_played.is_some());
        // Equal teams tie without moving their means
        assert!((profile.rating.rating - 25.0).abs() < 0.01);
        assert!(profile.rating.uncertainty < 25.0 / 3.0);
    }

    let err = coordinator.games().flip_results(game.id).await.unwrap_err();
    assert_eq!(err, MatchmakingError::TieNotReversible { game_id: game.id });
}

#[tokio::test]
async fn test_loss_report_makes_other_team_win() {
    let (coordinator, _publisher) = create_test_system(9);
    let game = fill_queue(&coordinator, QueueKind::Quickplay, 1..=10).await;
    let reporter = captain(&game, Team::One);

    let record = coordinator
        .games()
        .finish(reporter, Outcome::Loss)
        .await
        .unwrap();

    let outcomes: HashMap<PlayerId, Outcome> = record
        .results
        .iter()
        .map(|r| (r.player_id, r.outcome))
        .collect();
    for id in game.team_one.player_ids() {
        assert_eq!(outcomes[&id], Outcome::Loss);
    }
    for id in game.team_two.player_ids() {
        assert_eq!(outcomes[&id], Outcome::Win);
    }
}

#[tokio::test]
async fn test_flip_results_swaps_outcomes_and_counters() {
    let (coordinator, publisher) = create_test_system(10);
    let game = fill_queue(&coordinator, QueueKind::Quickplay, 1..=10).await;
    let games = coordinator.games();
    let winner = captain(&game, Team::One);

    games.finish(winner, Outcome::Win).await.unwrap();
    let after_finish = coordinator.stores().players.get(winner).unwrap().unwrap();

    let flipped = games.flip_results(game.id).await.unwrap();
    for result in &flipped.results {
        let expected = if result.team == Team::One {
            Outcome::Loss
        } else {
            Outcome::Win
        };
        assert_eq!(result.outcome, expected);
    }

    let after_flip = coordinator.stores().players.get(winner).unwrap().unwrap();
    assert_eq!(after_flip.wins, 0);
    assert_eq!(after_flip.losses, 1);
    assert_eq!(after_flip.games_played, 1);
    // A fresh reversed update, not an exact undo of the first one
    assert!(after_flip.rating.rating < after_finish.rating.rating);

    let stored = coordinator.history().recent(1).unwrap();
    assert_eq!(stored[0].losers().len(), 5);
    assert!(stored[0]
        .results
        .iter()
        .any(|r| r.player_id == winner && r.outcome == Outcome::Loss));

    let unknown = pug_room::utils::generate_game_id();
    let err = games.flip_results(unknown).await.unwrap_err();
    assert_eq!(err, MatchmakingError::GameNotFound { game_id: unknown });
    assert!(publisher.wait_for_events("ResultsFlipped", 1).await);
}

#[tokio::test]
async fn test_requeue_delay_after_finish() {
    let (coordinator, _publisher) = create_test_system(11);
    let game = fill_queue(&coordinator, QueueKind::Quickplay, 1..=10).await;
    let reporter = captain(&game, Team::One);
    coordinator
        .games()
        .finish(reporter, Outcome::Win)
        .await
        .unwrap();

    let admission = coordinator
        .admit(&player(reporter), QueueKind::Quickplay, false)
        .await
        .unwrap();
    match admission.result {
        AdmitResult::Delayed { seconds } => assert!((1..=15).contains(&seconds)),
        other => panic!("expected a delay, got {:?}", other),
    }

    let admission = coordinator
        .admit(&player(reporter), QueueKind::Quickplay, true)
        .await
        .unwrap();
    assert_eq!(admission.result, AdmitResult::Admitted { count: 1 });
}

#[tokio::test]
async fn test_cancel_removes_game_and_draft() {
    let (coordinator, publisher) = create_test_system(12);
    let game = fill_queue(&coordinator, QueueKind::Competitive, 1..=10).await;
    let games = coordinator.games();
    assert!(games.draft_state(game.id).unwrap().is_some());

    let waiting = game.unassigned[3].id;
    let cancelled = games.cancel(waiting).await.unwrap();
    assert_eq!(cancelled.id, game.id);

    assert!(games.game(game.id).unwrap().is_none());
    assert!(games.draft_state(game.id).unwrap().is_none());
    assert!(games.game_for_player(waiting).unwrap().is_none());
    assert!(!coordinator.queues().status(QueueKind::Competitive).unwrap().is_live);

    let err = games.cancel(waiting).await.unwrap_err();
    assert_eq!(err, MatchmakingError::NotInGame { player_id: waiting });
    assert!(publisher.wait_for_events("GameCancelled", 1).await);
}

#[tokio::test]
async fn test_map_changes() {
    let (coordinator, publisher) = create_test_system(13);
    let game = fill_queue(&coordinator, QueueKind::Competitive, 1..=10).await;
    let games = coordinator.games();
    let first = captain(&game, Team::One);

    let err = games.remap_single_slot(first, 0).await.unwrap_err();
    assert_eq!(
        err,
        MatchmakingError::InvalidMapNumber {
            map_number: 0,
            available: 2
        }
    );

    let err = games.reroll_maps(game.unassigned[0].id).await.unwrap_err();
    assert!(matches!(err, MatchmakingError::NotCaptain { .. }));

    let maps = games.remap_single_slot(first, 1).await.unwrap();
    assert_eq!(maps.len(), 2);
    assert_ne!(maps[0], game.maps[0]);
    assert_ne!(maps[0], game.maps[1]);
    assert_eq!(maps[1], game.maps[1]);

    let rerolled = games.reroll_maps(captain(&game, Team::Two)).await.unwrap();
    assert_eq!(rerolled.len(), 2);
    assert_ne!(rerolled[0], rerolled[1]);
    assert_eq!(games.game(game.id).unwrap().unwrap().maps, rerolled);
    assert!(publisher.wait_for_events("MapsUpdated", 2).await);
}

#[tokio::test]
async fn test_draft_messages() {
    let (coordinator, _publisher) = create_test_system(14);
    let drafted = fill_queue(&coordinator, QueueKind::Competitive, 1..=10).await;
    let balanced = fill_queue(&coordinator, QueueKind::Quickplay, 11..=20).await;
    let games = coordinator.games();

    let messages = HashMap::from([(captain(&drafted, Team::One), 7001)]);
    let draft = games
        .update_draft_messages(drafted.id, messages.clone())
        .await
        .unwrap();
    assert_eq!(draft.messages, messages);
    assert_eq!(
        games.draft_state(drafted.id).unwrap().unwrap().messages,
        messages
    );

    let err = games
        .update_draft_messages(balanced.id, HashMap::new())
        .await
        .unwrap_err();
    assert_eq!(
        err,
        MatchmakingError::DraftAlreadyComplete {
            game_id: balanced.id
        }
    );
}

#[tokio::test]
async fn test_removal_and_idle_sweep() {
    let (coordinator, publisher) = create_test_system(15);
    let queues = coordinator.queues();

    coordinator
        .admit(&player(1), QueueKind::Quickplay, false)
        .await
        .unwrap();
    coordinator
        .admit(&player(1), QueueKind::Newbloods, false)
        .await
        .unwrap();
    let left = queues.remove(1, QueueSelector::All).await.unwrap();
    assert_eq!(left, vec![QueueKind::Quickplay, QueueKind::Newbloods]);

    coordinator
        .admit(&player(2), QueueKind::Test, false)
        .await
        .unwrap();
    assert!(queues.sweep(Utc::now()).await.unwrap().is_empty());

    let removed = queues
        .sweep(Utc::now() + Duration::minutes(46))
        .await
        .unwrap();
    assert_eq!(removed.len(), 1);
    assert_eq!(removed[0].player_id, 2);
    assert_eq!(queues.counts().unwrap()[&QueueKind::Test], 0);
    assert!(publisher.wait_for_events("QueueEntryExpired", 1).await);
}

#[tokio::test]
async fn test_finish_rejected_while_drafting() {
    let (coordinator, _publisher) = create_test_system(16);
    let game = fill_queue(&coordinator, QueueKind::Competitive, 1..=10).await;
    assert_eq!(game.status, GameStatus::Pending);

    let err = coordinator
        .games()
        .finish(captain(&game, Team::One), Outcome::Win)
        .await
        .unwrap_err();
    assert_eq!(err, MatchmakingError::DraftInProgress { game_id: game.id });

    let err = coordinator
        .games()
        .finish(42, Outcome::Win)
        .await
        .unwrap_err();
    assert_eq!(err, MatchmakingError::NotInGame { player_id: 42 });
}
