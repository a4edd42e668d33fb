//! History, profile and leaderboard integration tests

use chrono::{Datelike, Utc};
use pug_room::error::MatchmakingError;
use pug_room::game::Game;
use pug_room::types::{Outcome, PlayerId, QueueKind, Region, Team};
use pug_room::Coordinator;

use crate::fixtures::{captain, create_test_system, players};

/// Form a quickplay game without waiting out the re-queue delay
async fn play_again(coordinator: &Coordinator, ids: std::ops::RangeInclusive<PlayerId>) -> Game {
    let mut formed = None;
    for identity in players(ids) {
        formed = coordinator
            .admit(&identity, QueueKind::Quickplay, true)
            .await
            .unwrap()
            .game;
    }
    formed.expect("queue did not form a game")
}

#[tokio::test]
async fn test_leaderboard_over_several_games() {
    let (coordinator, _publisher) = create_test_system(21);

    for _ in 0..6 {
        let game = play_again(&coordinator, 1..=10).await;
        coordinator
            .games()
            .finish(captain(&game, Team::One), Outcome::Win)
            .await
            .unwrap();
    }

    let history = coordinator.history();
    assert_eq!(history.recent(5).unwrap().len(), 5);
    assert_eq!(history.recent(50).unwrap().len(), 6);

    let board = history.leaderboard(None, None).unwrap();
    assert_eq!(board.total_games, 6);
    assert_eq!(board.unique_players, 10);
    assert!(board.start_date.is_none());
    assert_eq!(board.most_games_played.len(), 10);
    assert!(board.most_games_played.iter().all(|p| p.value == 6));
    assert!(board.most_popular_maps.len() <= 3);
    assert!(board.most_popular_maps.iter().map(|m| m.count).sum::<usize>() <= 6);

    let wins: u32 = board.most_games_won.iter().map(|p| p.value).sum();
    assert_eq!(wins, 30);
    // Everyone played five or more games, so every rate is listed
    assert_eq!(board.highest_win_rate.len(), 10);
    for pair in board.highest_win_rate.windows(2) {
        assert!(pair[0].value >= pair[1].value);
    }

    let today = Utc::now().date_naive();
    let monthly = history.leaderboard(None, Some(today.month())).unwrap();
    assert_eq!(monthly.total_games, 6);
    assert_eq!(monthly.start_date.map(|d| d.month()), Some(today.month()));
}

#[tokio::test]
async fn test_empty_month_leaderboard() {
    let (coordinator, _publisher) = create_test_system(22);
    let game = play_again(&coordinator, 1..=10).await;
    coordinator
        .games()
        .finish(captain(&game, Team::Two), Outcome::Win)
        .await
        .unwrap();

    let board = coordinator.history().leaderboard(Some(2021), Some(9)).unwrap();
    assert_eq!(board.total_games, 0);
    assert_eq!(board.unique_players, 0);
    assert!(board.most_popular_maps.is_empty());
    assert!(board.most_games_played.is_empty());
    assert!(board.highest_win_rate.is_empty());

    let err = coordinator
        .history()
        .leaderboard(Some(2021), Some(13))
        .unwrap_err();
    assert!(matches!(err, MatchmakingError::InvalidRequest { .. }));
}

#[tokio::test]
async fn test_profile_visibility_and_region() {
    let (coordinator, _publisher) = create_test_system(23);
    let history = coordinator.history();

    let game = play_again(&coordinator, 1..=10).await;
    let reporter = captain(&game, Team::One);
    coordinator
        .games()
        .finish(reporter, Outcome::Win)
        .await
        .unwrap();

    // New profiles keep their rating hidden until the player opts in
    let profile = history.profile(reporter).unwrap().unwrap();
    assert_eq!(profile.games_played, 1);
    assert_eq!(profile.wins, 1);
    assert_eq!(profile.win_rate, Some(1.0));
    assert!(profile.rating.is_none());
    assert!(profile.last_played.is_some());

    history.set_stats_visibility(reporter, true).await.unwrap();
    let shown = history.profile(reporter).unwrap().unwrap();
    assert!(shown.rating.unwrap().rating > 25.0);

    history.set_stats_visibility(reporter, false).await.unwrap();
    let hidden = history.profile(reporter).unwrap().unwrap();
    assert!(hidden.rating.is_none());
    assert_eq!(hidden.games_played, 1);

    history.set_region(reporter, Region::Australia).await.unwrap();
    assert_eq!(
        history.profile(reporter).unwrap().unwrap().region,
        Region::Australia
    );

    assert!(history.profile(999).unwrap().is_none());
    let err = history.set_region(999, Region::Europe).await.unwrap_err();
    assert!(matches!(err, MatchmakingError::InvalidRequest { .. }));
}

#[tokio::test]
async fn test_region_majority_picks_server() {
    let (coordinator, _publisher) = create_test_system(24);

    // Profiles exist once players have queued
    for identity in players(1..=6) {
        coordinator
            .admit(&identity, QueueKind::Quickplay, false)
            .await
            .unwrap();
        coordinator
            .history()
            .set_region(identity.id, Region::Europe)
            .await
            .unwrap();
    }
    coordinator
        .history()
        .set_region(7, Region::NotSet)
        .await
        .unwrap_err();

    let game = play_again(&coordinator, 7..=10).await;
    let europe = &coordinator.config().servers.europe;
    let server = game.server.expect("a server should be suggested");
    assert!(europe.contains(&server));
}
