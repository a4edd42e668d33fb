//! Performance benchmarks for team balancing and rating updates

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use pug_room::config::{AppConfig, RatingConfig};
use pug_room::rating::{SkillModel, TrueSkillCalculator};
use pug_room::teams::{RatedPlayer, TeamBalancer};
use pug_room::types::{PlayerIdentity, PlayerRating, QueueKind};
use pug_room::Coordinator;
use std::sync::Arc;

fn create_model() -> Arc<dyn SkillModel> {
    Arc::new(TrueSkillCalculator::new(RatingConfig::default()).unwrap())
}

fn create_roster() -> Vec<RatedPlayer> {
    (1..=10)
        .map(|id| {
            RatedPlayer::new(
                PlayerIdentity::new(id, format!("player{}", id)),
                PlayerRating {
                    rating: 15.0 + id as f64 * 2.0,
                    uncertainty: 3.0 + (id % 4) as f64,
                },
            )
        })
        .collect()
}

fn bench_ranked_partitions(c: &mut Criterion) {
    let balancer = TeamBalancer::new(create_model(), 5);
    let roster = create_roster();

    c.bench_function("ranked_partitions_10_players", |b| {
        b.iter(|| black_box(balancer.ranked_partitions(&roster)))
    });
}

fn bench_rating_update(c: &mut Criterion) {
    let model = create_model();
    let roster = create_roster();
    let side = |players: &[RatedPlayer]| -> Vec<(u64, PlayerRating)> {
        players.iter().map(|p| (p.identity.id, p.rating)).collect()
    };
    let winners = side(&roster[..5]);
    let losers = side(&roster[5..]);

    c.bench_function("rating_update_5v5", |b| {
        b.iter(|| black_box(model.rate(&winners, &losers, false)))
    });
}

fn bench_queue_to_game(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();

    c.bench_function("queue_to_balanced_game", |b| {
        b.iter(|| {
            rt.block_on(async {
                let coordinator = Coordinator::new(AppConfig::default()).unwrap();
                let mut formed = None;
                for id in 1..=10 {
                    formed = coordinator
                        .admit(
                            &PlayerIdentity::new(id, format!("player{}", id)),
                            QueueKind::Quickplay,
                            false,
                        )
                        .await
                        .unwrap()
                        .game;
                }
                black_box(formed)
            })
        })
    });
}

criterion_group!(
    benches,
    bench_ranked_partitions,
    bench_rating_update,
    bench_queue_to_game
);
criterion_main!(benches);
