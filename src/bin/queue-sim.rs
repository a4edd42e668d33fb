//! Queue Simulator CLI Tool
//!
//! Drives complete matches through the coordinator in-process: players are
//! admitted until the queue fills, teams are formed or drafted, results are
//! reported and the resulting ratings and leaderboard are printed.
//!
//! Usage:
//!   cargo run --bin queue-sim -- --help
//!   cargo run --bin queue-sim balanced --games 3 --shuffles 2
//!   cargo run --bin queue-sim draft --seed 42
//!   cargo run --bin queue-sim leaderboard --games 20 --metrics

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use pug_room::config::AppConfig;
use pug_room::game::Game;
use pug_room::notify::LoggingEventPublisher;
use pug_room::store::Stores;
use pug_room::types::{Outcome, PlayerIdentity, QueueKind};
use pug_room::Coordinator;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "queue-sim")]
#[command(about = "Simulate pick-up games through the pug-room coordinator")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Seed for captains, maps and simulated results
    #[arg(long, global = true)]
    seed: Option<u64>,

    /// Print the prometheus metrics at the end
    #[arg(long, global = true)]
    metrics: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Play balanced quickplay games
    Balanced {
        /// Number of games to play
        #[arg(short, long, default_value = "1")]
        games: usize,
        /// Captain shuffles to request before each game finishes
        #[arg(short, long, default_value = "0")]
        shuffles: u32,
    },
    /// Play one competitive game with a captain draft
    Draft,
    /// Play many games over a fixed player pool and print the leaderboard
    Leaderboard {
        #[arg(short, long, default_value = "20")]
        games: usize,
        /// Size of the player pool
        #[arg(short, long, default_value = "16")]
        players: u64,
    },
}

struct Simulation {
    coordinator: Coordinator,
    rng: StdRng,
}

impl Simulation {
    fn new(seed: Option<u64>) -> Result<Self> {
        let coordinator = Coordinator::with_parts(
            AppConfig::default(),
            Stores::in_memory(),
            Arc::new(LoggingEventPublisher::new()),
            seed,
        )?;
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };

        Ok(Self { coordinator, rng })
    }

    /// Admit players until the queue forms a game
    ///
    /// The re-queue delay is skipped so the same pool can play back to back.
    async fn fill(&self, queue: QueueKind, players: &[PlayerIdentity]) -> Result<Game> {
        for player in players {
            let admission = self.coordinator.admit(player, queue, true).await?;
            println!("  {} -> {:?}", player.name, admission.result);
            if let Some(game) = admission.game {
                return Ok(game);
            }
        }
        Err(anyhow!("Queue {} did not fill", queue))
    }

    async fn finish(&mut self, game: &Game) -> Result<()> {
        let reporter = game
            .team_one
            .captain()
            .ok_or_else(|| anyhow!("Game {} has no captain", game.id))?
            .clone();
        let outcome = match self.rng.random_range(0..10) {
            0 => Outcome::Tie,
            1..=5 => Outcome::Win,
            _ => Outcome::Loss,
        };

        let record = self
            .coordinator
            .games()
            .finish(reporter.id, outcome)
            .await?;
        println!(
            "Game {} finished, {} reported {:?}",
            record.game_id, reporter.name, outcome
        );
        if record.is_tie() {
            println!("  Tie: {}", record.winners().join(", "));
        } else {
            println!("  Winners: {}", record.winners().join(", "));
            println!("  Losers:  {}", record.losers().join(", "));
        }
        Ok(())
    }

    async fn play_balanced(&mut self, players: &[PlayerIdentity], shuffles: u32) -> Result<()> {
        println!("Queueing {} players for quickplay", players.len());
        let mut game = self.fill(QueueKind::Quickplay, players).await?;
        print_game(&game);

        for _ in 0..shuffles {
            let captain = game
                .team_one
                .captain()
                .ok_or_else(|| anyhow!("Game {} has no captain", game.id))?
                .id;
            match self.coordinator.games().shuffle(captain).await {
                Ok(shuffled) => {
                    println!("Shuffled (#{}):", shuffled.reshuffles);
                    game = shuffled;
                    print_game(&game);
                }
                Err(e) => {
                    println!("Shuffle refused: {}", e);
                    break;
                }
            }
        }

        self.finish(&game).await
    }

    async fn play_draft(&mut self, players: &[PlayerIdentity]) -> Result<()> {
        println!("Queueing {} players for competitive", players.len());
        let mut game = self.fill(QueueKind::Competitive, players).await?;
        print_game(&game);

        let games = self.coordinator.games();
        while let Some(draft) = games.draft_state(game.id)? {
            let captain = game
                .team(draft.team_to_pick)
                .captain()
                .ok_or_else(|| anyhow!("Team {} has no captain", draft.team_to_pick))?
                .id;
            let picks: Vec<_> = game
                .unassigned
                .iter()
                .take(draft.picks_required)
                .map(|p| p.id)
                .collect();

            let outcome = games.pick(captain, &picks).await?;
            println!("Team {} picked {:?}", draft.team_to_pick, picks);
            game = outcome.game;
        }

        println!("Draft complete:");
        print_game(&game);
        self.finish(&game).await
    }
}

fn roster(ids: impl Iterator<Item = u64>) -> Vec<PlayerIdentity> {
    ids.map(|id| PlayerIdentity::new(id, format!("player{}", id)))
        .collect()
}

fn print_game(game: &Game) {
    println!("Game {} ({:?}) on {:?}", game.id, game.status, game.maps);
    if let Some(server) = &game.server {
        println!("  Suggested server: {}", server);
    }
    for (label, team) in [("Team 1", &game.team_one), ("Team 2", &game.team_two)] {
        let names: Vec<String> = team
            .slots
            .iter()
            .enumerate()
            .map(|(index, p)| {
                if team.captain == Some(index) {
                    format!("{} (C)", p.name)
                } else {
                    p.name.clone()
                }
            })
            .collect();
        println!("  {}: {}", label, names.join(", "));
    }
    if !game.unassigned.is_empty() {
        let names: Vec<&str> = game.unassigned.iter().map(|p| p.name.as_str()).collect();
        println!("  Unassigned: {}", names.join(", "));
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .init();

    let cli = Cli::parse();
    let mut sim = Simulation::new(cli.seed)?;
    let capacity = sim.coordinator.config().queue.capacity as u64;

    match cli.command {
        Commands::Balanced { games, shuffles } => {
            for round in 0..games as u64 {
                let first = round * capacity + 1;
                sim.play_balanced(&roster(first..first + capacity), shuffles)
                    .await?;
            }
        }

        Commands::Draft => {
            sim.play_draft(&roster(1..=capacity)).await?;
        }

        Commands::Leaderboard { games, players } => {
            if players < capacity {
                return Err(anyhow!("Need at least {} players", capacity));
            }
            let pool = roster(1..=players);
            for _ in 0..games {
                let start = sim.rng.random_range(0..pool.len());
                let picked: Vec<PlayerIdentity> = pool
                    .iter()
                    .cycle()
                    .skip(start)
                    .take(capacity as usize)
                    .cloned()
                    .collect();
                sim.play_balanced(&picked, 0).await?;
            }

            let board = sim.coordinator.history().leaderboard(None, None)?;
            println!();
            println!("All-time leaderboard: {} games, {} players", board.total_games, board.unique_players);
            println!("Popular maps:");
            for map in &board.most_popular_maps {
                println!("  {} ({})", map.map, map.count);
            }
            println!("Most games:");
            for entry in &board.most_games_played {
                println!("  {} ({})", entry.name, entry.value);
            }
            println!("Most wins:");
            for entry in &board.most_games_won {
                println!("  {} ({})", entry.name, entry.value);
            }
            println!("Best win rate:");
            for entry in &board.highest_win_rate {
                println!("  {} ({:.0}%)", entry.name, entry.value * 100.0);
            }
        }
    }

    let recent = sim.coordinator.history().recent(pug_room::history::DEFAULT_HISTORY_LIMIT)?;
    println!();
    println!("Recent games: {}", recent.len());

    if cli.metrics {
        println!();
        print!("{}", sim.coordinator.metrics().render()?);
    }

    sim.coordinator.shutdown().await;
    Ok(())
}
