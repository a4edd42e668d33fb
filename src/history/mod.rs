//! Finished game history, leaderboards and player profile views

pub mod leaderboard;
pub mod service;

pub use leaderboard::{DateRange, Leaderboard, MapCount, PlayerStats, RankedPlayer};
pub use service::{HistoryService, ProfileView, DEFAULT_HISTORY_LIMIT};
