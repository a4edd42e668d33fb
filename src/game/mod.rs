//! Games: rosters, the lifecycle manager and server suggestions

pub mod manager;
pub mod roster;
pub mod server;

pub use manager::{GameManager, LifecycleSettings};
pub use roster::{Game, Seat, TeamRoster};
pub use server::{most_common_region, pick_suggested_server};
