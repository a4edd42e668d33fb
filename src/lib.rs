//! Pug Room - pick-up game coordinator
//!
//! This crate queues players, forms balanced teams or runs captain drafts,
//! tracks active games through swaps, subs and shuffles, and feeds finished
//! results into TrueSkill ratings and leaderboards.

pub mod config;
pub mod error;
pub mod game;
pub mod history;
pub mod locks;
pub mod maps;
pub mod metrics;
pub mod notify;
pub mod queue;
pub mod rating;
pub mod service;
pub mod store;
pub mod teams;
pub mod types;
pub mod utils;

// Re-export commonly used types and traits
pub use error::{MatchmakingError, Result};
pub use types::*;

// Re-export key components
pub use game::{Game, GameManager};
pub use notify::{EventPublisher, MatchEvent};
pub use queue::{AdmitResult, QueueManager};
pub use service::Coordinator;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
