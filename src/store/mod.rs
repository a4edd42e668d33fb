//! Storage interfaces injected into the coordinator components
//!
//! Each entity collection has its own trait so a persistent backend can be
//! swapped in per collection. The in-memory implementations are the
//! reference stores used by the service binary and the tests.

pub mod games;
pub mod players;
pub mod queues;
pub mod results;

pub use games::{GameStore, InMemoryGameStore};
pub use players::{InMemoryPlayerStore, PlayerStore};
pub use queues::{InMemoryQueueStore, QueueStore};
pub use results::{InMemoryResultStore, ResultStore};

use std::sync::Arc;

/// The full set of stores, cheap to clone
#[derive(Clone)]
pub struct Stores {
    pub players: Arc<dyn PlayerStore>,
    pub queues: Arc<dyn QueueStore>,
    pub games: Arc<dyn GameStore>,
    pub results: Arc<dyn ResultStore>,
}

impl Stores {
    /// Fresh in-memory stores
    pub fn in_memory() -> Self {
        Self {
            players: Arc::new(InMemoryPlayerStore::new()),
            queues: Arc::new(InMemoryQueueStore::new()),
            games: Arc::new(InMemoryGameStore::new()),
            results: Arc::new(InMemoryResultStore::new()),
        }
    }
}
