//! Application state and component wiring
//!
//! The `Coordinator` builds every component from an `AppConfig`, shares
//! the stores, locks, notifier and metrics between them, and owns the
//! background tasks.

use crate::config::AppConfig;
use crate::error::{MatchmakingError, Result as MatchmakingResult};
use crate::game::{Game, GameManager, LifecycleSettings};
use crate::history::HistoryService;
use crate::locks::KeyedLocks;
use crate::maps::MapSelector;
use crate::metrics::MetricsCollector;
use crate::notify::{EventPublisher, LoggingEventPublisher, Notifier};
use crate::queue::{start_sweeper, AdmitResult, QueueManager};
use crate::rating::{SkillModel, TrueSkillCalculator};
use crate::store::Stores;
use crate::types::{PlayerIdentity, QueueKind};
use std::sync::Arc;
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Service-level errors
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Service initialization error: {message}")]
    Initialization { message: String },
}

/// Outcome of an admission, with the game it triggered if any
#[derive(Debug, Clone)]
pub struct Admission {
    pub result: AdmitResult,
    pub game: Option<Game>,
}

/// Every coordinator component, wired together
pub struct Coordinator {
    config: AppConfig,
    stores: Stores,
    metrics: Arc<MetricsCollector>,
    queues: Arc<QueueManager>,
    games: Arc<GameManager>,
    history: HistoryService,
    background_tasks: Vec<JoinHandle<()>>,
}

impl Coordinator {
    /// Build with in-memory stores and a logging publisher
    ///
    /// Must be called inside a tokio runtime.
    pub fn new(config: AppConfig) -> Result<Self, ServiceError> {
        Self::with_parts(
            config,
            Stores::in_memory(),
            Arc::new(LoggingEventPublisher::new()),
            None,
        )
    }

    /// Build from explicit stores and publisher
    ///
    /// A `seed` makes captain, map and server choices reproducible.
    pub fn with_parts(
        config: AppConfig,
        stores: Stores,
        publisher: Arc<dyn EventPublisher>,
        seed: Option<u64>,
    ) -> Result<Self, ServiceError> {
        info!("Initializing {} coordinator", config.service.name);

        let metrics = Arc::new(MetricsCollector::new().map_err(|e| {
            ServiceError::Initialization {
                message: format!("Failed to create metrics collector: {}", e),
            }
        })?);

        let model: Arc<dyn SkillModel> = Arc::new(
            TrueSkillCalculator::new(config.rating.clone()).map_err(configuration)?,
        );
        let maps = MapSelector::new(&config.maps).map_err(configuration)?;

        let (notifier, dispatcher) = Notifier::spawn(publisher, metrics.clone());
        let player_locks = Arc::new(KeyedLocks::new());

        let queues = Arc::new(QueueManager::new(
            stores.clone(),
            model.clone(),
            config.queue.clone(),
            player_locks.clone(),
            notifier.clone(),
            metrics.clone(),
        ));

        let history = HistoryService::new(stores.clone(), player_locks.clone());
        let mut games = GameManager::new(
            stores.clone(),
            model,
            maps,
            LifecycleSettings::from(&config),
            player_locks,
            notifier,
            metrics.clone(),
        );
        if let Some(seed) = seed {
            games = games.with_seed(seed);
        }

        debug!(
            "Coordinator configured: capacity {}, team size {}, {} maps",
            config.queue.capacity,
            config.game.team_size,
            config.maps.maps.len()
        );

        Ok(Self {
            history,
            config,
            stores,
            metrics,
            queues,
            games: Arc::new(games),
            background_tasks: vec![dispatcher],
        })
    }

    /// Start the idle queue sweeper
    pub fn start(&mut self) {
        let sweeper = start_sweeper(self.queues.clone(), self.config.sweep_interval());
        self.background_tasks.push(sweeper);
        info!("{} coordinator started", self.config.service.name);
    }

    /// Stop background tasks
    pub async fn shutdown(&mut self) {
        info!("Shutting down {} coordinator", self.config.service.name);

        for task in self.background_tasks.drain(..) {
            task.abort();
            if let Err(e) = task.await {
                if !e.is_cancelled() {
                    warn!("Background task failed during shutdown: {}", e);
                }
            }
        }

        match self.queues.counts() {
            Ok(counts) => info!("Players still queued at shutdown: {:?}", counts),
            Err(e) => warn!("Could not read queue counts at shutdown: {}", e),
        }
    }

    /// Admit a player and form a game when the queue fills
    ///
    /// A queue that fills is formed immediately: drafted for competitive
    /// queues, balanced otherwise. A formation that loses a race with
    /// another one is not an error for the admitted player.
    pub async fn admit(
        &self,
        identity: &PlayerIdentity,
        queue: QueueKind,
        skip_delay: bool,
    ) -> MatchmakingResult<Admission> {
        let result = self.queues.admit(identity, queue, skip_delay).await?;

        let game = if result.should_start(self.queues.capacity()) {
            match self.games.form_teams(queue).await {
                Ok(game) => Some(game),
                Err(MatchmakingError::QueueNotFull { count, .. }) => {
                    debug!("Queue {} drained by another formation ({} left)", queue, count);
                    None
                }
                Err(e) => return Err(e),
            }
        } else {
            None
        };

        Ok(Admission { result, game })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn stores(&self) -> &Stores {
        &self.stores
    }

    pub fn queues(&self) -> Arc<QueueManager> {
        self.queues.clone()
    }

    pub fn games(&self) -> Arc<GameManager> {
        self.games.clone()
    }

    pub fn history(&self) -> &HistoryService {
        &self.history
    }

    pub fn metrics(&self) -> Arc<MetricsCollector> {
        self.metrics.clone()
    }
}

fn configuration(e: MatchmakingError) -> ServiceError {
    ServiceError::Configuration {
        message: e.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::GameStatus;

    #[tokio::test]
    async fn test_tenth_admission_forms_game() {
        let coordinator = Coordinator::new(AppConfig::default()).unwrap();

        for id in 1..=9 {
            let admission = coordinator
                .admit(&PlayerIdentity::new(id, format!("p{}", id)), QueueKind::Quickplay, false)
                .await
                .unwrap();
            assert_eq!(admission.result, AdmitResult::Admitted { count: id as usize });
            assert!(admission.game.is_none());
        }

        let admission = coordinator
            .admit(&PlayerIdentity::new(10, "p10"), QueueKind::Quickplay, false)
            .await
            .unwrap();
        let game = admission.game.expect("tenth admission should form a game");
        assert_eq!(game.status, GameStatus::Started);
        assert_eq!(coordinator.queues().status(QueueKind::Quickplay).unwrap().count, 0);
    }

    #[tokio::test]
    async fn test_invalid_map_pool_rejected() {
        let mut config = AppConfig::default();
        config.maps.maps.clear();

        let result = Coordinator::new(config);
        assert!(matches!(result, Err(ServiceError::Configuration { .. })));
    }

    #[tokio::test]
    async fn test_shutdown_stops_tasks() {
        let mut coordinator = Coordinator::new(AppConfig::default()).unwrap();
        coordinator.start();
        coordinator.shutdown().await;
    }
}
