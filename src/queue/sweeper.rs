//! Background task removing idle queue entries

use crate::queue::manager::QueueManager;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::interval;
use tracing::{debug, error, info};

/// Start sweeping idle entries every `period`
///
/// The task runs until the returned handle is aborted.
pub fn start_sweeper(manager: Arc<QueueManager>, period: Duration) -> JoinHandle<()> {
    let handle = tokio::spawn(async move {
        let mut sweep_interval = interval(period);

        loop {
            sweep_interval.tick().await;

            match manager.sweep(chrono::Utc::now()).await {
                Ok(removed) if !removed.is_empty() => {
                    debug!("Sweep removed {} idle entries", removed.len());
                }
                Ok(_) => {}
                Err(e) => error!("Error during queue sweep: {}", e),
            }
        }
    });

    info!("Started queue sweeper every {:?}", period);
    handle
}
