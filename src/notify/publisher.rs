//! Event publishing seam and the background dispatcher

use crate::error::Result;
use crate::metrics::MetricsCollector;
use crate::notify::events::MatchEvent;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Trait for delivering events to participants
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Deliver a single event
    async fn publish(&self, event: MatchEvent) -> Result<()>;
}

/// Publisher that only writes events to the log
#[derive(Debug, Default)]
pub struct LoggingEventPublisher;

impl LoggingEventPublisher {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl EventPublisher for LoggingEventPublisher {
    async fn publish(&self, event: MatchEvent) -> Result<()> {
        info!("Event {}", event.kind());
        if let Ok(payload) = serde_json::to_string(&event) {
            debug!("Event payload: {}", payload);
        }
        Ok(())
    }
}

/// Queues events for asynchronous delivery
///
/// `notify` never blocks; a background task drains the channel into the
/// publisher. Delivery failures are logged and counted, never returned to
/// the operation that produced the event.
#[derive(Clone)]
pub struct Notifier {
    sender: mpsc::UnboundedSender<MatchEvent>,
}

impl Notifier {
    /// Spawn the dispatcher task; it exits once every `Notifier` is dropped
    pub fn spawn(
        publisher: Arc<dyn EventPublisher>,
        metrics: Arc<MetricsCollector>,
    ) -> (Self, JoinHandle<()>) {
        let (sender, mut receiver) = mpsc::unbounded_channel::<MatchEvent>();

        let handle = tokio::spawn(async move {
            while let Some(event) = receiver.recv().await {
                let kind = event.kind();
                if let Err(e) = publisher.publish(event).await {
                    warn!("Failed to deliver {} notification: {}", kind, e);
                    metrics.record_notification_failure();
                }
            }
            debug!("Notification dispatcher stopped");
        });

        (Self { sender }, handle)
    }

    /// Queue an event for delivery
    pub fn notify(&self, event: MatchEvent) {
        if let Err(e) = self.sender.send(event) {
            warn!("Notification dropped, dispatcher is gone: {}", e.0.kind());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MatchmakingError;
    use crate::types::{GameId, QueueKind};

    fn queued(player_id: u64) -> MatchEvent {
        MatchEvent::PlayerQueued {
            player_id,
            name: format!("player{}", player_id),
            queue: QueueKind::Quickplay,
            count: 1,
        }
    }

    #[tokio::test]
    async fn test_dispatcher_delivers_in_order() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut publisher = MockEventPublisher::new();
        publisher.expect_publish().times(3).returning(move |event| {
            let _ = tx.send(event);
            Ok(())
        });

        let metrics = Arc::new(MetricsCollector::new().unwrap());
        let (notifier, handle) = Notifier::spawn(Arc::new(publisher), metrics);
        for id in 1..=3 {
            notifier.notify(queued(id));
        }
        drop(notifier);
        handle.await.unwrap();

        for id in 1..=3 {
            match rx.recv().await {
                Some(MatchEvent::PlayerQueued { player_id, .. }) => assert_eq!(player_id, id),
                other => panic!("unexpected event {:?}", other),
            }
        }
    }

    #[tokio::test]
    async fn test_failures_are_counted_not_returned() {
        let mut publisher = MockEventPublisher::new();
        publisher.expect_publish().returning(|_| {
            Err(MatchmakingError::InternalError {
                message: "notifier offline".to_string(),
            })
        });

        let metrics = Arc::new(MetricsCollector::new().unwrap());
        let (notifier, handle) = Notifier::spawn(Arc::new(publisher), metrics.clone());
        notifier.notify(MatchEvent::GameCancelled {
            game_id: GameId::nil(),
            cancelled_by: 1,
        });
        drop(notifier);
        handle.await.unwrap();

        assert_eq!(
            metrics.performance().notification_failures_total.get(),
            1
        );
    }

    #[tokio::test]
    async fn test_logging_publisher_accepts_everything() {
        let publisher = LoggingEventPublisher::new();
        assert!(publisher.publish(queued(1)).await.is_ok());
    }
}
