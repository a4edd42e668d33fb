//! Metrics collection using Prometheus
//!
//! This module records matchmaking activity for the pug-room coordinator:
//! admissions, game formation, draft progress, results and notification
//! delivery.

use crate::types::QueueKind;
use anyhow::Result;
use prometheus::{
    Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, IntGaugeVec, Opts, Registry,
    TextEncoder,
};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Main metrics collector for the coordinator
#[derive(Clone)]
pub struct MetricsCollector {
    /// Prometheus registry
    registry: Arc<Registry>,

    /// Queue-related metrics
    queue_metrics: QueueMetrics,

    /// Game-related metrics
    game_metrics: GameMetrics,

    /// Performance metrics
    performance_metrics: PerformanceMetrics,
}

/// Queue-related metrics
#[derive(Clone)]
pub struct QueueMetrics {
    /// Admission attempts by queue and result
    pub admissions_total: IntCounterVec,

    /// Entries removed by the idle sweep
    pub entries_expired_total: IntCounterVec,

    /// Players currently waiting per queue
    pub players_waiting: IntGaugeVec,
}

/// Game-related metrics
#[derive(Clone)]
pub struct GameMetrics {
    /// Games formed by queue and mode (balanced or draft)
    pub games_formed_total: IntCounterVec,

    /// Successful team shuffles
    pub shuffles_total: IntCounter,

    /// Shuffles that ran past the partition ranking and wrapped around
    pub shuffle_wraps_total: IntCounter,

    /// Draft picks applied
    pub draft_picks_total: IntCounter,

    /// Finished games by result (decided or tie)
    pub games_finished_total: IntCounterVec,

    /// Games cancelled before finishing
    pub games_cancelled_total: IntCounter,

    /// Results reversed by an override
    pub results_flipped_total: IntCounter,

    /// Quality of the partition chosen at formation or shuffle
    pub match_quality: Histogram,
}

/// Performance metrics
#[derive(Clone)]
pub struct PerformanceMetrics {
    /// Time spent enumerating and ranking partitions
    pub balancing_duration: Histogram,

    /// Time spent computing rating updates
    pub rating_update_duration: Histogram,

    /// Notifications the publisher failed to deliver
    pub notification_failures_total: IntCounter,
}

impl MetricsCollector {
    /// Create a new metrics collector with its own registry
    pub fn new() -> Result<Self> {
        let registry = Arc::new(Registry::new());
        Self::with_registry(registry)
    }

    /// Create a new metrics collector with custom registry
    pub fn with_registry(registry: Arc<Registry>) -> Result<Self> {
        let queue_metrics = QueueMetrics::new(&registry)?;
        let game_metrics = GameMetrics::new(&registry)?;
        let performance_metrics = PerformanceMetrics::new(&registry)?;

        Ok(Self {
            registry,
            queue_metrics,
            game_metrics,
            performance_metrics,
        })
    }

    /// Get the Prometheus registry
    pub fn registry(&self) -> Arc<Registry> {
        self.registry.clone()
    }

    pub fn queue(&self) -> &QueueMetrics {
        &self.queue_metrics
    }

    pub fn game(&self) -> &GameMetrics {
        &self.game_metrics
    }

    pub fn performance(&self) -> &PerformanceMetrics {
        &self.performance_metrics
    }

    /// Record one admission attempt
    pub fn record_admission(&self, queue: QueueKind, result: &str) {
        self.queue_metrics
            .admissions_total
            .with_label_values(&[queue.as_str(), result])
            .inc();
    }

    /// Record an entry removed for idling
    pub fn record_entry_expired(&self, queue: QueueKind) {
        self.queue_metrics
            .entries_expired_total
            .with_label_values(&[queue.as_str()])
            .inc();
    }

    /// Set the number of players waiting in a queue
    pub fn set_players_waiting(&self, queue: QueueKind, count: usize) {
        self.queue_metrics
            .players_waiting
            .with_label_values(&[queue.as_str()])
            .set(count as i64);
    }

    /// Record a game being formed
    pub fn record_game_formed(&self, queue: QueueKind, quality: Option<f64>) {
        let mode = if queue.uses_draft() { "draft" } else { "balanced" };

        self.game_metrics
            .games_formed_total
            .with_label_values(&[queue.as_str(), mode])
            .inc();

        if let Some(quality) = quality {
            self.game_metrics.match_quality.observe(quality);
        }
    }

    /// Record a successful shuffle
    pub fn record_shuffle(&self, quality: f64, wrapped: bool) {
        self.game_metrics.shuffles_total.inc();
        self.game_metrics.match_quality.observe(quality);
        if wrapped {
            self.game_metrics.shuffle_wraps_total.inc();
        }
    }

    pub fn record_draft_pick(&self) {
        self.game_metrics.draft_picks_total.inc();
    }

    pub fn record_game_finished(&self, tie: bool) {
        let result = if tie { "tie" } else { "decided" };
        self.game_metrics
            .games_finished_total
            .with_label_values(&[result])
            .inc();
    }

    pub fn record_game_cancelled(&self) {
        self.game_metrics.games_cancelled_total.inc();
    }

    pub fn record_results_flipped(&self) {
        self.game_metrics.results_flipped_total.inc();
    }

    pub fn record_balancing(&self, duration: Duration) {
        self.performance_metrics
            .balancing_duration
            .observe(duration.as_secs_f64());
    }

    pub fn record_rating_update(&self, duration: Duration) {
        self.performance_metrics
            .rating_update_duration
            .observe(duration.as_secs_f64());
    }

    pub fn record_notification_failure(&self) {
        self.performance_metrics.notification_failures_total.inc();
    }

    /// Create a timer for measuring operation duration
    pub fn start_timer(&self) -> MetricsTimer {
        MetricsTimer::new()
    }

    /// Render every registered metric in the Prometheus text format
    pub fn render(&self) -> Result<String> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}

/// Timer for measuring operation durations
pub struct MetricsTimer {
    start: Instant,
}

impl MetricsTimer {
    fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Get the elapsed duration
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Stop the timer and return the duration
    pub fn stop(self) -> Duration {
        self.elapsed()
    }
}

impl QueueMetrics {
    fn new(registry: &Registry) -> Result<Self> {
        let admissions_total = IntCounterVec::new(
            Opts::new("pug_room_admissions_total", "Queue admission attempts"),
            &["queue", "result"],
        )?;
        registry.register(Box::new(admissions_total.clone()))?;

        let entries_expired_total = IntCounterVec::new(
            Opts::new(
                "pug_room_queue_entries_expired_total",
                "Queue entries removed for idling",
            ),
            &["queue"],
        )?;
        registry.register(Box::new(entries_expired_total.clone()))?;

        let players_waiting = IntGaugeVec::new(
            Opts::new("pug_room_players_waiting", "Players currently waiting"),
            &["queue"],
        )?;
        registry.register(Box::new(players_waiting.clone()))?;

        Ok(Self {
            admissions_total,
            entries_expired_total,
            players_waiting,
        })
    }
}

impl GameMetrics {
    fn new(registry: &Registry) -> Result<Self> {
        let games_formed_total = IntCounterVec::new(
            Opts::new("pug_room_games_formed_total", "Total games formed"),
            &["queue", "mode"],
        )?;
        registry.register(Box::new(games_formed_total.clone()))?;

        let shuffles_total = IntCounter::new("pug_room_shuffles_total", "Total team shuffles")?;
        registry.register(Box::new(shuffles_total.clone()))?;

        let shuffle_wraps_total = IntCounter::new(
            "pug_room_shuffle_wraps_total",
            "Shuffles that wrapped to the best partition",
        )?;
        registry.register(Box::new(shuffle_wraps_total.clone()))?;

        let draft_picks_total =
            IntCounter::new("pug_room_draft_picks_total", "Total draft picks applied")?;
        registry.register(Box::new(draft_picks_total.clone()))?;

        let games_finished_total = IntCounterVec::new(
            Opts::new("pug_room_games_finished_total", "Total games finished"),
            &["result"],
        )?;
        registry.register(Box::new(games_finished_total.clone()))?;

        let games_cancelled_total =
            IntCounter::new("pug_room_games_cancelled_total", "Total games cancelled")?;
        registry.register(Box::new(games_cancelled_total.clone()))?;

        let results_flipped_total =
            IntCounter::new("pug_room_results_flipped_total", "Total results flipped")?;
        registry.register(Box::new(results_flipped_total.clone()))?;

        let match_quality = Histogram::with_opts(
            HistogramOpts::new("pug_room_match_quality", "Quality of chosen team partitions")
                .buckets(vec![0.1, 0.2, 0.3, 0.4, 0.5, 0.6, 0.7, 0.8, 0.9, 1.0]),
        )?;
        registry.register(Box::new(match_quality.clone()))?;

        Ok(Self {
            games_formed_total,
            shuffles_total,
            shuffle_wraps_total,
            draft_picks_total,
            games_finished_total,
            games_cancelled_total,
            results_flipped_total,
            match_quality,
        })
    }
}

impl PerformanceMetrics {
    fn new(registry: &Registry) -> Result<Self> {
        let balancing_duration = Histogram::with_opts(HistogramOpts::new(
            "pug_room_balancing_duration_seconds",
            "Time spent ranking team partitions",
        ))?;
        registry.register(Box::new(balancing_duration.clone()))?;

        let rating_update_duration = Histogram::with_opts(HistogramOpts::new(
            "pug_room_rating_update_duration_seconds",
            "Time spent computing rating updates",
        ))?;
        registry.register(Box::new(rating_update_duration.clone()))?;

        let notification_failures_total = IntCounter::new(
            "pug_room_notification_failures_total",
            "Notifications the publisher failed to deliver",
        )?;
        registry.register(Box::new(notification_failures_total.clone()))?;

        Ok(Self {
            balancing_duration,
            rating_update_duration,
            notification_failures_total,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_collector_creation() {
        let collector = MetricsCollector::new().expect("Failed to create metrics collector");

        let _queue = collector.queue();
        let _game = collector.game();
        let _performance = collector.performance();
    }

    #[test]
    fn test_admission_counts_by_label() {
        let collector = MetricsCollector::new().expect("Failed to create metrics collector");

        collector.record_admission(QueueKind::Quickplay, "admitted");
        collector.record_admission(QueueKind::Quickplay, "admitted");
        collector.record_admission(QueueKind::Competitive, "delayed");

        let admitted = collector
            .queue()
            .admissions_total
            .with_label_values(&["quickplay", "admitted"])
            .get();
        assert_eq!(admitted, 2);
    }

    #[test]
    fn test_game_recording() {
        let collector = MetricsCollector::new().expect("Failed to create metrics collector");

        collector.record_game_formed(QueueKind::Quickplay, Some(0.42));
        collector.record_game_formed(QueueKind::Competitive, None);
        collector.record_shuffle(0.38, true);
        collector.record_game_finished(true);

        assert_eq!(collector.game().shuffle_wraps_total.get(), 1);
        assert_eq!(collector.game().match_quality.get_sample_count(), 2);
        assert_eq!(
            collector
                .game()
                .games_formed_total
                .with_label_values(&["competitive", "draft"])
                .get(),
            1
        );
    }

    #[test]
    fn test_render_text_format() {
        let collector = MetricsCollector::new().expect("Failed to create metrics collector");
        collector.record_draft_pick();

        let text = collector.render().unwrap();
        assert!(text.contains("pug_room_draft_picks_total 1"));
    }

    #[test]
    fn test_metrics_timer() {
        let collector = MetricsCollector::new().expect("Failed to create metrics collector");
        let timer = collector.start_timer();

        std::thread::sleep(Duration::from_millis(10));
        assert!(timer.stop() >= Duration::from_millis(10));
    }
}
