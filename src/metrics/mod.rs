//! Metrics for the pug-room coordinator
//!
//! Prometheus counters and histograms describing queue, game and
//! notification activity.

pub mod collector;

pub use collector::{GameMetrics, MetricsCollector, MetricsTimer, PerformanceMetrics, QueueMetrics};
