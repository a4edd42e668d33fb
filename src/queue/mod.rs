//! Queue management
//!
//! Admission with re-queue delays, removal, status views and the idle
//! sweep that runs in the background.

pub mod manager;
pub mod sweeper;

pub use manager::{parse_selector, AdmitResult, QueueManager, QueueStatus};
pub use sweeper::start_sweeper;
