//! Notification events and delivery
//!
//! The coordinator never renders or sends messages itself. It emits
//! `MatchEvent`s that a front end turns into user-facing output.

pub mod events;
pub mod publisher;

pub use events::MatchEvent;
pub use publisher::{EventPublisher, LoggingEventPublisher, Notifier};
