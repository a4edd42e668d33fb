//! Configuration management for the pug-room coordinator
//!
//! This module handles configuration loading from TOML files and environment
//! variables, validation, and default values.

pub mod app;
pub mod maps;
pub mod queue;
pub mod rating;
pub mod servers;

// Re-export commonly used types
pub use app::{validate_config, AppConfig, ServiceSettings};
pub use maps::{MapPoolConfig, WeightedMap};
pub use queue::{GameSettings, QueueSettings};
pub use rating::RatingConfig;
pub use servers::ServerSettings;
