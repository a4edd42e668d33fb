//! Main application configuration
//!
//! This module defines the primary configuration structures for the pug-room
//! coordinator, including TOML/environment loading and validation.

use crate::config::maps::MapPoolConfig;
use crate::config::queue::{GameSettings, QueueSettings};
use crate::config::rating::RatingConfig;
use crate::config::servers::ServerSettings;
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub service: ServiceSettings,
    pub queue: QueueSettings,
    pub game: GameSettings,
    pub rating: RatingConfig,
    pub maps: MapPoolConfig,
    pub servers: ServerSettings,
}

/// Service-level settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceSettings {
    /// Service name for logging and metrics
    pub name: String,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// How often idle queue entries are swept
    pub sweep_interval_seconds: u64,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            name: "pug-room".to_string(),
            log_level: "info".to_string(),
            sweep_interval_seconds: 5,
        }
    }
}

fn parse_env<T: FromStr>(key: &str) -> Result<Option<T>> {
    match env::var(key) {
        Ok(value) => value
            .parse()
            .map(Some)
            .map_err(|_| anyhow!("Invalid {} value: {}", key, value)),
        Err(_) => Ok(None),
    }
}

impl AppConfig {
    /// Load configuration from environment variables with fallback to defaults
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_env_overrides()?;
        validate_config(&config)?;
        Ok(config)
    }

    /// Load configuration from a TOML file, then apply environment overrides
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let mut config: AppConfig = toml::from_str(&raw)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        config.apply_env_overrides()?;
        validate_config(&config)?;
        Ok(config)
    }

    fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(name) = env::var("PUG_SERVICE_NAME") {
            self.service.name = name;
        }
        if let Ok(log_level) = env::var("PUG_LOG_LEVEL") {
            self.service.log_level = log_level;
        }
        if let Some(interval) = parse_env("PUG_SWEEP_INTERVAL_SECONDS")? {
            self.service.sweep_interval_seconds = interval;
        }

        if let Some(capacity) = parse_env("PUG_QUEUE_CAPACITY")? {
            self.queue.capacity = capacity;
        }
        if let Some(idle) = parse_env("PUG_IDLE_TIMEOUT_SECONDS")? {
            self.queue.idle_timeout_seconds = idle;
        }
        if let Some(delay) = parse_env("PUG_REQUEUE_DELAY_SECONDS")? {
            self.queue.requeue_delay_seconds = delay;
        }

        if let Some(team_size) = parse_env("PUG_TEAM_SIZE")? {
            self.game.team_size = team_size;
        }
        if let Some(limit) = parse_env("PUG_SHUFFLE_LIMIT")? {
            self.game.shuffle_limit = limit;
        }

        Ok(())
    }

    /// Get the idle sweep interval as Duration
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.service.sweep_interval_seconds)
    }
}

/// Validate configuration values
pub fn validate_config(config: &AppConfig) -> Result<()> {
    match config.service.log_level.to_lowercase().as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => {}
        _ => return Err(anyhow!("Invalid log level: {}", config.service.log_level)),
    }

    if config.service.sweep_interval_seconds == 0 {
        return Err(anyhow!("Sweep interval must be greater than 0"));
    }

    if config.game.team_size == 0 {
        return Err(anyhow!("Team size must be greater than 0"));
    }
    if config.queue.capacity != config.game.team_size * 2 {
        return Err(anyhow!(
            "Queue capacity {} must fill exactly two teams of {}",
            config.queue.capacity,
            config.game.team_size
        ));
    }
    // Partitions are enumerated as bitmasks over the roster
    if config.queue.capacity > 20 {
        return Err(anyhow!("Queue capacity cannot exceed 20 players"));
    }
    if config.game.shuffle_limit == 0 {
        return Err(anyhow!("Shuffle limit must be greater than 0"));
    }
    if config.queue.idle_timeout_seconds == 0 {
        return Err(anyhow!("Idle timeout must be greater than 0"));
    }

    let map_count = config.game.balanced_map_count.max(config.game.draft_map_count);
    if map_count == 0 || map_count > config.maps.maps.len() {
        return Err(anyhow!(
            "Games need between 1 and {} maps, got {}",
            config.maps.maps.len(),
            map_count
        ));
    }

    config.rating.validate()?;
    config.maps.validate()?;
    config.servers.validate()?;

    Ok(())
}
