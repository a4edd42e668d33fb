//! Suggested server pools

use serde::{Deserialize, Serialize};

/// Server pools per region
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// First entry is preferred in the small hours, second otherwise
    pub north_america: Vec<String>,
    pub europe: Vec<String>,
    pub australia: Vec<String>,
    /// Last UTC hour (inclusive) in which the first NA server is preferred
    pub late_night_cutoff_hour: u32,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            north_america: vec!["Chicago PUG".to_string(), "Los Angeles PUG".to_string()],
            europe: vec!["London PUG".to_string()],
            australia: vec!["Sydney PUG".to_string()],
            late_night_cutoff_hour: 3,
        }
    }
}

impl ServerSettings {
    pub fn validate(&self) -> crate::error::Result<()> {
        if self.north_america.is_empty() || self.europe.is_empty() || self.australia.is_empty() {
            return Err(crate::error::MatchmakingError::ConfigurationError {
                message: "Every region needs at least one server".to_string(),
            });
        }
        if self.late_night_cutoff_hour > 23 {
            return Err(crate::error::MatchmakingError::ConfigurationError {
                message: "Late night cutoff must be an hour of the day".to_string(),
            });
        }
        Ok(())
    }
}
