//! Rating system configuration

use serde::{Deserialize, Serialize};

/// TrueSkill parameters used for quality scoring and rating updates
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RatingConfig {
    /// Initial mean for new players
    pub initial_rating: f64,
    /// Initial uncertainty for new players
    pub initial_uncertainty: f64,
    /// Skill distance that gives the stronger side ~76% win chance
    pub beta: f64,
    /// Uncertainty added before every update
    pub dynamics: f64,
    /// Probability of a tie between equal teams
    pub draw_probability: f64,
}

impl Default for RatingConfig {
    fn default() -> Self {
        Self {
            initial_rating: 25.0,
            initial_uncertainty: 25.0 / 3.0,
            beta: 25.0 / 6.0,
            dynamics: 25.0 / 300.0,
            draw_probability: 0.1,
        }
    }
}

impl RatingConfig {
    /// Validate configuration parameters
    pub fn validate(&self) -> crate::error::Result<()> {
        let fail = |message: &str| {
            Err(crate::error::MatchmakingError::ConfigurationError {
                message: message.to_string(),
            })
        };

        if self.beta <= 0.0 {
            return fail("Beta must be positive");
        }
        if self.initial_uncertainty <= 0.0 {
            return fail("Initial uncertainty must be positive");
        }
        if self.dynamics < 0.0 {
            return fail("Dynamics must be non-negative");
        }
        if !(0.0..1.0).contains(&self.draw_probability) {
            return fail("Draw probability must be in [0, 1)");
        }

        Ok(())
    }
}
