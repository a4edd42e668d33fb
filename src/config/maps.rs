//! Map pool configuration

use serde::{Deserialize, Serialize};

/// A map and its static popularity weight
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightedMap {
    pub name: String,
    pub weight: f64,
}

/// The pool maps are rolled from
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MapPoolConfig {
    pub maps: Vec<WeightedMap>,
}

impl Default for MapPoolConfig {
    fn default() -> Self {
        let maps = [
            ("exhumed", 1.0),
            ("elite", 1.0),
            ("brynhildr", 0.8),
            ("minora", 1.0),
            ("ingonyama", 0.9),
            ("twilightgrove", 0.7),
            ("kryosis", 0.8),
            ("nightflare", 0.9),
            ("outpost", 1.0),
            ("forlorn", 0.6),
            ("relay", 0.6),
            ("sunward", 0.5),
            ("yolandi", 0.5),
        ]
        .into_iter()
        .map(|(name, weight)| WeightedMap {
            name: name.to_string(),
            weight,
        })
        .collect();

        Self { maps }
    }
}

impl MapPoolConfig {
    pub fn validate(&self) -> crate::error::Result<()> {
        let fail = |message: String| {
            Err(crate::error::MatchmakingError::ConfigurationError { message })
        };

        if self.maps.is_empty() {
            return fail("Map pool cannot be empty".to_string());
        }

        let mut seen = std::collections::HashSet::new();
        for map in &self.maps {
            if !(map.weight > 0.0 && map.weight.is_finite()) {
                return fail(format!("Map {} must have a positive weight", map.name));
            }
            if !seen.insert(map.name.as_str()) {
                return fail(format!("Map {} is listed twice", map.name));
            }
        }

        Ok(())
    }
}
