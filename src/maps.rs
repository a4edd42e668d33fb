//! Weighted map selection
//!
//! Maps are drawn without replacement, each remaining candidate picked with
//! probability proportional to its popularity weight.

use crate::config::{MapPoolConfig, WeightedMap};
use crate::error::{MatchmakingError, Result};
use rand::distr::weighted::WeightedIndex;
use rand::distr::Distribution;
use rand::Rng;
use std::collections::HashSet;

/// Draws distinct maps from a weighted pool
#[derive(Debug, Clone)]
pub struct MapSelector {
    maps: Vec<WeightedMap>,
}

impl MapSelector {
    /// Create a selector over a validated pool
    pub fn new(pool: &MapPoolConfig) -> Result<Self> {
        pool.validate()?;
        Ok(Self {
            maps: pool.maps.clone(),
        })
    }

    /// Number of maps in the pool
    pub fn len(&self) -> usize {
        self.maps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.maps.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.maps.iter().any(|m| m.name == name)
    }

    /// Select `n` distinct maps, none of them in `excluded`
    ///
    /// Fails with `InvalidRequest` when `n + |excluded|` exceeds the pool.
    pub fn select<R: Rng + ?Sized>(
        &self,
        n: usize,
        excluded: &[String],
        rng: &mut R,
    ) -> Result<Vec<String>> {
        let excluded: HashSet<&str> = excluded.iter().map(String::as_str).collect();

        if n + excluded.len() > self.maps.len() {
            return Err(MatchmakingError::InvalidRequest {
                reason: format!(
                    "Cannot pick {} maps excluding {} from a pool of {}",
                    n,
                    excluded.len(),
                    self.maps.len()
                ),
            });
        }

        let mut candidates: Vec<&WeightedMap> = self
            .maps
            .iter()
            .filter(|m| !excluded.contains(m.name.as_str()))
            .collect();

        let mut chosen = Vec::with_capacity(n);
        while chosen.len() < n {
            let weights = WeightedIndex::new(candidates.iter().map(|m| m.weight)).map_err(|e| {
                MatchmakingError::InternalError {
                    message: format!("Map weights rejected: {}", e),
                }
            })?;
            let index = weights.sample(rng);
            chosen.push(candidates.swap_remove(index).name.clone());
        }

        Ok(chosen)
    }

    /// Replace the map at `slot` (0-based), excluding every map currently shown
    pub fn reroll_slot<R: Rng + ?Sized>(
        &self,
        current: &[String],
        slot: usize,
        rng: &mut R,
    ) -> Result<Vec<String>> {
        if slot >= current.len() {
            return Err(MatchmakingError::InvalidMapNumber {
                map_number: slot + 1,
                available: current.len(),
            });
        }

        let mut replacement = self.select(1, current, rng)?;
        let mut maps = current.to_vec();
        if let Some(map) = replacement.pop() {
            maps[slot] = map;
        }
        Ok(maps)
    }
}
