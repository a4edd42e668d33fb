//! Suggested server for a formed game

use crate::config::ServerSettings;
use crate::types::Region;
use chrono::{DateTime, Timelike, Utc};
use rand::seq::IndexedRandom;
use rand::Rng;

/// Most common declared region, ignoring players who never set one
///
/// Ties go to the region seen first.
pub fn most_common_region(regions: &[Region]) -> Option<Region> {
    let mut counts: Vec<(Region, usize)> = Vec::new();
    for region in regions.iter().filter(|r| **r != Region::NotSet) {
        match counts.iter_mut().find(|(seen, _)| seen == region) {
            Some((_, count)) => *count += 1,
            None => counts.push((*region, 1)),
        }
    }

    let mut best: Option<(Region, usize)> = None;
    for (region, count) in counts {
        if best.map_or(true, |(_, top)| count > top) {
            best = Some((region, count));
        }
    }
    best.map(|(region, _)| region)
}

/// Pick a server for the participants' regions
///
/// Europe and Australia draw from their own pools. Without any region data
/// a random North American server is used. A North American majority gets
/// the first NA server in the small hours (UTC) and the second otherwise.
pub fn pick_suggested_server<R: Rng + ?Sized>(
    regions: &[Region],
    now: DateTime<Utc>,
    settings: &ServerSettings,
    rng: &mut R,
) -> Option<String> {
    match most_common_region(regions) {
        None => settings.north_america.choose(rng).cloned(),
        Some(Region::Europe) => settings.europe.choose(rng).cloned(),
        Some(Region::Australia) => settings.australia.choose(rng).cloned(),
        Some(_) => {
            let pool = &settings.north_america;
            if now.hour() <= settings.late_night_cutoff_hour {
                pool.first().cloned()
            } else {
                pool.get(1).or_else(|| pool.first()).cloned()
            }
        }
    }
}
