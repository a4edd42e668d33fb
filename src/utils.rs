//! Utility functions for the coordinator

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Generate a new unique game ID
pub fn generate_game_id() -> Uuid {
    Uuid::new_v4()
}

/// Get the current UTC timestamp
pub fn current_timestamp() -> DateTime<Utc> {
    Utc::now()
}

/// Seconds left until `target`, rounded up, or `None` once it has passed
pub fn seconds_until(target: DateTime<Utc>, now: DateTime<Utc>) -> Option<u64> {
    let remaining = target - now;
    if remaining <= chrono::Duration::zero() {
        return None;
    }
    let millis = remaining.num_milliseconds() as u64;
    Some(millis.div_ceil(1000))
}
