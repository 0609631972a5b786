use chrono::{DateTime, Utc};
use serde::Serialize;

/// A tracked object position in pixels, vertical axis pointing up.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
    /// Arrival order within the tracking episode.
    pub index: usize,
    /// Frame number since the tracker started, misses included.
    pub frame: u64,
    pub seen_at: DateTime<Utc>,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            index: 0,
            frame: 0,
            seen_at: Utc::now(),
        }
    }
}
