use serde::{Deserialize, Serialize};

/// An RGB triple as stored in calibration files.
pub type Rgb = [u8; 3];

/// Inclusive per-channel bounds for the object's color.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Serialize)]
pub struct ColorRange {
    pub lower: Rgb,
    pub upper: Rgb,
}

impl ColorRange {
    pub fn new(lower: Rgb, upper: Rgb) -> Self {
        Self { lower, upper }
    }

    /// Builds a range centered on `color`, saturating at the channel limits.
    #[cfg(test)]
    pub fn around(color: Rgb, tolerance: u8) -> Self {
        Self {
            lower: color.map(|c| c.saturating_sub(tolerance)),
            upper: color.map(|c| c.saturating_add(tolerance)),
        }
    }

    pub fn contains(&self, pixel: Rgb) -> bool {
        pixel
            .iter()
            .zip(self.lower.iter().zip(self.upper.iter()))
            .all(|(p, (lo, hi))| lo <= p && p <= hi)
    }

    pub fn is_empty(&self) -> bool {
        self.lower.iter().zip(self.upper.iter()).any(|(lo, hi)| lo > hi)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct TrackerConfig {
    /// Minimum number of matching pixels for a detection.
    #[serde(default = "default_min_area")]
    pub min_area: usize,
    /// Consecutive misses tolerated before the object counts as lost.
    #[serde(default = "default_retry_budget")]
    pub retry_budget: u32,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            min_area: default_min_area(),
            retry_budget: default_retry_budget(),
        }
    }
}

fn default_min_area() -> usize {
    20
}

fn default_retry_budget() -> u32 {
    5
}
