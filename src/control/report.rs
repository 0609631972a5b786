use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::error::ReportError;
use crate::tracker::Position;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitReason {
    TrackingLost,
    Cancelled,
    EndOfStream,
}

#[derive(Debug, Clone, Serialize)]
pub struct Prediction {
    pub sample_index: usize,
    pub x_fall: f64,
    pub ticks: i64,
    pub delivered: bool,
}

/// Everything a run observed and decided, kept for post-run diagnostics.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub exit: Option<ExitReason>,
    pub positions: Vec<Position>,
    pub predictions: Vec<Prediction>,
    pub skipped_no_intercept: usize,
    pub unreachable: usize,
}

impl RunReport {
    pub fn new() -> Self {
        Self {
            started_at: Utc::now(),
            finished_at: None,
            exit: None,
            positions: Vec::new(),
            predictions: Vec::new(),
            skipped_no_intercept: 0,
            unreachable: 0,
        }
    }

    pub fn finish(&mut self, exit: ExitReason, positions: &[Position]) {
        self.exit = Some(exit);
        self.finished_at = Some(Utc::now());
        self.positions = positions.to_vec();
    }

    pub fn save(&self, path: &Path) -> Result<(), ReportError> {
        fs::write(path, serde_yaml::to_string(self)?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_to_yaml() {
        let mut report = RunReport::new();
        report.predictions.push(Prediction {
            sample_index: 1,
            x_fall: 312.5,
            ticks: 4100,
            delivered: true,
        });
        report.finish(ExitReason::TrackingLost, &[Position::new(10.0, 20.0)]);

        let yaml = serde_yaml::to_string(&report).unwrap();
        assert!(yaml.contains("exit: tracking_lost"));
        assert!(yaml.contains("ticks: 4100"));
        assert!(yaml.contains("x: 10.0"));
    }
}
