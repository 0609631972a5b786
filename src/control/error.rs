use thiserror::Error;

use crate::tracker::TrackerError;

#[derive(Debug, Error)]
pub enum LoopError {
    #[error("tracker error: {0}")]
    Tracker(#[from] TrackerError),
    #[error("control loop already finished")]
    Finished,
}

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}
