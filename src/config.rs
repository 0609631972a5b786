use serde::Deserialize;
use thiserror::Error;

use crate::actuator::ActuatorConfig;
use crate::predict::{ModelConfig, SolverConfig};
use crate::tracker::{ColorRange, Rgb, TrackerConfig};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub calibration: CalibrationData,
    #[serde(default)]
    pub tracker: TrackerConfig,
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub solver: SolverConfig,
    #[serde(default)]
    pub actuator: ActuatorConfig,
}

/// Results of the calibration routines, read-only for the whole run.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct CalibrationData {
    pub color_lower: Rgb,
    pub color_upper: Rgb,
    pub px_per_meter: f64,
    pub ticks_per_meter: f64,
    /// Rail travel in meters.
    pub rail_length: f64,
    /// Distance in meters from image column 0 to the rail's zero position.
    #[serde(default)]
    pub rail_origin: f64,
}

impl CalibrationData {
    pub fn color_range(&self) -> ColorRange {
        ColorRange::new(self.color_lower, self.color_upper)
    }
}

impl Config {
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    pub fn from_str(yaml: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: &str| Err(ConfigError::Invalid(msg.into()));
        let cal = &self.calibration;

        if cal.color_range().is_empty() {
            return invalid("color_lower exceeds color_upper");
        }
        if !(cal.px_per_meter > 0.0) {
            return invalid("px_per_meter must be positive");
        }
        if !(cal.ticks_per_meter > 0.0) {
            return invalid("ticks_per_meter must be positive");
        }
        if !(cal.rail_length > 0.0) {
            return invalid("rail_length must be positive");
        }
        if !(self.model.gravity > 0.0) || self.model.frame_interval.is_zero() {
            return invalid("gravity and frame_interval must be positive");
        }
        if !(self.solver.precision > 0.0) {
            return invalid("solver precision must be positive");
        }
        if self.actuator.retry.max_attempts == 0 {
            return invalid("max_attempts must be at least 1");
        }
        Ok(())
    }
}
