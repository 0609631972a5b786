use serde::Deserialize;
use std::time::Duration;

use crate::predict::error::EstimatorError;
use crate::tracker::Position;

const VERTICAL_EPSILON_PX: f64 = 1e-6;

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ModelConfig {
    /// Gravitational acceleration in m/s².
    #[serde(default = "default_gravity")]
    pub gravity: f64,
    /// Time between two consecutive frames.
    #[serde(default = "default_frame_interval", with = "crate::duration")]
    pub frame_interval: Duration,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            gravity: default_gravity(),
            frame_interval: default_frame_interval(),
        }
    }
}

fn default_gravity() -> f64 {
    9.81
}

fn default_frame_interval() -> Duration {
    Duration::from_millis(33)
}

/// Free-fall trajectory in pixel space, anchored on the latest sample.
///
/// Horizontal motion is uniform, vertical motion uniformly accelerated. The
/// model is a function of the horizontal coordinate only; a sample pair with
/// no horizontal displacement yields a vertical drop model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionModel {
    origin_x: f64,
    origin_y: f64,
    /// Horizontal velocity in px/s.
    vx: f64,
    /// Vertical velocity at the latest sample in px/s.
    vy: f64,
    /// Gravity in px/s².
    g: f64,
}

impl MotionModel {
    /// Predicted vertical coordinate at horizontal coordinate `x`.
    pub fn height_at(&self, x: f64) -> f64 {
        if self.is_vertical() {
            return self.origin_y;
        }
        let t = (x - self.origin_x) / self.vx;
        self.origin_y + self.vy * t - 0.5 * self.g * t * t
    }

    pub fn is_vertical(&self) -> bool {
        self.vx == 0.0
    }

    pub fn origin(&self) -> (f64, f64) {
        (self.origin_x, self.origin_y)
    }

    pub fn velocity(&self) -> (f64, f64) {
        (self.vx, self.vy)
    }
}

pub struct MotionEstimator {
    gravity: f64,
    dt: f64,
}

impl MotionEstimator {
    pub fn new(config: &ModelConfig) -> Self {
        Self {
            gravity: config.gravity,
            dt: config.frame_interval.as_secs_f64(),
        }
    }

    /// Fits a model to the two most recent samples of `samples`.
    pub fn fit_latest(
        &self,
        samples: &[Position],
        scale_ratio: f64,
    ) -> Result<MotionModel, EstimatorError> {
        match samples {
            [.., previous, latest] => self.fit(latest, previous, scale_ratio),
            _ => Err(EstimatorError::InsufficientSamples(samples.len())),
        }
    }

    pub fn fit(
        &self,
        latest: &Position,
        previous: &Position,
        scale_ratio: f64,
    ) -> Result<MotionModel, EstimatorError> {
        if latest.frame == previous.frame {
            return Err(EstimatorError::InsufficientSamples(1));
        }
        if !(scale_ratio.is_finite() && scale_ratio > 0.0) {
            return Err(EstimatorError::InvalidScale(scale_ratio));
        }

        let steps = latest.frame.abs_diff(previous.frame) as f64;
        let dt = self.dt * steps;
        let g = self.gravity * scale_ratio;

        let dx = latest.x - previous.x;
        let vx = if dx.abs() < VERTICAL_EPSILON_PX { 0.0 } else { dx / dt };
        // Mean velocity over the interval equals the instantaneous one at its midpoint.
        let vy = (latest.y - previous.y) / dt - 0.5 * g * dt;

        Ok(MotionModel {
            origin_x: latest.x,
            origin_y: latest.y,
            vx,
            vy,
            g,
        })
    }
}
