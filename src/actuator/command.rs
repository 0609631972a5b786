use serde::Serialize;

use crate::config::CalibrationData;

/// Absolute carriage target in encoder ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ActuatorCommand {
    pub ticks: i64,
}

/// Pixels to meters to encoder ticks, rounded to the nearest tick.
pub fn predicted_to_command(x_fall: f64, scale_ratio: f64, encoder_ratio: f64) -> ActuatorCommand {
    let meters = x_fall / scale_ratio;
    ActuatorCommand {
        ticks: (meters * encoder_ratio).round() as i64,
    }
}

/// Maps image columns onto the rail and keeps targets within its travel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RailGeometry {
    px_per_meter: f64,
    ticks_per_meter: f64,
    origin_px: f64,
    max_ticks: i64,
}

impl RailGeometry {
    pub fn new(calibration: &CalibrationData) -> Self {
        Self {
            px_per_meter: calibration.px_per_meter,
            ticks_per_meter: calibration.ticks_per_meter,
            origin_px: calibration.rail_origin * calibration.px_per_meter,
            max_ticks: (calibration.rail_length * calibration.ticks_per_meter).round() as i64,
        }
    }

    /// Command for a predicted impact column, and whether it had to be clamped.
    pub fn command_for(&self, x_fall: f64) -> (ActuatorCommand, bool) {
        let raw = predicted_to_command(x_fall - self.origin_px, self.px_per_meter, self.ticks_per_meter);
        let ticks = raw.ticks.clamp(0, self.max_ticks);
        (ActuatorCommand { ticks }, ticks != raw.ticks)
    }
}
