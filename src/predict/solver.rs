use serde::Deserialize;

use crate::predict::error::SolverError;
use crate::predict::model::MotionModel;
use crate::tracker::Viewport;

const MAX_ITERATIONS: usize = 200;

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct SolverConfig {
    /// Leftmost horizontal coordinate searched.
    #[serde(default)]
    pub x0: f64,
    /// Height of the catch plane in pixels.
    #[serde(default)]
    pub target_height: f64,
    #[serde(default = "default_precision")]
    pub precision: f64,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            x0: 0.0,
            target_height: 0.0,
            precision: default_precision(),
        }
    }
}

fn default_precision() -> f64 {
    0.01
}

/// Horizontal coordinate where `model` reaches the catch plane inside the view.
pub fn falling_point(
    model: &MotionModel,
    viewport: &Viewport,
    config: &SolverConfig,
) -> Result<f64, SolverError> {
    let (left, right) = (config.x0, viewport.width);

    if model.is_vertical() {
        let (x, _) = model.origin();
        return if (left..=right).contains(&x) {
            Ok(x)
        } else {
            Err(SolverError::NoInterceptInView { left, right })
        };
    }

    bisect(
        |x| model.height_at(x),
        left,
        right,
        config.target_height,
        config.precision,
    )
}

/// Bisection for `f(x) == target` on `[left, right]`, assuming at most one
/// crossing. Fails when the endpoints do not bracket a crossing.
pub fn bisect<F>(
    f: F,
    left: f64,
    right: f64,
    target: f64,
    precision: f64,
) -> Result<f64, SolverError>
where
    F: Fn(f64) -> f64,
{
    let no_intercept = SolverError::NoInterceptInView { left, right };
    let mut low = left;
    let mut high = right;

    let f_low = f(low) - target;
    let f_high = f(high) - target;
    if f_low == 0.0 {
        return Ok(low);
    }
    if f_high == 0.0 {
        return Ok(high);
    }
    if !(f_low * f_high < 0.0) {
        return Err(no_intercept);
    }

    let low_sign = f_low.signum();
    let mut middle = (low + high) / 2.0;
    for _ in 0..MAX_ITERATIONS {
        if (high - low).abs() < precision {
            break;
        }
        let f_middle = f(middle) - target;
        if f_middle == 0.0 {
            return Ok(middle);
        }
        if f_middle.signum() == low_sign {
            low = middle;
        } else {
            high = middle;
        }
        middle = (low + high) / 2.0;
    }

    if middle.is_finite() {
        Ok(middle)
    } else {
        Err(no_intercept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::predict::model::{ModelConfig, MotionEstimator};
    use crate::tracker::Position;
    use std::time::Duration;

    const VIEW: Viewport = Viewport {
        width: 640.0,
        height: 480.0,
    };

    fn sample(x: f64, y: f64, frame: u64) -> Position {
        Position {
            frame,
            ..Position::new(x, y)
        }
    }

    #[test]
    fn converges_within_precision() {
        let root: f64 = 141.421_356_237;
        for precision in [1.0, 0.1, 0.01, 0.001] {
            let x = bisect(|x| root - x, 0.0, 640.0, 0.0, precision).unwrap();
            assert!((x - root).abs() <= precision / 2.0, "precision {precision}: {x}");
        }
    }

    #[test]
    fn tighter_precision_tightens_the_bound() {
        let root: f64 = 87.654_321;
        let mut previous_bound = f64::INFINITY;
        for precision in [4.0, 1.0, 0.25, 0.01, 0.0001] {
            let x = bisect(|x| 3.0 * (root - x), 0.0, 640.0, 0.0, precision).unwrap();
            let bound = precision / 2.0;
            assert!((x - root).abs() <= bound, "precision {precision}: {x}");
            assert!(bound < previous_bound);
            previous_bound = bound;
        }
    }

    #[test]
    fn root_on_a_midpoint_is_returned_exactly() {
        assert_eq!(bisect(|x| 320.0 - 2.0 * x, 0.0, 640.0, 0.0, 0.01), Ok(160.0));
        assert_eq!(bisect(|x| 300.0 - 2.0 * x, 0.0, 640.0, 0.0, 0.01).map(|x| (x - 150.0).abs() < 0.01), Ok(true));
        assert_eq!(bisect(|x| x - 320.0, 0.0, 640.0, 0.0, 0.01), Ok(320.0));
    }

    #[test]
    fn respects_target_height() {
        let x = bisect(|x| 400.0 - 2.0 * x, 0.0, 640.0, 100.0, 0.01).unwrap();
        assert!((x - 150.0).abs() < 0.01, "{x}");
    }

    #[test]
    fn decreasing_and_increasing_crossings() {
        let down = bisect(|x| 500.0 - x, 0.0, 640.0, 0.0, 0.001).unwrap();
        let up = bisect(|x| x - 500.0, 0.0, 640.0, 0.0, 0.001).unwrap();
        assert!((down - 500.0).abs() < 0.001);
        assert!((up - 500.0).abs() < 0.001);
    }

    #[test]
    fn constant_model_above_plane_has_no_intercept() {
        let result = bisect(|_| 50.0, 0.0, 640.0, 0.0, 0.01);
        assert_eq!(
            result,
            Err(SolverError::NoInterceptInView {
                left: 0.0,
                right: 640.0
            })
        );
    }

    #[test]
    fn no_sign_change_is_never_an_endpoint() {
        assert!(bisect(|x| -1.0 - x, 0.0, 640.0, 0.0, 0.01).is_err());
        assert!(bisect(|x| (x - 320.0).powi(2) + 1.0, 0.0, 640.0, 0.0, 0.01).is_err());
    }

    #[test]
    fn root_on_endpoint() {
        assert_eq!(bisect(|x| x, 0.0, 640.0, 0.0, 0.01), Ok(0.0));
        assert_eq!(bisect(|x| 640.0 - x, 0.0, 640.0, 0.0, 0.01), Ok(640.0));
    }

    #[test]
    fn nan_model_has_no_intercept() {
        assert!(bisect(|_| f64::NAN, 0.0, 640.0, 0.0, 0.01).is_err());
    }

    #[test]
    fn falling_point_of_fitted_model() {
        let estimator = MotionEstimator::new(&ModelConfig {
            gravity: 9.81,
            frame_interval: Duration::from_millis(20),
        });
        let scale: f64 = 200.0;
        let g: f64 = 9.81 * scale;
        let (vx, vy, y0): (f64, f64, f64) = (150.0, 0.0, 400.0);
        let at = |t: f64| (vx * t, y0 + vy * t - 0.5 * g * t * t);
        let (xa, ya) = at(0.02);
        let (xb, yb) = at(0.04);
        let model = estimator
            .fit(&sample(xb, yb, 2), &sample(xa, ya, 1), scale)
            .unwrap();

        let expected = vx * (2.0 * y0 / g).sqrt();
        let x = falling_point(&model, &VIEW, &SolverConfig::default()).unwrap();
        assert!((x - expected).abs() < 0.01, "{x} vs {expected}");
    }

    #[test]
    fn vertical_drop_lands_below_object() {
        let estimator = MotionEstimator::new(&ModelConfig::default());
        let model = estimator
            .fit(&sample(200.0, 300.0, 1), &sample(200.0, 320.0, 0), 100.0)
            .unwrap();
        assert_eq!(falling_point(&model, &VIEW, &SolverConfig::default()), Ok(200.0));

        let outside = estimator
            .fit(&sample(700.0, 300.0, 1), &sample(700.0, 320.0, 0), 100.0)
            .unwrap();
        assert!(falling_point(&outside, &VIEW, &SolverConfig::default()).is_err());
    }
}
