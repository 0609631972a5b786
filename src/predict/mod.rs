mod error;
mod model;
mod solver;

pub use error::EstimatorError;
pub use model::{ModelConfig, MotionEstimator};
pub use solver::{falling_point, SolverConfig};
