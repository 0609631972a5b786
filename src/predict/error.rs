use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum EstimatorError {
    #[error("at least two distinct samples are needed, got {0}")]
    InsufficientSamples(usize),
    #[error("invalid scale ratio: {0} px/m")]
    InvalidScale(f64),
}

#[derive(Debug, Error, PartialEq)]
pub enum SolverError {
    #[error("trajectory does not cross the catch plane within [{left}, {right}]")]
    NoInterceptInView { left: f64, right: f64 },
}
