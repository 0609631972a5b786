mod error;
mod history;
mod report;
mod runner;

pub use runner::ControlLoop;
