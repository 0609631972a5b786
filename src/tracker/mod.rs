mod detection;
mod error;
mod sample;
mod source;
mod tracker;
mod types;

pub use error::{FrameError, TrackerError};
pub use sample::Position;
#[cfg(test)]
pub use source::FrameSequence;
pub use source::{FrameDirectory, FrameSource};
pub use tracker::{ObjectTracker, TrackerEvent};
pub use types::{ColorRange, Rgb, TrackerConfig, Viewport};

#[cfg(test)]
pub(crate) use detection::tests as testing;
