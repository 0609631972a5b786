use image::RgbImage;
use serde::Serialize;
use strum_macros::Display;

use super::detection::locate;
use super::error::TrackerError;
use super::sample::Position;
use super::source::FrameSource;
use super::types::{ColorRange, TrackerConfig, Viewport};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize)]
pub enum TrackerState {
    Searching,
    InRange,
    OutOfRange,
}

/// Outcome of one tracker poll.
#[derive(Debug, Clone, PartialEq)]
pub enum TrackerEvent {
    /// The object entered the view; a new tracking episode begins.
    Acquired(Position),
    Found(Position),
    /// Missed while in range, still inside the retry budget.
    Missed { consecutive: u32 },
    /// Retry budget exhausted.
    Lost,
    /// Nothing seen and no episode in progress.
    Searching,
}

pub struct ObjectTracker<S: FrameSource> {
    source: S,
    color: ColorRange,
    config: TrackerConfig,
    state: TrackerState,
    misses: u32,
    viewport: Option<Viewport>,
    frames: u64,
    open: bool,
}

impl<S: FrameSource> ObjectTracker<S> {
    pub fn new(source: S, color: ColorRange, config: &TrackerConfig) -> Self {
        Self {
            source,
            color,
            config: config.clone(),
            state: TrackerState::Searching,
            misses: 0,
            viewport: None,
            frames: 0,
            open: false,
        }
    }

    pub fn start(&mut self) -> Result<(), TrackerError> {
        self.state = TrackerState::Searching;
        self.misses = 0;
        self.frames = 0;
        self.source.open()?;
        self.open = true;
        Ok(())
    }

    pub fn stop(&mut self) {
        if self.open {
            self.source.close();
            self.open = false;
        }
        self.state = TrackerState::Searching;
        self.misses = 0;
    }

    #[cfg(test)]
    pub fn state(&self) -> TrackerState {
        self.state
    }

    pub fn is_in_range(&self) -> bool {
        self.state == TrackerState::InRange
    }

    /// Field of view, known once a frame has been seen.
    pub fn viewport(&self) -> Option<Viewport> {
        self.viewport
    }

    pub fn acquire(&self, frame: &RgbImage) -> Result<Position, TrackerError> {
        locate(frame, &self.color, self.config.min_area)
    }

    /// Pulls one frame and advances the in/out-of-range state machine.
    pub fn poll(&mut self) -> Result<TrackerEvent, TrackerError> {
        let frame_number = self.frames;
        self.frames += 1;
        let frame = self.source.next_frame()?;
        self.viewport = Some(Viewport {
            width: frame.width() as f64,
            height: frame.height() as f64,
        });

        match self.acquire(&frame) {
            Ok(position) => Ok(self.on_found(Position {
                frame: frame_number,
                ..position
            })),
            Err(TrackerError::NotFound) => Ok(self.on_missed()),
            Err(e) => Err(e),
        }
    }

    fn on_found(&mut self, position: Position) -> TrackerEvent {
        self.misses = 0;
        let previous = self.state;
        self.state = TrackerState::InRange;
        if previous == TrackerState::InRange {
            TrackerEvent::Found(position)
        } else {
            log::info!("Object acquired at ({:.1}, {:.1})", position.x, position.y);
            TrackerEvent::Acquired(position)
        }
    }

    fn on_missed(&mut self) -> TrackerEvent {
        if self.state != TrackerState::InRange {
            return TrackerEvent::Searching;
        }

        self.misses += 1;
        if self.misses > self.config.retry_budget {
            log::info!("Tracking lost after {} consecutive misses", self.misses);
            self.state = TrackerState::OutOfRange;
            self.misses = 0;
            TrackerEvent::Lost
        } else {
            log::debug!("Object missed ({}/{})", self.misses, self.config.retry_budget);
            TrackerEvent::Missed {
                consecutive: self.misses,
            }
        }
    }
}
