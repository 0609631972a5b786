use serde::Serialize;
use strum_macros::Display;

use super::error::LoopError;
use super::history::SampleHistory;
use super::report::{ExitReason, Prediction, RunReport};
use crate::actuator::{ActuatorController, CommandChannel};
use crate::cancel::CancelToken;
use crate::config::Config;
use crate::predict::{falling_point, EstimatorError, MotionEstimator};
use crate::tracker::{FrameError, FrameSource, ObjectTracker, Position, TrackerError, TrackerEvent};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize)]
pub enum LoopState {
    Idle,
    AwaitingAcquisition,
    Tracking,
    Done,
}

/// Drives tracker, estimator, solver and actuator once per frame.
pub struct ControlLoop<'a, S: FrameSource, C: CommandChannel> {
    config: &'a Config,
    tracker: ObjectTracker<S>,
    controller: ActuatorController<C>,
    estimator: MotionEstimator,
    history: SampleHistory,
    state: LoopState,
}

impl<'a, S: FrameSource, C: CommandChannel> ControlLoop<'a, S, C> {
    pub fn new(config: &'a Config, tracker: ObjectTracker<S>, controller: ActuatorController<C>) -> Self {
        Self {
            config,
            tracker,
            controller,
            estimator: MotionEstimator::new(&config.model),
            history: SampleHistory::new(),
            state: LoopState::Idle,
        }
    }

    #[cfg(test)]
    pub fn state(&self) -> LoopState {
        self.state
    }

    /// Runs one tracking episode. The frame source and the command channel are
    /// released on every exit path, so a finished loop cannot be run again.
    pub fn run(&mut self, cancel: &CancelToken) -> Result<RunReport, LoopError> {
        if self.state == LoopState::Done {
            return Err(LoopError::Finished);
        }
        let mut report = RunReport::new();
        self.history.start_episode();
        self.transition(LoopState::AwaitingAcquisition);

        let result = match self.tracker.start() {
            Ok(()) => self.drive(&mut report, cancel),
            Err(e) => Err(e.into()),
        };

        self.tracker.stop();
        self.controller.close();
        self.transition(LoopState::Done);

        let exit = result?;
        report.finish(exit, self.history.samples());
        log::info!(
            "Run finished ({:?}): {} positions, {} predictions, {} skipped, {} unreachable",
            exit,
            report.positions.len(),
            report.predictions.len(),
            report.skipped_no_intercept,
            report.unreachable
        );
        Ok(report)
    }

    fn transition(&mut self, next: LoopState) {
        if self.state != next {
            log::debug!("Control loop {} -> {}", self.state, next);
            self.state = next;
        }
    }

    fn drive(&mut self, report: &mut RunReport, cancel: &CancelToken) -> Result<ExitReason, LoopError> {
        loop {
            if cancel.is_cancelled() {
                return Ok(ExitReason::Cancelled);
            }

            let event = match self.tracker.poll() {
                Ok(event) => event,
                Err(TrackerError::Frame(FrameError::EndOfStream)) => return Ok(ExitReason::EndOfStream),
                Err(TrackerError::Frame(FrameError::Decode(e))) => {
                    log::warn!("Skipping undecodable frame: {}", e);
                    continue;
                }
                Err(e) => return Err(e.into()),
            };

            self.handle(event, report);
            if self.state == LoopState::Tracking && !self.tracker.is_in_range() {
                return Ok(ExitReason::TrackingLost);
            }
        }
    }

    fn handle(&mut self, event: TrackerEvent, report: &mut RunReport) {
        match event {
            TrackerEvent::Searching | TrackerEvent::Missed { .. } | TrackerEvent::Lost => {}
            TrackerEvent::Acquired(position) => {
                self.history.start_episode();
                self.transition(LoopState::Tracking);
                self.step(position, report);
            }
            TrackerEvent::Found(position) => self.step(position, report),
        }
    }

    fn step(&mut self, position: Position, report: &mut RunReport) {
        let sample_index = self.history.record(position).index;
        let calibration = &self.config.calibration;

        let model = match self
            .estimator
            .fit_latest(self.history.samples(), calibration.px_per_meter)
        {
            Ok(model) => {
                let (vx, vy) = model.velocity();
                log::debug!("Sample {}: v=({:.1}, {:.1}) px/s", sample_index, vx, vy);
                model
            }
            Err(EstimatorError::InsufficientSamples(_)) => return,
            Err(e) => {
                log::warn!("Model fit failed: {}", e);
                return;
            }
        };

        let Some(viewport) = self.tracker.viewport() else {
            return;
        };

        let x_fall = match falling_point(&model, &viewport, &self.config.solver) {
            Ok(x) => x,
            Err(e) => {
                log::debug!("Sample {}: {}", sample_index, e);
                report.skipped_no_intercept += 1;
                return;
            }
        };

        let command = self.controller.command_for(x_fall);
        let delivered = match self.controller.dispatch(command) {
            Ok(ack) => {
                log::debug!(
                    "Sample {}: x_fall={:.2}px -> {} ticks ({} attempts)",
                    sample_index,
                    x_fall,
                    command.ticks,
                    ack.attempts
                );
                true
            }
            Err(e) => {
                log::error!("{}", e);
                report.unreachable += 1;
                false
            }
        };

        report.predictions.push(Prediction {
            sample_index,
            x_fall,
            ticks: command.ticks,
            delivered,
        });
    }
}
