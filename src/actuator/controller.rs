use serde::Deserialize;
use std::thread;
use std::time::Duration;

use super::channel::CommandChannel;
use super::command::{ActuatorCommand, RailGeometry};
use super::error::{ActuatorError, ChannelError};
use crate::config::CalibrationData;

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ActuatorConfig {
    /// `tcp://host:port` or a serial device path.
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default = "default_timeout", with = "crate::duration")]
    pub timeout: Duration,
    /// Line speed when `endpoint` is a device path.
    #[serde(default = "default_baud_rate")]
    pub baud_rate: u32,
    #[serde(flatten)]
    pub retry: RetryPolicy,
}

impl Default for ActuatorConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            timeout: default_timeout(),
            baud_rate: default_baud_rate(),
            retry: RetryPolicy::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq)]
pub struct RetryPolicy {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_backoff", with = "crate::duration")]
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            backoff: default_backoff(),
        }
    }
}

fn default_timeout() -> Duration {
    Duration::from_millis(200)
}

fn default_baud_rate() -> u32 {
    230_400
}

fn default_max_attempts() -> u32 {
    3
}

fn default_backoff() -> Duration {
    Duration::from_millis(10)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ack {
    pub attempts: u32,
}

pub struct ActuatorController<C: CommandChannel> {
    channel: C,
    retry: RetryPolicy,
    rail: RailGeometry,
}

impl<C: CommandChannel> ActuatorController<C> {
    pub fn new(channel: C, calibration: &CalibrationData, retry: RetryPolicy) -> Self {
        Self {
            channel,
            retry,
            rail: RailGeometry::new(calibration),
        }
    }

    /// Command for a predicted impact column, clamped to the rail.
    pub fn command_for(&self, x_fall: f64) -> ActuatorCommand {
        let (command, clamped) = self.rail.command_for(x_fall);
        if clamped {
            log::warn!("Target x={:.1}px is off the rail, clamped to {} ticks", x_fall, command.ticks);
        }
        command
    }

    /// Sends `command`, retrying transient failures up to the policy's bound.
    pub fn dispatch(&mut self, command: ActuatorCommand) -> Result<Ack, ActuatorError> {
        let max_attempts = self.retry.max_attempts.max(1);
        let mut last = ChannelError::Closed;

        for attempt in 1..=max_attempts {
            match self.channel.set_position(command.ticks) {
                Ok(()) => return Ok(Ack { attempts: attempt }),
                Err(e) => {
                    log::warn!(
                        "Dispatch of {} ticks failed (attempt {}/{}): {}",
                        command.ticks,
                        attempt,
                        max_attempts,
                        e
                    );
                    last = e;
                    if attempt < max_attempts && !self.retry.backoff.is_zero() {
                        thread::sleep(self.retry.backoff);
                    }
                }
            }
        }

        if let Err(e) = self.channel.reset() {
            log::warn!("Failed to reset actuator channel: {}", e);
        }

        Err(ActuatorError::Unreachable {
            attempts: max_attempts,
            last,
        })
    }

    pub fn close(&mut self) {
        self.channel.close();
    }

    #[cfg(test)]
    pub(crate) fn channel(&self) -> &C {
        &self.channel
    }
}
