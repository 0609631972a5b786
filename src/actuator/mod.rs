mod channel;
mod command;
mod controller;
mod error;

pub use channel::{open_endpoint, CommandChannel};
pub use controller::{ActuatorConfig, ActuatorController};
#[cfg(test)]
pub use error::ChannelError;
