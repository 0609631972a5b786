use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChannelError {
    #[error("channel timed out")]
    Timeout,
    #[error("channel closed")]
    Closed,
    #[error("partial write ({written}/{expected} bytes)")]
    PartialWrite { written: usize, expected: usize },
    #[error("command rejected: {0}")]
    Rejected(String),
    #[error("IO error: {0}")]
    Io(io::Error),
}

impl From<io::Error> for ChannelError {
    fn from(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => ChannelError::Timeout,
            io::ErrorKind::UnexpectedEof | io::ErrorKind::BrokenPipe => ChannelError::Closed,
            _ => ChannelError::Io(err),
        }
    }
}

#[derive(Debug, Error)]
pub enum ActuatorError {
    #[error("actuator unreachable after {attempts} attempts: {last}")]
    Unreachable { attempts: u32, last: ChannelError },
    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(String),
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("serial port error: {0}")]
    Serial(#[from] serialport::Error),
}
