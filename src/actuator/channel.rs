use std::io::{self, Read, Write};
use std::net::{TcpStream, ToSocketAddrs};

use super::controller::ActuatorConfig;
use super::error::{ActuatorError, ChannelError};

const MAX_ACK_LEN: usize = 64;
/// Replies to earlier, timed-out commands skipped before giving up.
const MAX_STALE_REPLIES: usize = 8;

/// Exclusive link to the actuator firmware.
pub trait CommandChannel {
    /// Sends an absolute position and waits for the firmware's acknowledgement.
    fn set_position(&mut self, ticks: i64) -> Result<(), ChannelError>;

    /// Terminates any partially written frame.
    fn reset(&mut self) -> Result<(), ChannelError> {
        Ok(())
    }

    fn close(&mut self);
}

pub trait Stream: Read + Write + Send {}

impl<T: Read + Write + Send> Stream for T {}

/// Line-oriented framing: `P<ticks>\n` out, `OK <ticks>` or `ERR <reason>` back.
///
/// The acknowledgement echoes the target so that a late `OK` for a command
/// that already timed out is never taken for the current one.
pub struct SerialLink<T: Read + Write> {
    stream: Option<T>,
    /// A frame was cut short and must be terminated before the next one.
    dirty: bool,
}

impl<T: Read + Write> SerialLink<T> {
    pub fn new(stream: T) -> Self {
        Self {
            stream: Some(stream),
            dirty: false,
        }
    }

    #[cfg(test)]
    pub(crate) fn get_ref(&self) -> Option<&T> {
        self.stream.as_ref()
    }

    fn write_frame(&mut self, frame: &[u8]) -> Result<(), ChannelError> {
        let stream = self.stream.as_mut().ok_or(ChannelError::Closed)?;
        let mut written = 0;
        while written < frame.len() {
            match stream.write(&frame[written..]) {
                Ok(0) => {
                    self.dirty = written > 0;
                    return Err(ChannelError::PartialWrite {
                        written,
                        expected: frame.len(),
                    });
                }
                Ok(n) => written += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => {
                    self.dirty = written > 0;
                    return Err(e.into());
                }
            }
        }
        stream.flush()?;
        Ok(())
    }

    fn read_line(&mut self) -> Result<String, ChannelError> {
        let stream = self.stream.as_mut().ok_or(ChannelError::Closed)?;
        let mut line = Vec::new();
        let mut byte = [0u8; 1];
        loop {
            match stream.read(&mut byte) {
                Ok(0) => return Err(ChannelError::Closed),
                Ok(_) if byte[0] == b'\n' => break,
                Ok(_) => {
                    line.push(byte[0]);
                    if line.len() > MAX_ACK_LEN {
                        break;
                    }
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(e.into()),
            }
        }
        Ok(String::from_utf8_lossy(&line).trim().to_string())
    }

    fn read_ack(&mut self, ticks: i64) -> Result<(), ChannelError> {
        for _ in 0..=MAX_STALE_REPLIES {
            let reply = self.read_line()?;
            match reply.strip_prefix("OK") {
                Some(echo) if echo.trim().parse::<i64>() == Ok(ticks) => return Ok(()),
                Some(_) => log::debug!("Ignoring stale reply: {}", reply),
                None if reply.is_empty() => {}
                None => return Err(ChannelError::Rejected(reply)),
            }
        }
        Err(ChannelError::Timeout)
    }
}

impl<T: Read + Write> CommandChannel for SerialLink<T> {
    fn set_position(&mut self, ticks: i64) -> Result<(), ChannelError> {
        self.reset()?;
        self.write_frame(format!("P{}\n", ticks).as_bytes())?;
        self.read_ack(ticks)
    }

    fn reset(&mut self) -> Result<(), ChannelError> {
        if !self.dirty {
            return Ok(());
        }
        let stream = self.stream.as_mut().ok_or(ChannelError::Closed)?;
        stream.write_all(b"\n")?;
        stream.flush()?;
        self.dirty = false;
        Ok(())
    }

    fn close(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            let _ = stream.flush();
        }
    }
}

/// Opens `tcp://host:port` (serial bridge) or a serial device path. Reads and
/// writes on either are bounded by `config.timeout`.
pub fn open_endpoint(
    endpoint: &str,
    config: &ActuatorConfig,
) -> Result<SerialLink<Box<dyn Stream>>, ActuatorError> {
    let timeout = config.timeout;
    let stream: Box<dyn Stream> = if let Some(addr) = endpoint.strip_prefix("tcp://") {
        let addr = addr
            .to_socket_addrs()?
            .next()
            .ok_or_else(|| ActuatorError::InvalidEndpoint(endpoint.to_string()))?;
        let stream = TcpStream::connect_timeout(&addr, timeout)?;
        stream.set_read_timeout(Some(timeout))?;
        stream.set_write_timeout(Some(timeout))?;
        stream.set_nodelay(true)?;
        Box::new(stream)
    } else if endpoint.is_empty() {
        return Err(ActuatorError::InvalidEndpoint(endpoint.to_string()));
    } else {
        let port = serialport::new(endpoint, config.baud_rate)
            .timeout(timeout)
            .open()?;
        Box::new(port)
    };

    log::info!("Actuator channel open on {}", endpoint);
    Ok(SerialLink::new(stream))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::collections::VecDeque;

    /// Stream that accepts `write_budget` bytes, then fails, and replays `replies`.
    /// With `truncate_frames`, every frame is cut after two bytes while lone
    /// terminators go through.
    pub struct ScriptedStream {
        pub written: Vec<u8>,
        pub write_budget: Option<usize>,
        pub truncate_frames: bool,
        pub replies: VecDeque<u8>,
    }

    impl ScriptedStream {
        pub fn new(replies: &str) -> Self {
            Self {
                written: Vec::new(),
                write_budget: None,
                truncate_frames: false,
                replies: replies.bytes().collect(),
            }
        }
    }

    impl Write for ScriptedStream {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            if self.truncate_frames {
                let n = match buf {
                    [b'P', ..] => buf.len().min(2),
                    b"\n" => 1,
                    _ => return Err(io::Error::new(io::ErrorKind::TimedOut, "write timeout")),
                };
                self.written.extend_from_slice(&buf[..n]);
                return Ok(n);
            }
            let n = match self.write_budget {
                Some(0) => return Err(io::Error::new(io::ErrorKind::TimedOut, "write timeout")),
                Some(budget) => {
                    let n = budget.min(buf.len());
                    self.write_budget = Some(budget - n);
                    n
                }
                None => buf.len(),
            };
            self.written.extend_from_slice(&buf[..n]);
            Ok(n)
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl Read for ScriptedStream {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            match self.replies.pop_front() {
                Some(b) => {
                    buf[0] = b;
                    Ok(1)
                }
                None => Err(io::Error::new(io::ErrorKind::TimedOut, "read timeout")),
            }
        }
    }

    #[test]
    fn writes_frame_and_accepts_ok() {
        let mut link = SerialLink::new(ScriptedStream::new("OK 1200\n"));
        link.set_position(1200).unwrap();
        let stream = link.stream.as_ref().unwrap();
        assert_eq!(stream.written, b"P1200\n");
    }

    #[test]
    fn rejected_reply_is_an_error() {
        let mut link = SerialLink::new(ScriptedStream::new("ERR busy\n"));
        assert!(matches!(
            link.set_position(5),
            Err(ChannelError::Rejected(reply)) if reply == "ERR busy"
        ));
    }

    #[test]
    fn missing_reply_times_out() {
        let mut link = SerialLink::new(ScriptedStream::new(""));
        assert!(matches!(link.set_position(5), Err(ChannelError::Timeout)));
    }

    #[test]
    fn partial_frame_is_terminated_before_next_one() {
        let mut stream = ScriptedStream::new("OK 7\n");
        stream.write_budget = Some(3);
        let mut link = SerialLink::new(stream);
        assert!(matches!(link.set_position(12345), Err(ChannelError::Timeout)));
        assert!(link.dirty);

        link.stream.as_mut().unwrap().write_budget = None;
        link.set_position(7).unwrap();
        assert_eq!(link.stream.as_ref().unwrap().written, b"P12\nP7\n");
    }

    #[test]
    fn late_ack_is_not_taken_for_the_next_command() {
        let mut link = SerialLink::new(ScriptedStream::new(""));
        assert!(matches!(link.set_position(100), Err(ChannelError::Timeout)));

        link.stream.as_mut().unwrap().replies = "OK 100\nERR out of range\n".bytes().collect();
        assert!(matches!(
            link.set_position(999_999),
            Err(ChannelError::Rejected(reply)) if reply == "ERR out of range"
        ));
    }

    #[test]
    fn late_ack_is_skipped_until_matching_one() {
        let mut link = SerialLink::new(ScriptedStream::new("OK 100\nOK 250\n"));
        link.set_position(250).unwrap();
    }

    #[test]
    fn ack_without_echo_is_not_accepted() {
        let mut link = SerialLink::new(ScriptedStream::new("OK\n"));
        assert!(matches!(link.set_position(3), Err(ChannelError::Timeout)));
    }

    #[test]
    fn empty_endpoint_is_rejected() {
        let config = ActuatorConfig::default();
        assert!(matches!(
            open_endpoint("", &config),
            Err(ActuatorError::InvalidEndpoint(_))
        ));
    }

    #[test]
    fn missing_serial_device_fails_to_open() {
        let config = ActuatorConfig::default();
        assert!(matches!(
            open_endpoint("/dev/catch-o-mat-missing-tty", &config),
            Err(ActuatorError::Serial(_))
        ));
    }

    #[test]
    fn closed_link_refuses_commands() {
        let mut link = SerialLink::new(ScriptedStream::new("OK\n"));
        link.close();
        assert!(matches!(link.set_position(1), Err(ChannelError::Closed)));
    }
}
