//! Byte-stream transports
//!
//! The frame reader and the node handle only need three blocking operations:
//! read one byte, read one line, write bytes. [`Transport`] captures exactly
//! that, and [`ChannelTransport`] provides it on top of any `Read + Write`
//! channel such as a serial port.

use serialport::SerialPort;
use std::io::{self, BufRead, BufReader, Read, Write};
use std::time::Duration;

use super::ProtocolError;

/// Blocking byte-stream contract shared by the frame reader and command writer
pub trait Transport: Send {
    /// Read exactly one byte, blocking until it arrives
    fn read_byte(&mut self) -> Result<u8, ProtocolError>;

    /// Read one line including its `\n` terminator
    fn read_line(&mut self) -> Result<Vec<u8>, ProtocolError>;

    /// Write all bytes to the stream
    fn write_bytes(&mut self, data: &[u8]) -> Result<(), ProtocolError>;
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn read_byte(&mut self) -> Result<u8, ProtocolError> {
        (**self).read_byte()
    }

    fn read_line(&mut self) -> Result<Vec<u8>, ProtocolError> {
        (**self).read_line()
    }

    fn write_bytes(&mut self, data: &[u8]) -> Result<(), ProtocolError> {
        (**self).write_bytes(data)
    }
}

/// Abstraction for raw communication channels
pub trait CommunicationChannel: Read + Write + Send {
    /// Set timeout for read/write operations
    fn set_timeout(&mut self, timeout: Duration) -> io::Result<()>;

    /// Clear input buffers
    fn clear_input_buffer(&mut self) -> io::Result<()>;

    /// Try to clone the channel, giving a second handle on the same device
    fn try_clone(&self) -> io::Result<Box<dyn CommunicationChannel>>;
}

impl<C: CommunicationChannel + ?Sized> CommunicationChannel for Box<C> {
    fn set_timeout(&mut self, timeout: Duration) -> io::Result<()> {
        (**self).set_timeout(timeout)
    }

    fn clear_input_buffer(&mut self) -> io::Result<()> {
        (**self).clear_input_buffer()
    }

    fn try_clone(&self) -> io::Result<Box<dyn CommunicationChannel>> {
        (**self).try_clone()
    }
}

/// Serial port wrapper implementing CommunicationChannel
pub struct SerialChannel {
    port: Box<dyn SerialPort>,
}

impl SerialChannel {
    /// Wrap an open port
    pub fn new(port: Box<dyn SerialPort>) -> Self {
        Self { port }
    }
}

impl Read for SerialChannel {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.port.read(buf)
    }
}

impl Write for SerialChannel {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.port.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.port.flush()
    }
}

impl CommunicationChannel for SerialChannel {
    fn set_timeout(&mut self, timeout: Duration) -> io::Result<()> {
        self.port.set_timeout(timeout).map_err(io::Error::other)
    }

    fn clear_input_buffer(&mut self) -> io::Result<()> {
        self.port
            .clear(serialport::ClearBuffer::Input)
            .map_err(io::Error::other)
    }

    fn try_clone(&self) -> io::Result<Box<dyn CommunicationChannel>> {
        let port_clone = self.port.try_clone().map_err(io::Error::other)?;
        Ok(Box::new(SerialChannel::new(port_clone)))
    }
}

/// Line-buffered [`Transport`] over a communication channel
///
/// Port timeouts are treated as "no data yet": the read keeps waiting, which
/// gives the blocking semantics the frame reader expects while the port itself
/// stays configured with a short poll timeout.
pub struct ChannelTransport<C: Read + Write + Send> {
    reader: BufReader<C>,
}

impl<C: Read + Write + Send> ChannelTransport<C> {
    /// Buffer reads from `channel`
    pub fn new(channel: C) -> Self {
        Self {
            reader: BufReader::new(channel),
        }
    }

    /// Access the wrapped channel
    pub fn get_ref(&self) -> &C {
        self.reader.get_ref()
    }

    /// Consume the transport, returning the channel. Buffered input is lost.
    pub fn into_inner(self) -> C {
        self.reader.into_inner()
    }
}

fn closed(what: &str) -> ProtocolError {
    ProtocolError::Transport(format!("stream closed while reading {}", what))
}

fn is_poll_timeout(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted
    )
}

impl<C: Read + Write + Send> Transport for ChannelTransport<C> {
    fn read_byte(&mut self) -> Result<u8, ProtocolError> {
        let mut byte = [0u8; 1];
        loop {
            match self.reader.read(&mut byte) {
                Ok(0) => return Err(closed("header byte")),
                Ok(_) => return Ok(byte[0]),
                Err(e) if is_poll_timeout(&e) => continue,
                Err(e) => return Err(ProtocolError::Transport(e.to_string())),
            }
        }
    }

    fn read_line(&mut self) -> Result<Vec<u8>, ProtocolError> {
        let mut line = Vec::new();
        loop {
            match self.reader.read_until(b'\n', &mut line) {
                // read_until keeps partial data in `line` across timeouts
                Ok(0) => return Err(closed("line")),
                Ok(_) if line.ends_with(b"\n") => return Ok(line),
                Ok(_) => continue,
                Err(e) if is_poll_timeout(&e) => continue,
                Err(e) => return Err(ProtocolError::Transport(e.to_string())),
            }
        }
    }

    fn write_bytes(&mut self, data: &[u8]) -> Result<(), ProtocolError> {
        let channel = self.reader.get_mut();
        channel
            .write_all(data)
            .and_then(|_| channel.flush())
            .map_err(|e| ProtocolError::Transport(e.to_string()))
    }
}

/// Transport over a serial port
pub type SerialTransport = ChannelTransport<Box<dyn CommunicationChannel>>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    /// In-memory duplex channel: reads from a fixed script, records writes
    struct ScriptChannel {
        input: Cursor<Vec<u8>>,
        written: Vec<u8>,
    }

    impl ScriptChannel {
        fn new(input: &[u8]) -> Self {
            Self {
                input: Cursor::new(input.to_vec()),
                written: Vec::new(),
            }
        }
    }

    impl Read for ScriptChannel {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            self.input.read(buf)
        }
    }

    impl Write for ScriptChannel {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.written.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_read_byte_then_line() {
        let mut t = ChannelTransport::new(ScriptChannel::new(b"=0,100,-70\r\n"));
        assert_eq!(t.read_byte().unwrap(), b'=');
        assert_eq!(t.read_line().unwrap(), b"0,100,-70\r\n".to_vec());
    }

    #[test]
    fn test_eof_is_transport_error() {
        let mut t = ChannelTransport::new(ScriptChannel::new(b""));
        assert!(matches!(t.read_byte(), Err(ProtocolError::Transport(_))));
    }

    #[test]
    fn test_partial_line_at_eof_is_transport_error() {
        let mut t = ChannelTransport::new(ScriptChannel::new(b"no terminator"));
        let err = t.read_line().unwrap_err();
        assert!(err.is_transport());
    }

    #[test]
    fn test_write_reaches_channel() {
        let mut t = ChannelTransport::new(ScriptChannel::new(b""));
        t.write_bytes(b"GNID\r\n").unwrap();
        assert_eq!(t.into_inner().written, b"GNID\r\n".to_vec());
    }

    /// Channel that times out once before yielding data, like a serial port
    /// configured with a short poll timeout
    struct SlowChannel {
        timed_out: bool,
        inner: Cursor<Vec<u8>>,
    }

    impl Read for SlowChannel {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if !self.timed_out {
                self.timed_out = true;
                return Err(io::Error::new(io::ErrorKind::TimedOut, "poll"));
            }
            self.inner.read(buf)
        }
    }

    impl Write for SlowChannel {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_poll_timeout_keeps_waiting() {
        let mut t = ChannelTransport::new(SlowChannel {
            timed_out: false,
            inner: Cursor::new(b"*NIN\r\n".to_vec()),
        });
        assert_eq!(t.read_byte().unwrap(), b'*');
        assert_eq!(t.read_line().unwrap(), b"NIN\r\n".to_vec());
    }
}
