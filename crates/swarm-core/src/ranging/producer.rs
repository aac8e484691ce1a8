//! Continuous frame producer

use tracing::{info, warn};

use super::buffer::IngestionBuffer;
use crate::protocol::{FrameReader, ProtocolError, ResponseFrame, Transport};

/// Counters returned when the producer loop ends
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProducerStats {
    /// Frames pushed into the buffer
    pub frames: u64,
    /// Headers that could not be decoded and were skipped
    pub skipped: u64,
}

/// Read frames until the transport fails, pushing each into `buffer`
///
/// Never returns an error: a closed or failed transport is the normal way for
/// this loop to end, and it only ends the producer.
pub fn run_producer<T: Transport>(
    reader: &mut FrameReader<T>,
    buffer: &IngestionBuffer<ResponseFrame>,
) -> ProducerStats {
    let mut stats = ProducerStats::default();
    loop {
        match reader.read_frame() {
            Ok(frame) => {
                buffer.push(frame);
                stats.frames += 1;
            }
            Err(ProtocolError::InvalidFrameHeader(header)) => {
                warn!(header = %header.trim_end(), "skipping frame with unreadable header");
                stats.skipped += 1;
            }
            Err(e) => {
                info!(frames = stats.frames, "frame producer stopped: {}", e);
                return stats;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::ChannelTransport;
    use std::io::{self, Cursor, Read, Write};

    struct ReadOnly(Cursor<Vec<u8>>);

    impl Read for ReadOnly {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            self.0.read(buf)
        }
    }

    impl Write for ReadOnly {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::Unsupported, "read only"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn reader(bytes: &[u8]) -> FrameReader<ChannelTransport<ReadOnly>> {
        FrameReader::new(ChannelTransport::new(ReadOnly(Cursor::new(bytes.to_vec()))))
    }

    #[test]
    fn test_runs_until_stream_closes() {
        let buffer = IngestionBuffer::new();
        let mut r = reader(b"=0,100,-70\r\n*NIN 1\r\n#2\r\na\r\nb\r\n");
        let stats = run_producer(&mut r, &buffer);
        assert_eq!(stats, ProducerStats { frames: 3, skipped: 0 });
        let frames = buffer.drain();
        assert_eq!(frames[2].text(), "#2\r\na\r\nb\r\n");
    }

    #[test]
    fn test_skips_bad_header() {
        let buffer = IngestionBuffer::new();
        let mut r = reader(b"#x\r\n=0,100,-70\r\n");
        let stats = run_producer(&mut r, &buffer);
        assert_eq!(stats, ProducerStats { frames: 1, skipped: 1 });
    }

    #[test]
    fn test_truncated_frame_not_pushed() {
        let buffer = IngestionBuffer::new();
        let mut r = reader(b"=0,100,-70\r\n#3\r\nonly\r\n");
        let stats = run_producer(&mut r, &buffer);
        assert_eq!(stats.frames, 1);
        assert_eq!(buffer.len(), 1);
    }
}
