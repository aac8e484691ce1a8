//! Response framing
//!
//! A SWARM node answers with text frames of two shapes:
//! - single-line: a marker byte (`=` or `*`) followed by one line
//! - counted: a decimal line count on its own line, followed by that many lines
//!
//! For counted frames the header is rebuilt as `byte + count + "\r\n"`. The
//! original count text (leading zeros, padding) is not preserved; consumers
//! match on substrings only.

use tracing::trace;

use super::{ProtocolError, Transport, LINE_TERMINATOR};

/// Marker byte for a single-line command response
pub const RESPONSE_MARKER: u8 = b'=';

/// Marker byte for a single-line unsolicited notification
pub const NOTIFICATION_MARKER: u8 = b'*';

/// Largest line count accepted in a counted header
pub const MAX_FRAME_LINES: usize = 1024;

/// Shape of a frame, derived from its header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameKind {
    /// `=` or `*` followed by exactly one line
    SingleLine(u8),
    /// Header announced this many payload lines
    Counted(usize),
}

/// One complete protocol response
///
/// Immutable once read; the raw text is `header` followed by every payload
/// line, terminators included.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseFrame {
    header: String,
    payload: Vec<String>,
    kind: FrameKind,
}

impl ResponseFrame {
    /// Build a single-line frame from its marker and line
    pub fn single_line(marker: u8, line: impl Into<String>) -> Self {
        Self {
            header: (marker as char).to_string(),
            payload: vec![line.into()],
            kind: FrameKind::SingleLine(marker),
        }
    }

    /// Build a counted frame; the header is reconstructed from `first` and the
    /// number of lines
    pub fn counted(first: u8, lines: Vec<String>) -> Self {
        let header = format!("{}{}{}", first as char, lines.len(), LINE_TERMINATOR);
        Self {
            header,
            kind: FrameKind::Counted(lines.len()),
            payload: lines,
        }
    }

    /// Marker byte, or the rebuilt count line
    pub fn header(&self) -> &str {
        &self.header
    }

    /// Payload lines, terminators included
    pub fn payload(&self) -> &[String] {
        &self.payload
    }

    /// Shape of the frame
    pub fn kind(&self) -> FrameKind {
        self.kind
    }

    /// Payload lines concatenated, terminators included
    pub fn payload_text(&self) -> String {
        self.payload.concat()
    }

    /// Raw decoded frame text: header then payload
    pub fn text(&self) -> String {
        let mut text = String::with_capacity(
            self.header.len() + self.payload.iter().map(String::len).sum::<usize>(),
        );
        text.push_str(&self.header);
        for line in &self.payload {
            text.push_str(line);
        }
        text
    }
}

fn decode(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

/// Reads [`ResponseFrame`]s off a blocking transport
pub struct FrameReader<T: Transport> {
    transport: T,
}

impl<T: Transport> FrameReader<T> {
    /// Read frames from `transport`
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    /// Underlying transport, e.g. for writing commands
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Give back the transport
    pub fn into_inner(self) -> T {
        self.transport
    }

    /// Read the next complete frame
    ///
    /// Fails with [`ProtocolError::Transport`] once the stream is closed and
    /// with [`ProtocolError::InvalidFrameHeader`] when a counted header does
    /// not hold a line count of at most [`MAX_FRAME_LINES`]. The latter
    /// leaves the stream positioned after the bad header line, so reading can
    /// continue.
    pub fn read_frame(&mut self) -> Result<ResponseFrame, ProtocolError> {
        read_frame(&mut self.transport)
    }
}

/// Read one frame from `transport`
pub fn read_frame<T: Transport + ?Sized>(transport: &mut T) -> Result<ResponseFrame, ProtocolError> {
    let first = transport.read_byte()?;

    if first == RESPONSE_MARKER || first == NOTIFICATION_MARKER {
        let line = transport.read_line()?;
        trace!(marker = %(first as char), "single-line frame");
        return Ok(ResponseFrame::single_line(first, decode(&line)));
    }

    let rest = transport.read_line()?;
    let count = parse_line_count(first, &rest)?;

    let mut lines = Vec::new();
    for _ in 0..count {
        lines.push(decode(&transport.read_line()?));
    }
    trace!(lines = count, "counted frame");
    Ok(ResponseFrame::counted(first, lines))
}

/// Line count of a counted header. A digit header byte is part of the number.
fn parse_line_count(first: u8, rest: &[u8]) -> Result<usize, ProtocolError> {
    let rest = decode(rest);
    let mut text = String::with_capacity(rest.len() + 1);
    if first.is_ascii_digit() {
        text.push(first as char);
    }
    text.push_str(rest.trim());

    match text.parse::<usize>() {
        Ok(count) if count <= MAX_FRAME_LINES => Ok(count),
        _ => {
            let mut raw = String::new();
            raw.push(first as char);
            raw.push_str(&rest);
            Err(ProtocolError::InvalidFrameHeader(raw))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    /// Scripted transport that hands out bytes from a queue
    struct Script(VecDeque<u8>);

    impl Script {
        fn new(bytes: &[u8]) -> Self {
            Script(bytes.iter().copied().collect())
        }
    }

    impl Transport for Script {
        fn read_byte(&mut self) -> Result<u8, ProtocolError> {
            self.0
                .pop_front()
                .ok_or_else(|| ProtocolError::Transport("eof".into()))
        }

        fn read_line(&mut self) -> Result<Vec<u8>, ProtocolError> {
            let mut line = Vec::new();
            loop {
                let b = self.read_byte()?;
                line.push(b);
                if b == b'\n' {
                    return Ok(line);
                }
            }
        }

        fn write_bytes(&mut self, _data: &[u8]) -> Result<(), ProtocolError> {
            Ok(())
        }
    }

    #[test]
    fn test_single_line_response() {
        let mut t = Script::new(b"=0,150,-72\r\n");
        let frame = read_frame(&mut t).unwrap();
        assert_eq!(frame.kind(), FrameKind::SingleLine(b'='));
        assert_eq!(frame.header(), "=");
        assert_eq!(frame.payload(), ["0,150,-72\r\n"]);
        assert_eq!(frame.text(), "=0,150,-72\r\n");
    }

    #[test]
    fn test_single_line_notification() {
        let mut t = Script::new(b"*NIN 00006A0F3FFC\r\n=0,1,2\r\n");
        let frame = read_frame(&mut t).unwrap();
        assert_eq!(frame.payload().len(), 1);
        assert_eq!(frame.payload_text(), "NIN 00006A0F3FFC\r\n");
        // Only one line consumed
        assert_eq!(read_frame(&mut t).unwrap().header(), "=");
    }

    #[test]
    fn test_counted_frame_with_marker_header() {
        let mut t = Script::new(b"#02\r\nline one\r\nline two\r\n=x\r\n");
        let frame = read_frame(&mut t).unwrap();
        assert_eq!(frame.kind(), FrameKind::Counted(2));
        // Leading zero is dropped from the rebuilt header
        assert_eq!(frame.header(), "#2\r\n");
        assert_eq!(frame.payload_text(), "line one\r\nline two\r\n");
        assert_eq!(frame.text(), "#2\r\nline one\r\nline two\r\n");
    }

    #[test]
    fn test_counted_frame_digit_header() {
        // Header byte '3' followed by an empty remainder: count is 3
        let mut t = Script::new(b"3\r\na\r\nb\r\nc\r\n");
        let frame = read_frame(&mut t).unwrap();
        assert_eq!(frame.kind(), FrameKind::Counted(3));
        assert_eq!(frame.header(), "33\r\n");
        assert_eq!(frame.payload().len(), 3);
    }

    #[test]
    fn test_counted_frame_zero_lines() {
        let mut t = Script::new(b"#0\r\n");
        let frame = read_frame(&mut t).unwrap();
        assert_eq!(frame.kind(), FrameKind::Counted(0));
        assert_eq!(frame.header(), "#0\r\n");
        assert!(frame.payload().is_empty());
    }

    #[test]
    fn test_truncated_counted_frame() {
        let mut t = Script::new(b"#3\r\nonly one\r\n");
        let err = read_frame(&mut t).unwrap_err();
        assert!(matches!(err, ProtocolError::Transport(_)));
    }

    #[test]
    fn test_bad_count_is_recoverable() {
        let mut t = Script::new(b"#abc\r\n=0,100,1\r\n");
        let err = read_frame(&mut t).unwrap_err();
        assert!(matches!(err, ProtocolError::InvalidFrameHeader(_)));
        let next = read_frame(&mut t).unwrap();
        assert_eq!(next.payload_text(), "0,100,1\r\n");
    }

    #[test]
    fn test_oversized_count_is_rejected() {
        let mut t = Script::new(b"#18446744073709551615\r\n#99999999999999999999\r\n#1025\r\n#1024\r\n");
        for _ in 0..3 {
            let err = read_frame(&mut t).unwrap_err();
            assert!(matches!(err, ProtocolError::InvalidFrameHeader(_)), "{:?}", err);
        }
        // At the limit the count is accepted and the missing lines end the stream
        assert!(read_frame(&mut t).unwrap_err().is_transport());
    }

    #[test]
    fn test_empty_stream() {
        let mut reader = FrameReader::new(Script::new(b""));
        assert!(reader.read_frame().unwrap_err().is_transport());
    }
}
