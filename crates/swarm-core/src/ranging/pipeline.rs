//! Periodic processing tick
//!
//! Drains the ingestion buffer, classifies and parses what accumulated since
//! the previous tick, and reduces it to one [`AggregateResult`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::io;
use tracing::debug;

use super::aggregate::AggregateResult;
use super::buffer::IngestionBuffer;
use super::classify::StagingBuckets;
use super::parse::{parse_rato, parse_rrn, ParseOutcome, RatoEntry, RrnEntry};
use crate::protocol::ResponseFrame;
use crate::sink::RangingSink;

/// What a tick does besides computing distances
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineOptions {
    /// Hand the formatted distance line to the sink
    pub display_distances: bool,
    /// Forward notification frames to the sink along with RATO frames
    pub forward_notifications: bool,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            display_distances: true,
            forward_notifications: false,
        }
    }
}

/// Summary of one tick
#[derive(Debug, Clone)]
pub struct TickReport {
    /// When the tick ran
    pub timestamp: DateTime<Utc>,
    /// Frames drained from the buffer
    pub frames: usize,
    /// Parsed RATO bucket
    pub rato: ParseOutcome<RatoEntry>,
    /// Parsed notification bucket
    pub rrn: ParseOutcome<RrnEntry>,
    /// Averaged distances
    pub result: AggregateResult,
}

impl TickReport {
    /// Frames dropped by either parser
    pub fn dropped(&self) -> usize {
        self.rato.dropped() + self.rrn.dropped()
    }
}

/// Consumer side of the ranging pipeline. Owns its staging buckets.
#[derive(Debug, Default)]
pub struct RangingPipeline {
    buckets: StagingBuckets,
    options: PipelineOptions,
}

impl RangingPipeline {
    /// Pipeline with empty buckets
    pub fn new(options: PipelineOptions) -> Self {
        Self {
            buckets: StagingBuckets::new(),
            options,
        }
    }

    /// Run one tick against `buffer`, writing to `sink`
    ///
    /// Only sink I/O errors are returned. Buckets are cleared on every exit
    /// path so nothing carries over into the next tick.
    pub fn tick<S: RangingSink + ?Sized>(
        &mut self,
        buffer: &IngestionBuffer<ResponseFrame>,
        sink: &mut S,
    ) -> io::Result<TickReport> {
        self.buckets.clear();
        let frames = buffer.drain();
        let count = frames.len();
        for frame in frames {
            self.buckets.stage(frame);
        }

        let report = self.process(count, sink);
        self.buckets.clear();
        report
    }

    fn process<S: RangingSink + ?Sized>(&self, frames: usize, sink: &mut S) -> io::Result<TickReport> {
        for frame in self.buckets.rato() {
            sink.write_raw(&frame.text())?;
        }
        if self.options.forward_notifications {
            for frame in self.buckets.notifications() {
                sink.write_raw(&frame.text())?;
            }
        }

        let rato = parse_rato(self.buckets.rato());
        let rrn = parse_rrn(self.buckets.notifications());
        let result = AggregateResult::compute(rato.entries(), rrn.entries());

        if self.options.display_distances {
            sink.display(&result.display_line())?;
        }
        sink.flush()?;

        debug!(
            frames,
            rato = result.rato_samples,
            rrn = result.rrn_samples,
            dropped = rato.dropped() + rrn.dropped(),
            "tick processed"
        );

        Ok(TickReport {
            timestamp: Utc::now(),
            frames,
            rato,
            rrn,
            result,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::frame::{NOTIFICATION_MARKER, RESPONSE_MARKER};
    use crate::sink::MemorySink;
    use std::io::ErrorKind;

    fn rato(line: &str) -> ResponseFrame {
        ResponseFrame::single_line(RESPONSE_MARKER, format!("{}\r\n", line))
    }

    fn note(line: &str) -> ResponseFrame {
        ResponseFrame::single_line(NOTIFICATION_MARKER, format!("{}\r\n", line))
    }

    #[test]
    fn test_empty_tick() {
        let buffer = IngestionBuffer::new();
        let mut sink = MemorySink::default();
        let mut pipeline = RangingPipeline::default();
        let report = pipeline.tick(&buffer, &mut sink).unwrap();
        assert_eq!(report.frames, 0);
        assert!(report.rato.is_no_data());
        assert!(report.rrn.is_no_data());
        assert_eq!(report.result, AggregateResult::default());
        assert_eq!(sink.flushes, 1);
    }

    #[test]
    fn test_tick_forwards_rato_and_averages() {
        let buffer = IngestionBuffer::new();
        buffer.push(rato("0,100,-70"));
        buffer.push(note("RRN:a,b,0,250,1,0"));
        buffer.push(rato("1,999999,-90"));
        buffer.push(rato("0,300,-72"));
        buffer.push(rato("0,300"));

        let mut sink = MemorySink::default();
        let mut pipeline = RangingPipeline::new(PipelineOptions::default());
        let report = pipeline.tick(&buffer, &mut sink).unwrap();

        assert_eq!(report.frames, 5);
        assert_eq!(report.result.rato_distance_m, 2.0);
        assert_eq!(report.result.rrn_distance_m, 2.5);
        assert_eq!(report.dropped(), 1);
        // Only the RATO bucket reaches the raw sink by default
        assert_eq!(sink.raw.len(), 4);
        assert!(sink.raw.iter().all(|r| r.starts_with('=')));
        assert_eq!(sink.displayed, vec![report.result.display_line()]);
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_forward_notifications_and_no_display() {
        let buffer = IngestionBuffer::new();
        buffer.push(note("NIN 00006A0F3FFC"));
        let mut sink = MemorySink::default();
        let mut pipeline = RangingPipeline::new(PipelineOptions {
            display_distances: false,
            forward_notifications: true,
        });
        pipeline.tick(&buffer, &mut sink).unwrap();
        assert_eq!(sink.raw, vec!["*NIN 00006A0F3FFC\r\n".to_string()]);
        assert!(sink.displayed.is_empty());
    }

    #[test]
    fn test_ticks_are_independent() {
        let buffer = IngestionBuffer::new();
        let mut sink = MemorySink::default();
        let mut pipeline = RangingPipeline::default();

        buffer.push(rato("0,500,-70"));
        let first = pipeline.tick(&buffer, &mut sink).unwrap();
        assert_eq!(first.result.rato_distance_m, 5.0);

        let second = pipeline.tick(&buffer, &mut sink).unwrap();
        assert!(second.rato.is_no_data());
        assert_eq!(second.result.rato_distance_m, 0.0);
    }

    struct FailingSink;

    impl RangingSink for FailingSink {
        fn write_raw(&mut self, _item: &str) -> io::Result<()> {
            Err(io::Error::new(ErrorKind::Other, "disk full"))
        }

        fn display(&mut self, _line: &str) -> io::Result<()> {
            Ok(())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_sink_error_does_not_leak_into_next_tick() {
        let buffer = IngestionBuffer::new();
        let mut pipeline = RangingPipeline::default();
        buffer.push(rato("0,100,-70"));
        assert!(pipeline.tick(&buffer, &mut FailingSink).is_err());

        let mut sink = MemorySink::default();
        let report = pipeline.tick(&buffer, &mut sink).unwrap();
        assert_eq!(report.frames, 0);
        assert!(sink.raw.is_empty());
    }
}
