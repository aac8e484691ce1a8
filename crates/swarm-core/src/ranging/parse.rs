//! Field parsing of classified frames
//!
//! Payloads are comma-separated. A frame with the wrong number of fields, or
//! with a numeric field that does not parse, is dropped.

use tracing::trace;

use crate::protocol::ResponseFrame;

/// Field count of a RATO response
pub const RATO_ARITY: usize = 3;

/// Field count of a notification-family response
pub const RRN_ARITY: usize = 6;

/// One RATO sample
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RatoEntry {
    /// Low bit set means the measurement failed
    pub error_code: i64,
    /// Measured distance in centimeters
    pub distance_cm: i64,
    /// Received signal strength
    pub rssi: i64,
}

/// One notification-family sample
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RrnEntry {
    /// All fields ahead of the fixed trailing four
    pub addresses: Vec<String>,
    /// `"0"` on success
    pub error_code: String,
    /// Measured distance in centimeters
    pub distance_cm: i64,
    /// Neighbor configuration, kept as text
    pub neighbor_cfg: String,
    /// Change in neighbor configuration
    pub neighbor_cfg_delta: String,
}

/// Result of parsing one bucket
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseOutcome<T> {
    /// The bucket held no frames at all
    NoData,
    /// The bucket held frames; `dropped` of them were malformed
    Parsed {
        /// Entries in frame order
        entries: Vec<T>,
        /// Frames that did not parse
        dropped: usize,
    },
}

impl<T> ParseOutcome<T> {
    /// Parsed entries; empty for [`ParseOutcome::NoData`]
    pub fn entries(&self) -> &[T] {
        match self {
            ParseOutcome::NoData => &[],
            ParseOutcome::Parsed { entries, .. } => entries,
        }
    }

    /// Frames that did not parse
    pub fn dropped(&self) -> usize {
        match self {
            ParseOutcome::NoData => 0,
            ParseOutcome::Parsed { dropped, .. } => *dropped,
        }
    }

    /// Whether the bucket was empty
    pub fn is_no_data(&self) -> bool {
        matches!(self, ParseOutcome::NoData)
    }
}

/// Split a payload into trimmed fields
fn split_fields(frame: &ResponseFrame) -> Vec<String> {
    let payload = frame.payload_text();
    payload
        .trim_end_matches(['\r', '\n'])
        .split(',')
        .map(|f| f.trim().to_string())
        .collect()
}

fn parse_with<T>(
    frames: &[ResponseFrame],
    arity: usize,
    parse: impl Fn(Vec<String>) -> Option<T>,
) -> ParseOutcome<T> {
    if frames.is_empty() {
        return ParseOutcome::NoData;
    }

    let mut entries = Vec::with_capacity(frames.len());
    let mut dropped = 0;
    for frame in frames {
        let fields = split_fields(frame);
        let entry = if fields.len() == arity { parse(fields) } else { None };
        match entry {
            Some(e) => entries.push(e),
            None => {
                trace!(frame = %frame.text().trim_end(), arity, "dropping malformed frame");
                dropped += 1;
            }
        }
    }
    ParseOutcome::Parsed { entries, dropped }
}

/// Parse RATO frames (`error,distance_cm,rssi`)
pub fn parse_rato(frames: &[ResponseFrame]) -> ParseOutcome<RatoEntry> {
    parse_with(frames, RATO_ARITY, |fields| {
        Some(RatoEntry {
            error_code: fields[0].parse().ok()?,
            distance_cm: fields[1].parse().ok()?,
            rssi: fields[2].parse().ok()?,
        })
    })
}

/// Parse notification frames (`addr...,error,distance_cm,ncfg,ncfg_delta`)
pub fn parse_rrn(frames: &[ResponseFrame]) -> ParseOutcome<RrnEntry> {
    parse_with(frames, RRN_ARITY, |mut fields| {
        let tail = fields.split_off(fields.len() - 4);
        let [error_code, distance, neighbor_cfg, neighbor_cfg_delta]: [String; 4] =
            tail.try_into().ok()?;
        Some(RrnEntry {
            addresses: fields,
            error_code,
            distance_cm: distance.parse().ok()?,
            neighbor_cfg,
            neighbor_cfg_delta,
        })
    })
}
