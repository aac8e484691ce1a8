//! Distance aggregation
//!
//! Averages distance samples per response family, skipping samples whose error
//! code signals a failed measurement. The two families encode errors
//! differently and each keeps its own check.

use super::parse::{RatoEntry, RrnEntry};

/// Error code a successful notification carries
pub const RRN_SUCCESS: &str = "0";

/// RATO error codes fail on a set low bit or a negative value
pub fn rato_failed(error_code: i64) -> bool {
    error_code < 0 || error_code & 1 != 0
}

/// Notification error codes succeed only on the exact sentinel
pub fn rrn_failed(error_code: &str) -> bool {
    error_code != RRN_SUCCESS
}

fn cm_to_m(cm: i64) -> f64 {
    cm as f64 / 100.0
}

/// Running mean over the samples that did not fail
fn average<T>(entries: &[T], failed: impl Fn(&T) -> bool, distance_cm: impl Fn(&T) -> i64) -> (f64, usize) {
    let mut count = entries.len();
    let mut sum = 0.0;
    for entry in entries {
        if failed(entry) {
            count -= 1;
            continue;
        }
        sum += cm_to_m(distance_cm(entry));
    }

    if count == 0 {
        (0.0, 0)
    } else {
        (sum / count as f64, count)
    }
}

/// Mean RATO distance in meters; 0.0 when no sample is valid
pub fn aggregate_rato(entries: &[RatoEntry]) -> f64 {
    rato_average(entries).0
}

/// Mean notification distance in meters; 0.0 when no sample is valid
pub fn aggregate_rrn(entries: &[RrnEntry]) -> f64 {
    rrn_average(entries).0
}

fn rato_average(entries: &[RatoEntry]) -> (f64, usize) {
    average(entries, |e| rato_failed(e.error_code), |e| e.distance_cm)
}

fn rrn_average(entries: &[RrnEntry]) -> (f64, usize) {
    average(entries, |e| rrn_failed(&e.error_code), |e| e.distance_cm)
}

/// Distances computed for one tick
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AggregateResult {
    /// Mean RATO distance in meters
    pub rato_distance_m: f64,
    /// Mean notification distance in meters
    pub rrn_distance_m: f64,
    /// RATO samples that went into the mean
    pub rato_samples: usize,
    /// Notification samples that went into the mean
    pub rrn_samples: usize,
}

impl AggregateResult {
    /// Average both families at once
    pub fn compute(rato: &[RatoEntry], rrn: &[RrnEntry]) -> Self {
        let (rato_distance_m, rato_samples) = rato_average(rato);
        let (rrn_distance_m, rrn_samples) = rrn_average(rrn);
        Self {
            rato_distance_m,
            rrn_distance_m,
            rato_samples,
            rrn_samples,
        }
    }

    /// Console line in the format the ranging tool has always printed
    pub fn display_line(&self) -> String {
        format!(
            "Current distance (RATO): {:>5.2} m Current distance (RRN): {:>5.2} m",
            self.rato_distance_m, self.rrn_distance_m
        )
    }
}
