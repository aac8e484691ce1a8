//! Response classification
//!
//! Splits frames into the RATO family and the notification family by a plain
//! substring test on the raw frame text.

use crate::protocol::ResponseFrame;

/// Notification sub-kinds, in the order their markers are checked
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NotificationKind {
    /// Ranging result notification
    Rrn,
    /// Node id notification
    Nin,
    /// Air traffic notification
    Air,
    /// Data notification
    Sdat,
    /// Device notification
    Dno,
}

impl NotificationKind {
    /// Every kind, in matching order
    pub const ALL: [NotificationKind; 5] = [
        NotificationKind::Rrn,
        NotificationKind::Nin,
        NotificationKind::Air,
        NotificationKind::Sdat,
        NotificationKind::Dno,
    ];

    /// Marker substring that identifies the kind
    pub fn marker(&self) -> &'static str {
        match self {
            NotificationKind::Rrn => "RRN",
            NotificationKind::Nin => "NIN",
            NotificationKind::Air => "AIR",
            NotificationKind::Sdat => "SDAT",
            NotificationKind::Dno => "DNO",
        }
    }
}

/// Response family of a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResponseClass {
    /// Single range response
    Rato,
    /// Any notification; carries the first marker found
    Notification(NotificationKind),
}

/// Classify raw frame text. Total: every input gets exactly one class.
pub fn classify(raw: &str) -> ResponseClass {
    NotificationKind::ALL
        .iter()
        .find(|kind| raw.contains(kind.marker()))
        .map_or(ResponseClass::Rato, |kind| ResponseClass::Notification(*kind))
}

/// Per-tick staging buckets
#[derive(Debug, Default)]
pub struct StagingBuckets {
    rato: Vec<ResponseFrame>,
    notifications: Vec<ResponseFrame>,
}

impl StagingBuckets {
    /// Empty buckets
    pub fn new() -> Self {
        Self::default()
    }

    /// Classify `frame` and append it to its bucket
    pub fn stage(&mut self, frame: ResponseFrame) -> ResponseClass {
        let class = classify(&frame.text());
        match class {
            ResponseClass::Rato => self.rato.push(frame),
            ResponseClass::Notification(_) => self.notifications.push(frame),
        }
        class
    }

    /// Frames with no notification marker
    pub fn rato(&self) -> &[ResponseFrame] {
        &self.rato
    }

    /// Frames carrying a notification marker
    pub fn notifications(&self) -> &[ResponseFrame] {
        &self.notifications
    }

    /// Empty both buckets
    pub fn clear(&mut self) {
        self.rato.clear();
        self.notifications.clear();
    }

    /// Whether both buckets are empty
    pub fn is_empty(&self) -> bool {
        self.rato.is_empty() && self.notifications.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::frame::{NOTIFICATION_MARKER, RESPONSE_MARKER};

    #[test]
    fn test_markers() {
        assert_eq!(classify("=0,120,-70\r\n"), ResponseClass::Rato);
        assert_eq!(
            classify("*RRN:00006A0F3FFC,00006A0F1234,0,250,1,0\r\n"),
            ResponseClass::Notification(NotificationKind::Rrn)
        );
        assert_eq!(
            classify("*NIN 00006A0F3FFC\r\n"),
            ResponseClass::Notification(NotificationKind::Nin)
        );
        assert_eq!(
            classify("#1\r\nSDAT 4 deadbeef\r\n"),
            ResponseClass::Notification(NotificationKind::Sdat)
        );
        assert_eq!(
            classify("*DNO\r\n"),
            ResponseClass::Notification(NotificationKind::Dno)
        );
        assert_eq!(
            classify("*AIR 1\r\n"),
            ResponseClass::Notification(NotificationKind::Air)
        );
    }

    #[test]
    fn test_first_marker_wins() {
        assert_eq!(
            classify("*DNO RRN\r\n"),
            ResponseClass::Notification(NotificationKind::Rrn)
        );
    }

    #[test]
    fn test_substring_match_anywhere() {
        // Plain substring test, not a field match
        assert_eq!(
            classify("=0,AIRx,1\r\n"),
            ResponseClass::Notification(NotificationKind::Air)
        );
    }

    #[test]
    fn test_buckets_partition_in_order() {
        let mut buckets = StagingBuckets::new();
        let frames = vec![
            ResponseFrame::single_line(RESPONSE_MARKER, "0,100,-70\r\n"),
            ResponseFrame::single_line(NOTIFICATION_MARKER, "NIN 1\r\n"),
            ResponseFrame::single_line(RESPONSE_MARKER, "0,200,-71\r\n"),
            ResponseFrame::counted(b'#', vec!["RRN:a,b,0,1,2,3\r\n".into()]),
        ];
        for f in frames.iter().cloned() {
            buckets.stage(f);
        }
        assert_eq!(buckets.rato(), &[frames[0].clone(), frames[2].clone()]);
        assert_eq!(
            buckets.notifications(),
            &[frames[1].clone(), frames[3].clone()]
        );

        buckets.clear();
        assert!(buckets.is_empty());
    }
}
