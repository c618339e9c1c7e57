use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Serialize, Deserialize, strum_macros::Display)]
pub enum ExtremumKind {
    #[strum(serialize = "MAX")]
    Max,
    #[strum(serialize = "MIN")]
    Min,
}

/// A turning point of a series.
#[derive(Copy, Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct ExtremumPoint {
    pub timestamp_ms: i64,
    pub value: f64,
    pub kind: ExtremumKind,
}

/// Maxima and minima of one series, each ordered by timestamp.
#[derive(Clone, PartialEq, Debug, Default, Serialize, Deserialize)]
pub struct Extrema {
    pub maxima: Vec<ExtremumPoint>,
    pub minima: Vec<ExtremumPoint>,
}

impl Extrema {
    pub fn max_timestamps(&self) -> Vec<i64> {
        self.maxima.iter().map(|p| p.timestamp_ms).collect()
    }

    pub fn min_timestamps(&self) -> Vec<i64> {
        self.minima.iter().map(|p| p.timestamp_ms).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.maxima.is_empty() && self.minima.is_empty()
    }
}

/// Identity of a segment within one classification pass.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub struct SegmentId(pub u32);

impl fmt::Display for SegmentId {
    /// Spreadsheet-column form: 0 -> A, 25 -> Z, 26 -> AA.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut n = self.0 as u64 + 1;
        let mut letters = Vec::new();
        while n > 0 {
            let rem = ((n - 1) % 26) as u8;
            letters.push((b'A' + rem) as char);
            n = (n - 1) / 26;
        }
        let label: String = letters.iter().rev().collect();
        write!(f, "{}", label)
    }
}

/// Hands out increasing segment ids.
#[derive(Debug, Default)]
pub(crate) struct SegmentIds {
    next: u32,
}

impl SegmentIds {
    pub(crate) fn next_id(&mut self) -> SegmentId {
        let id = SegmentId(self.next);
        self.next += 1;
        id
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Serialize, Deserialize, strum_macros::Display)]
pub enum Direction {
    Up,
    Down,
    Flat,
}

/// A contiguous run of days sharing one classification.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct Segment {
    pub id: SegmentId,
    pub direction: Direction,
    pub start_ms: i64,
    pub end_ms: i64,
    /// Number of days in the run (inclusive of both ends).
    pub length: usize,
}

/// Output shared by the crossover engine and the trend classifier so a
/// renderer can treat both signal sources the same way.
#[derive(Clone, PartialEq, Debug, Default, Serialize, Deserialize)]
pub struct SignalReport {
    pub segments: Vec<Segment>,
    pub enter_days: Vec<i64>,
    pub exit_days: Vec<i64>,
}

impl SignalReport {
    /// Builds the enter/exit lists from the `Up` segments.
    pub(crate) fn from_segments(segments: Vec<Segment>) -> Self {
        let (enter_days, exit_days) = segments
            .iter()
            .filter(|s| s.direction == Direction::Up)
            .map(|s| (s.start_ms, s.end_ms))
            .unzip();
        Self {
            segments,
            enter_days,
            exit_days,
        }
    }

    pub fn trade_count(&self) -> usize {
        self.enter_days.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0, "A")]
    #[case(25, "Z")]
    #[case(26, "AA")]
    #[case(27, "AB")]
    #[case(701, "ZZ")]
    #[case(702, "AAA")]
    fn test_segment_id_alphabetic_label(#[case] id: u32, #[case] expected: &str) {
        assert_eq!(SegmentId(id).to_string(), expected);
    }

    #[test]
    fn test_segment_ids_increase() {
        let mut ids = SegmentIds::default();
        assert_eq!(ids.next_id(), SegmentId(0));
        assert_eq!(ids.next_id(), SegmentId(1));
    }

    #[test]
    fn test_report_enter_exit_come_from_up_segments_only() {
        let segments = vec![
            Segment { id: SegmentId(0), direction: Direction::Down, start_ms: 1, end_ms: 2, length: 2 },
            Segment { id: SegmentId(1), direction: Direction::Up, start_ms: 3, end_ms: 5, length: 3 },
        ];
        let report = SignalReport::from_segments(segments);
        assert_eq!(report.enter_days, vec![3]);
        assert_eq!(report.exit_days, vec![5]);
        assert_eq!(report.trade_count(), 1);
    }
}
