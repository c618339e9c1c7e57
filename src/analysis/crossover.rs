use itertools::Itertools;

use crate::error::{Result, SignalError, ensure_finite};
use crate::models::{Direction, IndicatorSeries, Segment, SegmentIds, SignalReport};

/// Dual moving-average crossover.
///
/// `slow` is cut to the trailing `fast.len()` points; both must then cover the
/// same days. Each run of days where `fast - slow` keeps the same sign becomes
/// one segment, and every run with `fast > slow` yields an enter day (its first
/// day) and an exit day (its last day).
pub fn find_crossings(fast: &IndicatorSeries, slow: &IndicatorSeries) -> Result<SignalReport> {
    if fast.is_empty() {
        return Err(SignalError::misaligned("fast series is empty"));
    }
    if slow.len() < fast.len() {
        return Err(SignalError::misaligned(format!(
            "slow series has {} points, fast series needs {}",
            slow.len(),
            fast.len()
        )));
    }
    let slow = slow.tail(fast.len());
    if slow.timestamps() != fast.timestamps() {
        return Err(SignalError::misaligned(
            "fast and slow series do not cover the same trailing days",
        ));
    }
    ensure_finite(fast.values(), "fast series")?;
    ensure_finite(slow.values(), "slow series")?;

    let timestamps = fast.timestamps();
    let differences: Vec<f64> = fast
        .values()
        .iter()
        .zip(slow.values())
        .map(|(f, s)| f - s)
        .collect();

    let mut ids = SegmentIds::default();
    let mut segments = Vec::new();

    for (positive, run) in &differences
        .iter()
        .enumerate()
        .chunk_by(|(_, diff)| **diff > 0.0)
    {
        let run: Vec<(usize, &f64)> = run.collect();
        let (first, _) = run[0];
        let (last, _) = run[run.len() - 1];

        let direction = if positive {
            Direction::Up
        } else if run.iter().all(|(_, diff)| **diff == 0.0) {
            Direction::Flat
        } else {
            Direction::Down
        };

        segments.push(Segment {
            id: ids.next_id(),
            direction,
            start_ms: timestamps[first],
            end_ms: timestamps[last],
            length: run.len(),
        });
    }

    log::debug!(
        "Crossover: {} segments over {} days ({} positive)",
        segments.len(),
        differences.len(),
        segments.iter().filter(|s| s.direction == Direction::Up).count()
    );

    Ok(SignalReport::from_segments(segments))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SegmentId;
    use assert_matches::assert_matches;

    const DAY_MS: i64 = 86_400_000;

    fn day(d: i64) -> i64 {
        d * DAY_MS
    }

    fn series_from_day(first_day: i64, values: &[f64]) -> IndicatorSeries {
        let timestamps = (first_day..first_day + values.len() as i64).map(day).collect();
        IndicatorSeries::new(timestamps, values.to_vec()).unwrap()
    }

    #[test]
    fn test_single_positive_day_is_enter_and_exit() {
        let fast = series_from_day(1, &[1.0, 2.0, 3.0, 2.0, 1.0]);
        let slow = series_from_day(1, &[2.0; 5]);
        let report = find_crossings(&fast, &slow).unwrap();

        assert_eq!(report.enter_days, vec![day(3)]);
        assert_eq!(report.exit_days, vec![day(3)]);

        let directions: Vec<Direction> = report.segments.iter().map(|s| s.direction).collect();
        assert_eq!(directions, vec![Direction::Down, Direction::Up, Direction::Down]);
        assert_eq!(report.segments[1].length, 1);
    }

    #[test]
    fn test_segment_ids_increase_per_run() {
        let fast = series_from_day(1, &[3.0, 1.0, 3.0, 1.0]);
        let slow = series_from_day(1, &[2.0; 4]);
        let report = find_crossings(&fast, &slow).unwrap();
        let ids: Vec<SegmentId> = report.segments.iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![SegmentId(0), SegmentId(1), SegmentId(2), SegmentId(3)]);
        assert_eq!(report.enter_days, vec![day(1), day(3)]);
        assert_eq!(report.exit_days, vec![day(1), day(3)]);
    }

    #[test]
    fn test_slow_is_truncated_to_fast() {
        // Slow starts three days earlier
        let fast = series_from_day(4, &[5.0, 6.0, 7.0]);
        let slow = series_from_day(1, &[9.0, 9.0, 9.0, 6.0, 5.0, 4.0]);
        let report = find_crossings(&fast, &slow).unwrap();
        assert_eq!(report.enter_days, vec![day(5)]);
        assert_eq!(report.exit_days, vec![day(6)]);
    }

    #[test]
    fn test_equal_series_is_single_flat_segment() {
        let fast = series_from_day(1, &[4.0; 6]);
        let report = find_crossings(&fast, &fast).unwrap();
        assert!(report.enter_days.is_empty());
        assert_eq!(report.segments.len(), 1);
        assert_eq!(report.segments[0].direction, Direction::Flat);
    }

    #[test]
    fn test_misaligned_inputs() {
        let fast = series_from_day(1, &[1.0, 2.0, 3.0]);
        assert_matches!(
            find_crossings(&series_from_day(1, &[]), &fast),
            Err(SignalError::MisalignedSeries { .. })
        );
        assert_matches!(
            find_crossings(&fast, &series_from_day(1, &[1.0, 2.0])),
            Err(SignalError::MisalignedSeries { .. })
        );
        // Same length but shifted by a day
        assert_matches!(
            find_crossings(&fast, &series_from_day(2, &[1.0, 2.0, 3.0])),
            Err(SignalError::MisalignedSeries { .. })
        );
    }
}
