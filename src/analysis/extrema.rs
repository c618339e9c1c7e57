use find_peaks::PeakFinder;

#[cfg(debug_assertions)]
use crate::config::PRINT_EXTREMA_SUPPRESSION;
use crate::error::{Result, SignalError, ensure_finite};
use crate::models::{Extrema, ExtremumKind, ExtremumPoint, IndicatorSeries};

/// Remembers the last emitted maximum and minimum so near-duplicates can be rejected.
struct ToleranceBand {
    fraction: f64,
    last_max: Option<f64>,
    last_min: Option<f64>,
}

impl ToleranceBand {
    fn new(tolerance_pct: f64) -> Self {
        Self {
            fraction: tolerance_pct / 100.0,
            last_max: None,
            last_min: None,
        }
    }

    fn within(&self, candidate: f64, last: Option<f64>) -> bool {
        last.is_some_and(|last| (candidate - last).abs() <= self.fraction * last.abs())
    }

    fn suppresses(&self, candidate: f64) -> bool {
        self.within(candidate, self.last_max) || self.within(candidate, self.last_min)
    }

    fn record(&mut self, kind: ExtremumKind, value: f64) {
        match kind {
            ExtremumKind::Max => self.last_max = Some(value),
            ExtremumKind::Min => self.last_min = Some(value),
        }
    }
}

fn turning_point(prev: f64, current: f64, next: f64) -> Option<ExtremumKind> {
    if prev < current && current > next {
        Some(ExtremumKind::Max)
    } else if prev > current && current < next {
        Some(ExtremumKind::Min)
    } else {
        None
    }
}

/// Local maxima and minima over the trailing `lookback` points.
///
/// A candidate within `tolerance_pct` percent of the last emitted maximum or
/// minimum is dropped. The last point of the window counts as an extremum when
/// it keeps moving in the direction of the previous step. With
/// `discard_warmup` the first detected maximum and first detected minimum are
/// removed from the result.
pub fn find_extrema(
    series: &IndicatorSeries,
    lookback: usize,
    tolerance_pct: f64,
    discard_warmup: bool,
) -> Result<Extrema> {
    if series.is_empty() {
        return Err(SignalError::EmptySeries);
    }
    if !tolerance_pct.is_finite() || tolerance_pct < 0.0 {
        return Err(SignalError::invalid(
            0,
            format!("tolerance must be a non-negative percentage ({})", tolerance_pct),
        ));
    }
    ensure_finite(series.values(), "extrema input")?;

    let start = series.len() - lookback.min(series.len());
    let timestamps = &series.timestamps()[start..];
    let values = &series.values()[start..];

    let mut band = ToleranceBand::new(tolerance_pct);
    let mut extrema = Extrema::default();

    let mut emit = |kind: ExtremumKind, idx: usize, band: &mut ToleranceBand| {
        let value = values[idx];
        if band.suppresses(value) {
            #[cfg(debug_assertions)]
            if PRINT_EXTREMA_SUPPRESSION {
                log::info!(
                    "Suppressed {} candidate {:.4} at {} (last max {:?}, last min {:?})",
                    kind,
                    value,
                    timestamps[idx],
                    band.last_max,
                    band.last_min
                );
            }
            return;
        }
        band.record(kind, value);
        let point = ExtremumPoint {
            timestamp_ms: timestamps[idx],
            value,
            kind,
        };
        match kind {
            ExtremumKind::Max => extrema.maxima.push(point),
            ExtremumKind::Min => extrema.minima.push(point),
        }
    };

    let mut turned = false;
    for idx in 1..values.len().saturating_sub(1) {
        if let Some(kind) = turning_point(values[idx - 1], values[idx], values[idx + 1]) {
            turned = true;
            emit(kind, idx, &mut band);
        }
    }

    // The most recent bar may be an extremum that has not resolved yet.
    // A window without any turning point is monotonic and yields nothing.
    if turned && values.len() >= 2 {
        let last = values.len() - 1;
        if values[last] > values[last - 1] {
            emit(ExtremumKind::Max, last, &mut band);
        } else if values[last] < values[last - 1] {
            emit(ExtremumKind::Min, last, &mut band);
        }
    }

    if discard_warmup {
        if !extrema.maxima.is_empty() {
            extrema.maxima.remove(0);
        }
        if !extrema.minima.is_empty() {
            extrema.minima.remove(0);
        }
    }

    Ok(extrema)
}

/// Peaks and troughs at least `min_distance` bars apart, without a tolerance band.
pub fn find_peaks_by_distance(series: &IndicatorSeries, min_distance: usize) -> Result<Extrema> {
    if series.is_empty() {
        return Err(SignalError::EmptySeries);
    }
    ensure_finite(series.values(), "peak input")?;

    let to_points = |positions: Vec<usize>, kind: ExtremumKind| -> Vec<ExtremumPoint> {
        positions
            .into_iter()
            .map(|idx| ExtremumPoint {
                timestamp_ms: series.timestamps()[idx],
                value: series.values()[idx],
                kind,
            })
            .collect()
    };

    let maxima = peak_positions(series.values(), min_distance);
    let negated: Vec<f64> = series.values().iter().map(|v| -v).collect();
    let minima = peak_positions(&negated, min_distance);

    Ok(Extrema {
        maxima: to_points(maxima, ExtremumKind::Max),
        minima: to_points(minima, ExtremumKind::Min),
    })
}

fn peak_positions(values: &[f64], min_distance: usize) -> Vec<usize> {
    let mut finder = PeakFinder::new(values);
    finder.with_min_distance(min_distance.max(1));
    let mut positions: Vec<usize> = finder
        .find_peaks()
        .iter()
        .map(|peak| peak.middle_position())
        .collect();
    positions.sort_unstable();
    positions
}

/// Most recent point with `timestamp_ms <= day_ms`. `points` must be ordered by time.
pub fn nearest_prior_extremum(points: &[ExtremumPoint], day_ms: i64) -> Option<&ExtremumPoint> {
    let idx = points.partition_point(|p| p.timestamp_ms <= day_ms);
    idx.checked_sub(1).map(|i| &points[i])
}

/// Point closest in time to `day_ms` on either side; ties go to the earlier point.
pub fn nearest_extremum(points: &[ExtremumPoint], day_ms: i64) -> Option<&ExtremumPoint> {
    let idx = points.partition_point(|p| p.timestamp_ms < day_ms);
    let before = idx.checked_sub(1).map(|i| &points[i]);
    let after = points.get(idx);
    match (before, after) {
        (Some(b), Some(a)) => {
            if day_ms - b.timestamp_ms <= a.timestamp_ms - day_ms {
                Some(b)
            } else {
                Some(a)
            }
        }
        (b, a) => b.or(a),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use rstest::rstest;

    const DAY_MS: i64 = 86_400_000;

    fn day(d: i64) -> i64 {
        d * DAY_MS
    }

    /// Days are numbered from 1 so that `values[0]` sits on day 1.
    fn series(values: &[f64]) -> IndicatorSeries {
        let timestamps = (1..=values.len() as i64).map(day).collect();
        IndicatorSeries::new(timestamps, values.to_vec()).unwrap()
    }

    const PEAK_THEN_TROUGH: [f64; 9] = [10.0, 11.0, 12.0, 11.0, 10.0, 9.0, 10.0, 11.0, 12.0];

    #[test]
    fn test_peak_then_trough_detection() {
        let extrema = find_extrema(&series(&PEAK_THEN_TROUGH), 9, 0.0, false).unwrap();
        assert_eq!(extrema.max_timestamps(), vec![day(3)]);
        assert_eq!(extrema.min_timestamps(), vec![day(6)]);
        assert_eq!(extrema.maxima[0].value, 12.0);
        assert_eq!(extrema.minima[0].value, 9.0);
    }

    #[test]
    fn test_peak_then_trough_with_warmup_discard() {
        // The trailing 12 equals the previous maximum, so only one of each kind is found
        let extrema = find_extrema(&series(&PEAK_THEN_TROUGH), 9, 0.0, true).unwrap();
        assert!(extrema.is_empty(), "warm-up discard should leave nothing: {:?}", extrema);
    }

    #[test]
    fn test_final_point_is_forced_extremum() {
        let extrema = find_extrema(&series(&[10.0, 12.0, 9.0, 11.0, 14.0]), 5, 0.0, false).unwrap();
        assert_eq!(extrema.max_timestamps(), vec![day(2), day(5)]);
        assert_eq!(extrema.min_timestamps(), vec![day(3)]);
    }

    #[test]
    fn test_tolerance_band_suppresses_near_duplicates() {
        // Second peak at 100.5 is within 1.5% of the first
        let values = [90.0, 100.0, 95.0, 100.5, 96.0, 99.0, 99.0];
        let extrema = find_extrema(&series(&values), 7, 1.5, false).unwrap();
        assert_eq!(extrema.max_timestamps(), vec![day(2)]);
        // 95 is the first minimum; 96 is within band of it
        assert_eq!(extrema.min_timestamps(), vec![day(3)]);
    }

    #[test]
    fn test_band_checks_last_min_as_well_as_last_max() {
        let values = [10.0, 20.0, 10.0, 10.1, 10.0, 30.0, 25.0];
        let extrema = find_extrema(&series(&values), 7, 5.0, false).unwrap();
        // The bump to 10.1 sits within 5% of the minimum at 10 and is dropped
        assert_eq!(extrema.max_timestamps(), vec![day(2), day(6)]);
        assert_eq!(extrema.min_timestamps(), vec![day(3), day(7)]);
    }

    #[test]
    fn test_lookback_limits_scan() {
        let values = [1.0, 5.0, 1.0, 3.0, 2.0, 4.0, 5.0];
        let extrema = find_extrema(&series(&values), 4, 0.0, false).unwrap();
        // Only the trailing four points are scanned; the early peak is out of range
        assert_eq!(extrema.max_timestamps(), vec![day(7)]);
        assert_eq!(extrema.min_timestamps(), vec![day(5)]);
    }

    #[rstest]
    #[case(true)]
    #[case(false)]
    fn test_monotonic_and_constant_input_yield_no_candidates(#[case] discard_warmup: bool) {
        let rising: Vec<f64> = (0..20).map(|i| i as f64).collect();
        let extrema = find_extrema(&series(&rising), 20, 1.5, discard_warmup).unwrap();
        assert!(extrema.is_empty(), "rising: {:?}", extrema);

        let falling: Vec<f64> = rising.iter().rev().copied().collect();
        let extrema = find_extrema(&series(&falling), 20, 1.5, discard_warmup).unwrap();
        assert!(extrema.is_empty(), "falling: {:?}", extrema);

        let flat = find_extrema(&series(&[5.0; 10]), 10, 1.5, discard_warmup).unwrap();
        assert!(flat.is_empty());
    }

    #[test]
    fn test_monotonic_tail_inside_lookback_is_empty() {
        // The dip is outside the four-bar window, which only ever rises
        let values = [1.0, 5.0, 1.0, 2.0, 3.0, 4.0, 5.0];
        let extrema = find_extrema(&series(&values), 4, 0.0, false).unwrap();
        assert!(extrema.is_empty(), "{:?}", extrema);
    }

    #[test]
    fn test_zigzag_gives_one_max_and_min_per_cycle() {
        // Rising zigzag: each cycle is two points, level climbs 10 per cycle
        let cycles = 8;
        let values: Vec<f64> = (0..cycles)
            .flat_map(|k| [100.0 + 10.0 * k as f64, 120.0 + 10.0 * k as f64])
            .collect();
        let extrema = find_extrema(&series(&values), values.len(), 1.5, false).unwrap();
        assert_eq!(extrema.maxima.len(), cycles);
        assert_eq!(extrema.minima.len(), cycles - 1);
    }

    #[test]
    fn test_errors() {
        assert_matches!(find_extrema(&series(&[]), 5, 1.5, true), Err(SignalError::EmptySeries));
        assert_matches!(
            find_extrema(&series(&[1.0, 2.0]), 5, -1.0, true),
            Err(SignalError::InvalidInput { .. })
        );
    }

    #[test]
    fn test_peaks_by_distance() {
        let values = [0.0, 5.0, 0.0, 1.0, 0.0, 6.0, 0.0];
        let extrema = find_peaks_by_distance(&series(&values), 3).unwrap();
        assert_eq!(extrema.max_timestamps(), vec![day(2), day(6)]);
        assert!(extrema.maxima.iter().all(|p| p.kind == ExtremumKind::Max));
        assert!(extrema.minima.iter().all(|p| p.kind == ExtremumKind::Min));
    }

    #[test]
    fn test_nearest_prior_extremum() {
        let points: Vec<ExtremumPoint> = [2, 5, 9]
            .iter()
            .map(|&d| ExtremumPoint {
                timestamp_ms: day(d),
                value: d as f64,
                kind: ExtremumKind::Max,
            })
            .collect();
        assert_eq!(nearest_prior_extremum(&points, day(1)), None);
        assert_eq!(nearest_prior_extremum(&points, day(5)).map(|p| p.value), Some(5.0));
        assert_eq!(nearest_prior_extremum(&points, day(8)).map(|p| p.value), Some(5.0));
        assert_eq!(nearest_prior_extremum(&points, day(30)).map(|p| p.value), Some(9.0));

        assert_eq!(nearest_extremum(&points, day(1)).map(|p| p.value), Some(2.0));
        assert_eq!(nearest_extremum(&points, day(8)).map(|p| p.value), Some(9.0));
        assert_eq!(nearest_extremum(&points, day(7)).map(|p| p.value), Some(5.0));
        assert_eq!(nearest_extremum(&[], day(7)), None);
    }
}
