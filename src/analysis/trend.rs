use itertools::Itertools;

use super::extrema::nearest_prior_extremum;
#[cfg(debug_assertions)]
use crate::config::PRINT_TREND_VOTES;
use crate::config::TrendSettings;
use crate::error::{Result, SignalError, ensure_finite};
use crate::models::{Direction, ExtremumPoint, IndicatorSeries, Segment, SegmentIds, SignalReport};

/// One day's reading against the latest extrema: above the prior maximum,
/// below the prior minimum, or in between.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
enum Vote {
    Above,
    Below,
    Inside,
}

fn vote(price: f64, prior_max: Option<&ExtremumPoint>, prior_min: Option<&ExtremumPoint>) -> Vote {
    if prior_max.is_some_and(|max| price > max.value) {
        Vote::Above
    } else if prior_min.is_some_and(|min| price < min.value) {
        Vote::Below
    } else {
        Vote::Inside
    }
}

fn validate(params: &TrendSettings) -> Result<()> {
    if params.vote_window == 0 {
        return Err(SignalError::invalid(0, "vote window must be at least one day"));
    }
    if !(params.vote_threshold > 0.0 && params.vote_threshold <= 1.0) {
        return Err(SignalError::invalid(
            0,
            format!("vote threshold must be in (0, 1], got {}", params.vote_threshold),
        ));
    }
    Ok(())
}

/// Smallest whole number of votes that reaches `threshold` of `window`.
/// The epsilon absorbs products like `0.28 * 25 = 7.000000000000001`.
fn votes_needed(threshold: f64, window: usize) -> usize {
    ((threshold * window as f64) - 1e-9).ceil().max(0.0) as usize
}

/// Label runs of days as up or down trends from where price sits relative to
/// the most recent prior extrema.
///
/// Over the trailing `window_days`, each day votes Above/Below/Inside. A day is
/// `Up` when at least `vote_threshold` of the last `vote_window` votes are Above,
/// `Down` when that share are Below. Runs shorter than `min_segment_len` are
/// discarded. Enter/exit days are the bounds of the surviving `Up` runs.
pub fn classify_trend(
    prices: &IndicatorSeries,
    maxima: &[ExtremumPoint],
    minima: &[ExtremumPoint],
    params: &TrendSettings,
) -> Result<SignalReport> {
    if prices.is_empty() {
        return Err(SignalError::EmptySeries);
    }
    validate(params)?;
    ensure_finite(prices.values(), "trend prices")?;

    let window = prices.tail(params.window_days);

    // Days before the first extremum of either kind have nothing to compare against
    let votes: Vec<(i64, Vote)> = window
        .iter()
        .filter_map(|(day, price)| {
            let prior_max = nearest_prior_extremum(maxima, day);
            let prior_min = nearest_prior_extremum(minima, day);
            if prior_max.is_none() && prior_min.is_none() {
                return None;
            }
            Some((day, vote(price, prior_max, prior_min)))
        })
        .collect();

    let needed = votes_needed(params.vote_threshold, params.vote_window);
    let labels: Vec<(i64, Option<Direction>)> = votes
        .iter()
        .enumerate()
        .map(|(idx, &(day, _))| {
            if idx + 1 < params.vote_window {
                return (day, None);
            }
            let tally = &votes[idx + 1 - params.vote_window..=idx];
            let above = tally.iter().filter(|(_, v)| *v == Vote::Above).count();
            let below = tally.iter().filter(|(_, v)| *v == Vote::Below).count();

            #[cfg(debug_assertions)]
            if PRINT_TREND_VOTES {
                log::info!(
                    "Trend vote at {}: {} above, {} below of {} (need {})",
                    day,
                    above,
                    below,
                    params.vote_window,
                    needed
                );
            }

            let label = if above >= needed {
                Some(Direction::Up)
            } else if below >= needed {
                Some(Direction::Down)
            } else {
                None
            };
            (day, label)
        })
        .collect();

    let mut ids = SegmentIds::default();
    let mut segments = Vec::new();
    let mut dropped = 0;

    for (label, run) in &labels.iter().chunk_by(|(_, label)| *label) {
        let Some(direction) = label else {
            continue;
        };
        let run: Vec<i64> = run.map(|(day, _)| *day).collect();
        let id = ids.next_id();
        if run.len() < params.min_segment_len {
            dropped += 1;
            continue;
        }
        segments.push(Segment {
            id,
            direction,
            start_ms: run[0],
            end_ms: run[run.len() - 1],
            length: run.len(),
        });
    }

    log::debug!(
        "Trend: {} voting days, {} segments kept, {} shorter than {} days dropped",
        votes.len(),
        segments.len(),
        dropped,
        params.min_segment_len
    );

    Ok(SignalReport::from_segments(segments))
}
