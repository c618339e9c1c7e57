use crate::analysis::{
    bucket_momentum, classify_trend, exponential_ma, find_crossings, find_extrema,
    find_peaks_by_distance, macd, momentum, momentum_derivative, moving_average, simple_ma,
};
#[cfg(debug_assertions)]
use crate::config::PRINT_PIPELINE_TIMINGS;
use crate::config::AnalysisConfig;
use crate::error::{Result, SignalError};
use crate::models::{Extrema, IndicatorSeries, PriceSeries};
use crate::utils::maths_utils::normalize_max;
use crate::utils::time_utils::epoch_ms_to_utc;

use super::request::{AnalysisReport, AnalysisRequest, Study};

/// Run every requested study over `prices`.
///
/// Studies run in `Study` order and the first failure aborts the run, so a
/// caller with short histories should only ask for what the data supports.
pub fn analyze(prices: &PriceSeries, request: &AnalysisRequest) -> Result<AnalysisReport> {
    if prices.is_empty() {
        return Err(SignalError::EmptySeries);
    }

    let mut report = AnalysisReport {
        symbol: request.symbol.clone(),
        period: request.period.clone(),
        timeframe: request.timeframe.clone(),
        bar_count: prices.len(),
        first_day: prices.first_timestamp_ms().map(epoch_ms_to_utc),
        last_day: prices.last_timestamp_ms().map(epoch_ms_to_utc),
        ..Default::default()
    };

    let closes = prices.close_series();
    let config = &request.config;

    for &study in &request.studies {
        #[cfg(debug_assertions)]
        let started = std::time::Instant::now();

        run_study(study, prices, &closes, config, &mut report)?;

        #[cfg(debug_assertions)]
        if PRINT_PIPELINE_TIMINGS {
            log::info!("{} {} took {:?}", request.symbol, study, started.elapsed());
        }
    }

    log::debug!(
        "Analysed {} ({} bars, {} studies)",
        request.symbol,
        prices.len(),
        request.studies.len()
    );

    Ok(report)
}

fn run_study(
    study: Study,
    prices: &PriceSeries,
    closes: &IndicatorSeries,
    config: &AnalysisConfig,
    report: &mut AnalysisReport,
) -> Result<()> {
    let averages = &config.moving_averages;
    let limit = Some(averages.lookback_limit);

    match study {
        Study::Sma200 => {
            report.sma200 = Some(simple_ma(closes, averages.long_sma_window, limit)?);
        }
        Study::Ema20 => {
            report.ema20 = Some(exponential_ma(closes, averages.fast_ema_window, limit)?);
        }
        Study::Ema50 => {
            report.ema50 = Some(exponential_ma(closes, averages.slow_ema_window, limit)?);
        }
        Study::Momentum => {
            report.momentum = Some(momentum(closes, config.momentum.lag_days)?);
        }
        Study::MomentumDerivative => {
            report.momentum_derivative = Some(trimmed_derivative(closes, config)?);
        }
        Study::MomentumBuckets => {
            let mom = momentum(closes, config.momentum.lag_days)?;
            report.momentum_buckets = Some(bucket_momentum(&mom, config.momentum.bucket_threshold)?);
        }
        Study::Macd => {
            report.macd = Some(macd(closes, config.macd.short_window, config.macd.long_window)?);
        }
        Study::MacdExtrema => {
            let diff = macd(closes, config.macd.short_window, config.macd.long_window)?;
            report.macd_extrema = Some(find_extrema(
                &diff,
                config.macd.extrema_lookback,
                config.macd.extrema_tolerance_pct,
                config.extrema.discard_warmup,
            )?);
        }
        Study::PriceExtrema => {
            report.price_extrema = Some(price_extrema(closes, config)?);
        }
        Study::PeakMarkers => {
            report.peak_markers =
                Some(find_peaks_by_distance(closes, config.extrema.peak_min_distance)?);
        }
        Study::Crossover => {
            let fast_spec = config.crossover.fast;
            let slow_spec = config.crossover.slow;
            let fast = moving_average(closes, fast_spec.kind, fast_spec.window, limit)?;
            let slow = moving_average(closes, slow_spec.kind, slow_spec.window, limit)?;
            // The longer window leaves fewer points; compare over the common tail
            let common = fast.len().min(slow.len());
            report.crossover = Some(find_crossings(&fast.tail(common), &slow)?);
        }
        Study::Trend => {
            let extrema = price_extrema(closes, config)?;
            report.trend = Some(classify_trend(
                closes,
                &extrema.maxima,
                &extrema.minima,
                &config.trend,
            )?);
        }
        Study::Volume => {
            report.volume = Some(prices.right_aligned(normalize_max(prices.volumes()))?);
        }
    }
    Ok(())
}

fn price_extrema(closes: &IndicatorSeries, config: &AnalysisConfig) -> Result<Extrema> {
    find_extrema(
        closes,
        config.extrema.lookback,
        config.extrema.tolerance_pct,
        config.extrema.discard_warmup,
    )
}

fn trimmed_derivative(closes: &IndicatorSeries, config: &AnalysisConfig) -> Result<IndicatorSeries> {
    let settings = &config.momentum;
    let mom = momentum(closes, settings.lag_days)?;
    let derivative = momentum_derivative(&mom, settings.derivative_scheme, settings.derivative_order)?;
    Ok(derivative.tail(derivative.len().saturating_sub(settings.derivative_trim)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Direction;
    use assert_matches::assert_matches;

    const DAY_MS: i64 = 86_400_000;

    /// A slow sine wave on a rising baseline, long enough for every default window.
    fn synthetic(days: usize) -> PriceSeries {
        let timestamps: Vec<i64> = (0..days as i64).map(|d| d * DAY_MS).collect();
        let closes: Vec<f64> = (0..days)
            .map(|d| 100.0 + 0.05 * d as f64 + 15.0 * (d as f64 / 20.0).sin())
            .collect();
        PriceSeries::from_closes("SYN", &timestamps, &closes).unwrap()
    }

    #[test]
    fn test_only_requested_studies_are_filled() {
        let prices = synthetic(300);
        let request = AnalysisRequest::new("SYN", "1y", "1d").with_studies([Study::Ema20, Study::Macd]);
        let report = analyze(&prices, &request).unwrap();

        assert!(report.ema20.is_some());
        assert!(report.macd.is_some());
        assert!(report.sma200.is_none());
        assert!(report.trend.is_none());
        assert_eq!(report.bar_count, 300);
        assert_eq!(report.first_day.as_deref(), Some("1970-01-01"));
    }

    #[test]
    fn test_full_run_on_long_history() {
        let prices = synthetic(600);
        let report = analyze(&prices, &AnalysisRequest::new("SYN", "2y", "1d")).unwrap();

        assert_eq!(report.sma200.as_ref().map(|s| s.len()), Some(360));
        assert_eq!(report.ema50.as_ref().map(|s| s.len()), Some(360));
        assert_eq!(report.momentum.as_ref().map(|s| s.len()), Some(600 - 15));
        assert_eq!(
            report.momentum_buckets.as_ref().map(|b| b.len()),
            report.momentum.as_ref().map(|s| s.len())
        );

        let crossover = report.crossover.as_ref().unwrap();
        assert!(crossover.trade_count() > 0, "sine wave should cross: {:?}", crossover);
        assert!(
            crossover
                .segments
                .iter()
                .filter(|s| s.direction == Direction::Up)
                .count()
                == crossover.trade_count()
        );

        // Volume is all zero for close-only data and passes through unchanged
        let volume = report.volume.as_ref().unwrap();
        assert!(volume.values().iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_derivative_trim_drops_leading_points() {
        let prices = synthetic(120);
        let mut config = AnalysisConfig::default();
        let request = AnalysisRequest::new("SYN", "6mo", "1d").with_studies([Study::MomentumDerivative]);
        let untrimmed = analyze(&prices, &request.clone().with_config(config.clone())).unwrap();

        config.momentum.derivative_trim = 16;
        let trimmed = analyze(&prices, &request.with_config(config)).unwrap();

        let full = untrimmed.momentum_derivative.unwrap();
        let cut = trimmed.momentum_derivative.unwrap();
        assert_eq!(cut.len(), full.len() - 16);
        assert_eq!(cut.last(), full.last());
    }

    #[test]
    fn test_short_history_reports_insufficient_history() {
        let prices = synthetic(100);
        let request = AnalysisRequest::new("SYN", "3mo", "1d").with_studies([Study::Sma200]);
        assert_matches!(
            analyze(&prices, &request),
            Err(SignalError::InsufficientHistory { required: 200, available: 100 })
        );
    }

    #[test]
    fn test_analysis_is_repeatable() {
        let prices = synthetic(400);
        let request = AnalysisRequest::new("SYN", "1y", "1d");
        assert_eq!(analyze(&prices, &request).unwrap(), analyze(&prices, &request).unwrap());
    }
}
