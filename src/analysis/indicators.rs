//! Moving averages, momentum and its derivative, MACD.
//!
//! Every function reads a closing-price (or derived) series and returns a new
//! series right-aligned to its input: the last output value always belongs to
//! the last input day. Nothing here keeps state between calls.

use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;

use crate::error::{Result, SignalError, ensure_finite};
use crate::models::IndicatorSeries;

#[derive(
    Copy,
    Clone,
    PartialEq,
    Eq,
    Hash,
    Debug,
    Serialize,
    Deserialize,
    strum_macros::Display,
    strum_macros::EnumString,
    strum_macros::EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum MovingAverageKind {
    Simple,
    Exponential,
}

#[derive(
    Copy,
    Clone,
    PartialEq,
    Eq,
    Hash,
    Debug,
    Serialize,
    Deserialize,
    strum_macros::Display,
    strum_macros::EnumString,
    strum_macros::EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum DifferenceScheme {
    Upwind,
    Centered,
}

#[derive(
    Copy,
    Clone,
    PartialEq,
    Eq,
    Hash,
    Debug,
    Serialize,
    Deserialize,
    strum_macros::Display,
    strum_macros::EnumString,
    strum_macros::EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum DifferenceOrder {
    First,
    Second,
    Third,
}

/// A supported finite-difference stencil.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Stencil {
    UpwindFirst,
    UpwindSecond,
    UpwindThird,
    CenteredSecond,
}

impl Stencil {
    pub fn new(scheme: DifferenceScheme, order: DifferenceOrder) -> Result<Self> {
        match (scheme, order) {
            (DifferenceScheme::Upwind, DifferenceOrder::First) => Ok(Stencil::UpwindFirst),
            (DifferenceScheme::Upwind, DifferenceOrder::Second) => Ok(Stencil::UpwindSecond),
            (DifferenceScheme::Upwind, DifferenceOrder::Third) => Ok(Stencil::UpwindThird),
            (DifferenceScheme::Centered, DifferenceOrder::Second) => Ok(Stencil::CenteredSecond),
            (scheme, order) => Err(SignalError::Unsupported {
                what: format!("{} scheme with {} order", scheme, order),
            }),
        }
    }

    /// How many points the stencil consumes; the output is this much shorter.
    pub fn order(&self) -> usize {
        match self {
            Stencil::UpwindFirst => 1,
            Stencil::UpwindSecond => 2,
            Stencil::UpwindThird => 3,
            Stencil::CenteredSecond => 2,
        }
    }

    /// Index of the first input point that receives a derivative value.
    fn first_index(&self) -> usize {
        match self {
            Stencil::CenteredSecond => 1,
            upwind => upwind.order(),
        }
    }

    fn apply(&self, a: &[f64]) -> Vec<f64> {
        let n = a.len();
        match self {
            Stencil::UpwindFirst => (1..n).map(|i| a[i] - a[i - 1]).collect(),
            Stencil::UpwindSecond => (2..n)
                .map(|i| 0.5 * (3.0 * a[i] - 4.0 * a[i - 1] + a[i - 2]))
                .collect(),
            Stencil::UpwindThird => (3..n)
                .map(|i| (11.0 * a[i] - 18.0 * a[i - 1] + 9.0 * a[i - 2] - 2.0 * a[i - 3]) / 6.0)
                .collect(),
            Stencil::CenteredSecond => (1..n - 1).map(|i| 0.5 * (a[i + 1] - a[i - 1])).collect(),
        }
    }
}

/// Momentum reading bucket, as used for colouring momentum bars.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Serialize, Deserialize, strum_macros::Display)]
pub enum MomentumBucket {
    Rising,
    Falling,
    Steady,
}

fn check_input(series: &IndicatorSeries) -> Result<()> {
    if series.is_empty() {
        return Err(SignalError::EmptySeries);
    }
    ensure_finite(series.values(), "input series")
}

fn check_window(window: usize, available: usize) -> Result<()> {
    if window == 0 {
        return Err(SignalError::invalid(0, "window must be at least one day"));
    }
    if available < window {
        return Err(SignalError::InsufficientHistory {
            required: window,
            available,
        });
    }
    Ok(())
}

/// Simple moving average over the trailing `limit` days.
///
/// Value `k` of the output is the mean of the `window` closes ending at input
/// index `n - limit + k`. `limit` defaults to, and is clamped at,
/// `n - window + 1`.
pub fn simple_ma(series: &IndicatorSeries, window: usize, limit: Option<usize>) -> Result<IndicatorSeries> {
    check_input(series)?;
    let closes = series.values();
    let n = closes.len();
    check_window(window, n)?;

    let max_limit = n - window + 1;
    let limit = limit.map_or(max_limit, |l| l.min(max_limit));

    let values: Vec<f64> = (n - limit..n)
        .map(|end| closes[end + 1 - window..=end].iter().mean())
        .collect();

    ensure_finite(&values, "simple moving average")?;
    IndicatorSeries::right_aligned(series.timestamps(), values)
}

/// Exponential moving average over the trailing `limit` days.
///
/// Seeded with the simple mean of the `window` closes just before the
/// lookback, then `ema += K * (close - ema)` with `K = 2 / (window + 1)`.
/// The seed consumes `window` closes, so `limit` is clamped at `n - window`.
pub fn exponential_ma(
    series: &IndicatorSeries,
    window: usize,
    limit: Option<usize>,
) -> Result<IndicatorSeries> {
    check_input(series)?;
    let closes = series.values();
    let n = closes.len();
    check_window(window, n)?;

    let max_limit = n - window;
    let limit = limit.map_or(max_limit, |l| l.min(max_limit));
    let start = n - limit;

    let smoothing = 2.0 / (window as f64 + 1.0);
    let mut ema = closes[start - window..start].iter().mean();

    let values: Vec<f64> = closes[start..]
        .iter()
        .map(|&close| {
            ema += smoothing * (close - ema);
            ema
        })
        .collect();

    ensure_finite(&values, "exponential moving average")?;
    IndicatorSeries::right_aligned(series.timestamps(), values)
}

pub fn moving_average(
    series: &IndicatorSeries,
    kind: MovingAverageKind,
    window: usize,
    limit: Option<usize>,
) -> Result<IndicatorSeries> {
    match kind {
        MovingAverageKind::Simple => simple_ma(series, window, limit),
        MovingAverageKind::Exponential => exponential_ma(series, window, limit),
    }
}

/// `close[d] - close[d - lag]` for every day `d >= lag`.
pub fn momentum(series: &IndicatorSeries, lag: usize) -> Result<IndicatorSeries> {
    check_input(series)?;
    if lag == 0 {
        return Err(SignalError::invalid(0, "momentum lag must be at least one day"));
    }
    let closes = series.values();
    let n = closes.len();
    if n <= lag {
        return Err(SignalError::InsufficientHistory {
            required: lag + 1,
            available: n,
        });
    }

    let values: Vec<f64> = (lag..n).map(|d| closes[d] - closes[d - lag]).collect();

    ensure_finite(&values, "momentum")?;
    IndicatorSeries::right_aligned(series.timestamps(), values)
}

/// Apply `stencil` to bare values. The result is `stencil.order()` shorter.
pub fn finite_difference(values: &[f64], stencil: Stencil) -> Result<Vec<f64>> {
    if values.is_empty() {
        return Err(SignalError::EmptySeries);
    }
    ensure_finite(values, "derivative input")?;
    if values.len() <= stencil.order() {
        return Err(SignalError::InsufficientHistory {
            required: stencil.order() + 1,
            available: values.len(),
        });
    }

    let derivative = stencil.apply(values);
    ensure_finite(&derivative, "derivative")?;
    Ok(derivative)
}

/// Numerical derivative of a momentum series.
///
/// Upwind results stay right-aligned. The centered stencil has no value for
/// the first and last point, so its output is aligned to the interior days.
pub fn momentum_derivative(
    momentum: &IndicatorSeries,
    scheme: DifferenceScheme,
    order: DifferenceOrder,
) -> Result<IndicatorSeries> {
    let stencil = Stencil::new(scheme, order)?;
    let values = finite_difference(momentum.values(), stencil)?;

    let first = stencil.first_index();
    let timestamps = momentum.timestamps()[first..first + values.len()].to_vec();
    IndicatorSeries::new(timestamps, values)
}

/// Short-window SMA minus long-window SMA, aligned to the shorter of the two.
pub fn macd(series: &IndicatorSeries, short_window: usize, long_window: usize) -> Result<IndicatorSeries> {
    let short = simple_ma(series, short_window, None)?;
    let long = simple_ma(series, long_window, None)?;

    let len = short.len().min(long.len());
    let short = &short.values()[short.len() - len..];
    let long = &long.values()[long.len() - len..];

    let values: Vec<f64> = short.iter().zip(long).map(|(s, l)| s - l).collect();
    IndicatorSeries::right_aligned(series.timestamps(), values)
}

/// Bucket each momentum value against a symmetric `threshold`.
pub fn bucket_momentum(momentum: &IndicatorSeries, threshold: f64) -> Result<Vec<MomentumBucket>> {
    if !threshold.is_finite() || threshold < 0.0 {
        return Err(SignalError::invalid(
            0,
            format!("momentum threshold must be finite and non-negative ({})", threshold),
        ));
    }
    Ok(momentum
        .values()
        .iter()
        .map(|&m| {
            if m > threshold {
                MomentumBucket::Rising
            } else if m < -threshold {
                MomentumBucket::Falling
            } else {
                MomentumBucket::Steady
            }
        })
        .collect())
}
