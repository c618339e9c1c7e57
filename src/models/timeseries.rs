use serde::{Deserialize, Serialize};

use crate::domain::Bar;
use crate::error::{Result, SignalError};

// ============================================================================
// PriceSeries: Raw OHLCV history for one symbol
// ============================================================================

/// Serialized column layout of a `PriceSeries`. Deserialization goes through
/// `PriceSeries::try_from` so the column invariants hold for loaded data too.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
struct PriceColumns {
    symbol: String,
    timestamps_ms: Vec<i64>,
    open_prices: Vec<f64>,
    high_prices: Vec<f64>,
    low_prices: Vec<f64>,
    close_prices: Vec<f64>,
    volumes: Vec<f64>,
}

/// Chronological OHLCV bars stored column-wise.
/// Timestamps are strictly increasing epoch milliseconds and every column has the same length.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(try_from = "PriceColumns", into = "PriceColumns")]
pub struct PriceSeries {
    symbol: String,

    timestamps_ms: Vec<i64>,

    // Prices
    open_prices: Vec<f64>,
    high_prices: Vec<f64>,
    low_prices: Vec<f64>,
    close_prices: Vec<f64>,

    volumes: Vec<f64>,
}

impl PriceSeries {
    /// Build a series from bars in insertion order.
    /// Rejects invalid bars and timestamps that do not strictly increase.
    pub fn from_bars(symbol: impl Into<String>, bars: &[Bar]) -> Result<Self> {
        let mut series = PriceSeries {
            symbol: symbol.into(),
            timestamps_ms: Vec::with_capacity(bars.len()),
            open_prices: Vec::with_capacity(bars.len()),
            high_prices: Vec::with_capacity(bars.len()),
            low_prices: Vec::with_capacity(bars.len()),
            close_prices: Vec::with_capacity(bars.len()),
            volumes: Vec::with_capacity(bars.len()),
        };

        for (idx, bar) in bars.iter().enumerate() {
            bar.validate(idx)?;
            if let Some(&prev) = series.timestamps_ms.last()
                && bar.timestamp_ms <= prev
            {
                return Err(SignalError::invalid(
                    idx,
                    format!(
                        "timestamp {} does not follow previous timestamp {}",
                        bar.timestamp_ms, prev
                    ),
                ));
            }
            series.timestamps_ms.push(bar.timestamp_ms);
            series.open_prices.push(bar.open_price);
            series.high_prices.push(bar.high_price);
            series.low_prices.push(bar.low_price);
            series.close_prices.push(bar.close_price);
            series.volumes.push(bar.volume);
        }

        Ok(series)
    }

    /// Convenience for close-only data: open/high/low mirror the close, volume is zero.
    pub fn from_closes(symbol: impl Into<String>, timestamps_ms: &[i64], closes: &[f64]) -> Result<Self> {
        if timestamps_ms.len() != closes.len() {
            return Err(SignalError::misaligned(format!(
                "{} timestamps for {} closes",
                timestamps_ms.len(),
                closes.len()
            )));
        }
        let bars: Vec<Bar> = timestamps_ms
            .iter()
            .zip(closes)
            .map(|(&ts, &close)| Bar::new(ts, close, close, close, close, 0.0))
            .collect();
        Self::from_bars(symbol, &bars)
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn len(&self) -> usize {
        self.close_prices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.close_prices.is_empty()
    }

    pub fn timestamps(&self) -> &[i64] {
        &self.timestamps_ms
    }

    pub fn closes(&self) -> &[f64] {
        &self.close_prices
    }

    pub fn volumes(&self) -> &[f64] {
        &self.volumes
    }

    /// The closing-price column as an indicator-shaped series.
    pub fn close_series(&self) -> IndicatorSeries {
        IndicatorSeries {
            timestamps_ms: self.timestamps_ms.clone(),
            values: self.close_prices.clone(),
        }
    }

    /// Wraps `values` so that they line up with the last `values.len()` bars.
    pub fn right_aligned(&self, values: Vec<f64>) -> Result<IndicatorSeries> {
        IndicatorSeries::right_aligned(&self.timestamps_ms, values)
    }

    pub fn first_timestamp_ms(&self) -> Option<i64> {
        self.timestamps_ms.first().copied()
    }

    pub fn last_timestamp_ms(&self) -> Option<i64> {
        self.timestamps_ms.last().copied()
    }
}

impl TryFrom<PriceColumns> for PriceSeries {
    type Error = SignalError;

    fn try_from(columns: PriceColumns) -> Result<Self> {
        let n = columns.timestamps_ms.len();
        let lengths = [
            ("open", columns.open_prices.len()),
            ("high", columns.high_prices.len()),
            ("low", columns.low_prices.len()),
            ("close", columns.close_prices.len()),
            ("volume", columns.volumes.len()),
        ];
        if let Some((name, len)) = lengths.iter().find(|(_, len)| *len != n) {
            return Err(SignalError::misaligned(format!(
                "{} timestamps for {} {} values",
                n, len, name
            )));
        }
        let bars: Vec<Bar> = (0..n)
            .map(|i| {
                Bar::new(
                    columns.timestamps_ms[i],
                    columns.open_prices[i],
                    columns.high_prices[i],
                    columns.low_prices[i],
                    columns.close_prices[i],
                    columns.volumes[i],
                )
            })
            .collect();
        Self::from_bars(columns.symbol, &bars)
    }
}

impl From<PriceSeries> for PriceColumns {
    fn from(series: PriceSeries) -> Self {
        Self {
            symbol: series.symbol,
            timestamps_ms: series.timestamps_ms,
            open_prices: series.open_prices,
            high_prices: series.high_prices,
            low_prices: series.low_prices,
            close_prices: series.close_prices,
            volumes: series.volumes,
        }
    }
}

// ============================================================================
// IndicatorSeries: (timestamp, value) pairs derived from a PriceSeries
// ============================================================================

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
struct IndicatorColumns {
    timestamps_ms: Vec<i64>,
    values: Vec<f64>,
}

/// Equal-length timestamp and value columns. Only constructible through
/// `new` (or deserialization, which runs the same check).
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(try_from = "IndicatorColumns", into = "IndicatorColumns")]
pub struct IndicatorSeries {
    timestamps_ms: Vec<i64>,
    values: Vec<f64>,
}

impl IndicatorSeries {
    pub fn new(timestamps_ms: Vec<i64>, values: Vec<f64>) -> Result<Self> {
        if timestamps_ms.len() != values.len() {
            return Err(SignalError::misaligned(format!(
                "{} timestamps for {} values",
                timestamps_ms.len(),
                values.len()
            )));
        }
        Ok(Self {
            timestamps_ms,
            values,
        })
    }

    /// Pair `values` with the trailing timestamps of `source_timestamps`.
    pub(crate) fn right_aligned(source_timestamps: &[i64], values: Vec<f64>) -> Result<Self> {
        let Some(offset) = source_timestamps.len().checked_sub(values.len()) else {
            return Err(SignalError::misaligned(format!(
                "{} values cannot be aligned to {} timestamps",
                values.len(),
                source_timestamps.len()
            )));
        };
        Ok(Self {
            timestamps_ms: source_timestamps[offset..].to_vec(),
            values,
        })
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn timestamps(&self) -> &[i64] {
        &self.timestamps_ms
    }

    pub fn iter(&self) -> impl Iterator<Item = (i64, f64)> + '_ {
        self.timestamps_ms
            .iter()
            .copied()
            .zip(self.values.iter().copied())
    }

    pub fn last(&self) -> Option<(i64, f64)> {
        Some((*self.timestamps_ms.last()?, *self.values.last()?))
    }

    /// The trailing `count` points (or all of them if there are fewer).
    pub fn tail(&self, count: usize) -> IndicatorSeries {
        let start = self.len().saturating_sub(count);
        IndicatorSeries {
            timestamps_ms: self.timestamps_ms[start..].to_vec(),
            values: self.values[start..].to_vec(),
        }
    }

    /// Value recorded at exactly `timestamp_ms`, if any.
    pub fn value_at(&self, timestamp_ms: i64) -> Option<f64> {
        self.timestamps_ms
            .binary_search(&timestamp_ms)
            .ok()
            .map(|idx| self.values[idx])
    }
}

impl TryFrom<IndicatorColumns> for IndicatorSeries {
    type Error = SignalError;

    fn try_from(columns: IndicatorColumns) -> Result<Self> {
        Self::new(columns.timestamps_ms, columns.values)
    }
}

impl From<IndicatorSeries> for IndicatorColumns {
    fn from(series: IndicatorSeries) -> Self {
        Self {
            timestamps_ms: series.timestamps_ms,
            values: series.values,
        }
    }
}
