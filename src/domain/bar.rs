use serde::{Deserialize, Serialize};

use crate::error::{Result, SignalError};

/// One OHLCV bar. Prices and volume are finite and non-negative.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct Bar {
    pub timestamp_ms: i64,
    pub open_price: f64,
    pub high_price: f64,
    pub low_price: f64,
    pub close_price: f64,
    pub volume: f64,
}

impl Bar {
    pub fn new(
        timestamp_ms: i64,
        open_price: f64,
        high_price: f64,
        low_price: f64,
        close_price: f64,
        volume: f64,
    ) -> Self {
        Bar {
            timestamp_ms,
            open_price,
            high_price,
            low_price,
            close_price,
            volume,
        }
    }

    /// Checks the value constraints of a bar sitting at `index` of its series.
    pub fn validate(&self, index: usize) -> Result<()> {
        let fields = [
            ("open", self.open_price),
            ("high", self.high_price),
            ("low", self.low_price),
            ("close", self.close_price),
            ("volume", self.volume),
        ];
        for (name, value) in fields {
            if !value.is_finite() {
                return Err(SignalError::invalid(
                    index,
                    format!("{} is not finite ({})", name, value),
                ));
            }
            if value < 0.0 {
                return Err(SignalError::invalid(
                    index,
                    format!("{} is negative ({})", name, value),
                ));
            }
        }
        Ok(())
    }
}
