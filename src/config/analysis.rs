//! Analysis and computation configuration

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::analysis::indicators::{DifferenceOrder, DifferenceScheme, MovingAverageKind};

/// A moving average picked by kind and window (e.g. EMA20).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MovingAverageSpec {
    pub kind: MovingAverageKind,
    pub window: usize,
}

/// Settings for the moving-average overlays
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovingAverageSettings {
    pub fast_ema_window: usize,
    pub slow_ema_window: usize,
    pub long_sma_window: usize,
    // Number of trailing days computed for each average
    pub lookback_limit: usize,
}

/// Settings for momentum and its derivative
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MomentumSettings {
    pub lag_days: usize,
    pub derivative_scheme: DifferenceScheme,
    pub derivative_order: DifferenceOrder,
    // Extra leading derivative points dropped after the stencil is applied
    pub derivative_trim: usize,
    // |momentum| above this counts as rising/falling rather than steady
    pub bucket_threshold: f64,
}

/// Settings for the MACD-like short/long SMA difference
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MacdSettings {
    pub short_window: usize,
    pub long_window: usize,
    // MACD is smoother than price, so its extrema use a wider band
    pub extrema_tolerance_pct: f64,
    pub extrema_lookback: usize,
}

/// Settings for the extrema detector on the closing price
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtremaSettings {
    pub lookback: usize,
    pub tolerance_pct: f64,
    // Drop the first detected maximum and minimum
    pub discard_warmup: bool,
    // Minimum spacing (in bars) for the distance-based peak markers
    pub peak_min_distance: usize,
}

/// Settings for the extrema-driven trend classifier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendSettings {
    pub window_days: usize,
    pub vote_window: usize,
    pub vote_threshold: f64,
    pub min_segment_len: usize,
}

/// Which pair of averages drives the crossover signal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrossoverSettings {
    pub fast: MovingAverageSpec,
    pub slow: MovingAverageSpec,
}

/// The Master Analysis Configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    pub moving_averages: MovingAverageSettings,
    pub momentum: MomentumSettings,
    pub macd: MacdSettings,
    pub extrema: ExtremaSettings,
    pub trend: TrendSettings,
    pub crossover: CrossoverSettings,
}

pub const ANALYSIS: AnalysisConfig = AnalysisConfig {
    moving_averages: MovingAverageSettings {
        fast_ema_window: 20,
        slow_ema_window: 50,
        long_sma_window: 200,
        lookback_limit: 360,
    },

    momentum: MomentumSettings {
        lag_days: 15,
        derivative_scheme: DifferenceScheme::Upwind,
        derivative_order: DifferenceOrder::First,
        derivative_trim: 0,
        bucket_threshold: 10.0,
    },

    macd: MacdSettings {
        short_window: 12,
        long_window: 26,
        extrema_tolerance_pct: 4.0,
        extrema_lookback: 200,
    },

    extrema: ExtremaSettings {
        lookback: 200,
        tolerance_pct: 1.5,
        discard_warmup: true,
        peak_min_distance: 10,
    },

    trend: TrendSettings {
        window_days: 360,
        vote_window: 6,
        vote_threshold: 0.6,
        min_segment_len: 4,
    },

    crossover: CrossoverSettings {
        fast: MovingAverageSpec {
            kind: MovingAverageKind::Exponential,
            window: 20,
        },
        slow: MovingAverageSpec {
            kind: MovingAverageKind::Exponential,
            window: 50,
        },
    },
};

impl Default for AnalysisConfig {
    fn default() -> Self {
        ANALYSIS
    }
}

impl AnalysisConfig {
    /// Load a JSON override file. Every field must be present.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let file = File::open(path).context(format!("Failed to open config file: {:?}", path))?;
        let config = serde_json::from_reader(BufReader::new(file))
            .context(format!("Failed to parse config file: {:?}", path))?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_match_chart_conventions() {
        let config = AnalysisConfig::default();
        assert_eq!(config.moving_averages.fast_ema_window, 20);
        assert_eq!(config.moving_averages.slow_ema_window, 50);
        assert_eq!(config.moving_averages.long_sma_window, 200);
        assert_eq!(config.moving_averages.lookback_limit, 360);
        assert_eq!(config.extrema.tolerance_pct, 1.5);
        assert_eq!(config.macd.extrema_tolerance_pct, 4.0);
        assert_eq!(config.trend.min_segment_len, 4);
    }

    #[test]
    fn test_config_round_trips_through_file() {
        let mut config = AnalysisConfig::default();
        config.trend.vote_window = 3;
        config.extrema.discard_warmup = false;

        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(serde_json::to_string(&config).unwrap().as_bytes())
            .unwrap();

        let loaded = AnalysisConfig::load_from_path(file.path()).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_missing_config_file_reports_path() {
        let err = AnalysisConfig::load_from_path(Path::new("/nonexistent/trend.json")).unwrap_err();
        assert!(err.to_string().contains("trend.json"), "error was: {}", err);
    }
}
