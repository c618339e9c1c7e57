use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;

use crate::analysis::MomentumBucket;
use crate::config::AnalysisConfig;
use crate::models::{Extrema, IndicatorSeries, SignalReport};

/// One derived output the caller can ask for.
#[derive(
    Copy,
    Clone,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Debug,
    Serialize,
    Deserialize,
    strum_macros::Display,
    strum_macros::EnumString,
    strum_macros::EnumIter,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum Study {
    Sma200,
    Ema20,
    Ema50,
    Momentum,
    MomentumDerivative,
    MomentumBuckets,
    Macd,
    MacdExtrema,
    PriceExtrema,
    PeakMarkers,
    Crossover,
    Trend,
    Volume,
}

impl Study {
    pub fn all() -> BTreeSet<Study> {
        Study::iter().collect()
    }
}

/// Everything one analysis run needs besides the price history itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRequest {
    pub symbol: String,
    pub period: String,
    pub timeframe: String,
    pub config: AnalysisConfig,
    pub studies: BTreeSet<Study>,
}

impl AnalysisRequest {
    /// A request for every study with the default configuration.
    pub fn new(
        symbol: impl Into<String>,
        period: impl Into<String>,
        timeframe: impl Into<String>,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            period: period.into(),
            timeframe: timeframe.into(),
            config: AnalysisConfig::default(),
            studies: Study::all(),
        }
    }

    pub fn with_config(mut self, config: AnalysisConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_studies(mut self, studies: impl IntoIterator<Item = Study>) -> Self {
        self.studies = studies.into_iter().collect();
        self
    }

    pub fn wants(&self, study: Study) -> bool {
        self.studies.contains(&study)
    }

    /// Identifies the parameters of a request beyond symbol/period/timeframe.
    pub(crate) fn fingerprint(&self) -> String {
        format!("{:?}|{:?}", self.config, self.studies)
    }
}

/// Frozen result of one analysis run. Studies that were not requested stay `None`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub symbol: String,
    pub period: String,
    pub timeframe: String,
    pub bar_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_day: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_day: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub sma200: Option<IndicatorSeries>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ema20: Option<IndicatorSeries>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ema50: Option<IndicatorSeries>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub momentum: Option<IndicatorSeries>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub momentum_derivative: Option<IndicatorSeries>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub momentum_buckets: Option<Vec<MomentumBucket>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub macd: Option<IndicatorSeries>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub macd_extrema: Option<Extrema>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_extrema: Option<Extrema>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub peak_markers: Option<Extrema>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub crossover: Option<SignalReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trend: Option<SignalReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub volume: Option<IndicatorSeries>,
}
