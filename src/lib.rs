#![allow(clippy::collapsible_if)]
#![allow(clippy::collapsible_else_if)]

// Core modules
pub mod analysis;
pub mod config;
pub mod data;
pub mod domain;
pub mod engine;
pub mod error;
pub mod models;
pub mod utils;

use std::path::PathBuf;

use anyhow::Context;

// Re-export commonly used types
pub use config::{ANALYSIS, AnalysisConfig};
pub use data::load_price_csv;
pub use domain::Bar;
pub use engine::{AnalysisReport, AnalysisRequest, SnapshotCache, Study, analyze};
pub use error::SignalError;
pub use models::{Extrema, ExtremumPoint, IndicatorSeries, PriceSeries, SignalReport};

// CLI argument parsing
use clap::Parser;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Price history CSV (Date,Open,High,Low,Close[,Adj Close],Volume)
    pub input: PathBuf,

    /// Symbol to report under; defaults to the file name without extension
    #[arg(long)]
    pub symbol: Option<String>,

    /// Period label carried into the report (e.g. 1y, 5y, max)
    #[arg(long, default_value = "max")]
    pub period: String,

    /// Bar timeframe label carried into the report (e.g. 1d, 1wk)
    #[arg(long, default_value = "1d")]
    pub timeframe: String,

    /// JSON file overriding the analysis configuration
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Comma-separated studies to run; all of them when omitted
    #[arg(long, value_delimiter = ',')]
    pub studies: Vec<Study>,

    /// Keep the first detected maximum and minimum instead of discarding them
    #[arg(long, default_value_t = false)]
    pub keep_warmup: bool,

    /// Pretty-print the JSON report
    #[arg(long, default_value_t = false)]
    pub pretty: bool,
}

impl Cli {
    fn symbol(&self) -> String {
        self.symbol.clone().unwrap_or_else(|| {
            self.input
                .file_stem()
                .map(|stem| stem.to_string_lossy().to_uppercase())
                .unwrap_or_else(|| "UNKNOWN".to_string())
        })
    }

    /// Build the analysis request described by the command line.
    pub fn request(&self) -> anyhow::Result<AnalysisRequest> {
        let mut config = match &self.config {
            Some(path) => AnalysisConfig::load_from_path(path)?,
            None => AnalysisConfig::default(),
        };
        if self.keep_warmup {
            config.extrema.discard_warmup = false;
        }

        let mut request =
            AnalysisRequest::new(self.symbol(), &self.period, &self.timeframe).with_config(config);
        if !self.studies.is_empty() {
            request = request.with_studies(self.studies.iter().copied());
        }
        Ok(request)
    }
}

/// Load the input file and run the requested analysis.
/// This is the public API for the binary to call
pub fn run(cli: &Cli) -> anyhow::Result<AnalysisReport> {
    let request = cli.request()?;
    let prices = load_price_csv(&cli.input, &request.symbol)?;
    analyze(&prices, &request).context(format!(
        "Analysis of {} ({} bars) failed",
        request.symbol,
        prices.len()
    ))
}
