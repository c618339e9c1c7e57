//! Configuration module for the signal engine.

pub mod analysis;
pub mod cache;

// Can be private because of the re-export below. Forces files to use crate::config::PRINT_* directly
mod debug;
pub use debug::{
    PRINT_CACHE_EVENTS, PRINT_EXTREMA_SUPPRESSION, PRINT_PIPELINE_TIMINGS, PRINT_TREND_VOTES,
};

// Re-export commonly used items
pub use analysis::{
    ANALYSIS, AnalysisConfig, CrossoverSettings, ExtremaSettings, MacdSettings,
    MomentumSettings, MovingAverageSettings, MovingAverageSpec, TrendSettings,
};
pub use cache::{SNAPSHOT_MAX_ENTRIES, SNAPSHOT_TTL_SECS};
