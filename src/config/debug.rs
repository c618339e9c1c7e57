//! Debugging feature flags.
//!
//! Toggle individual diagnostics here; keep them `false` by default so release
//! builds remain quiet. Every flag is further gated by `cfg(debug_assertions)`
//! at the call site.

/// Emit one line per extremum candidate rejected by the tolerance band.
pub const PRINT_EXTREMA_SUPPRESSION: bool = false;

/// Emit the per-day classification and vote tallies of the trend classifier.
pub const PRINT_TREND_VOTES: bool = false;

/// Emit snapshot cache hit/miss/expiry diagnostics.
pub const PRINT_CACHE_EVENTS: bool = false;

/// Emit how long each requested study took inside the pipeline.
pub const PRINT_PIPELINE_TIMINGS: bool = false;
