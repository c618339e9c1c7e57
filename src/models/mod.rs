// Domain models for the signal engine
// These modules contain pure data independent of rendering

pub mod signals;
pub mod timeseries;

// Re-export key types for convenience
pub use signals::{
    Direction, Extrema, ExtremumKind, ExtremumPoint, Segment, SegmentId, SignalReport,
};
pub(crate) use signals::SegmentIds;
pub use timeseries::{IndicatorSeries, PriceSeries};
