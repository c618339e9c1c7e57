// Signal-extraction algorithms: indicators, extrema, crossover and trend
pub mod crossover;
pub mod extrema;
pub mod indicators;
pub mod trend;

// Re-export commonly used functions and types
pub use crossover::find_crossings;
pub use extrema::{find_extrema, find_peaks_by_distance, nearest_extremum, nearest_prior_extremum};
pub use indicators::{
    DifferenceOrder, DifferenceScheme, MomentumBucket, MovingAverageKind, Stencil, bucket_momentum,
    exponential_ma, finite_difference, macd, momentum, momentum_derivative, moving_average,
    simple_ma,
};
pub use trend::classify_trend;
