pub mod cache;
pub mod pipeline;
pub mod request;

// Re-export key components
pub use cache::SnapshotCache;
pub use pipeline::analyze;
pub use request::{AnalysisReport, AnalysisRequest, Study};
