// Data loading
pub mod csv_loader;

// Re-export commonly used functions
pub use csv_loader::{load_price_csv, read_price_csv};
