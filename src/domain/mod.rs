// Domain types and value objects
pub mod bar;

pub use bar::Bar;
