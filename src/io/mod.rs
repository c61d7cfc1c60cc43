//! Output helpers.
//!
//! - per-endpoint CSV append with header capture (`csv_sink`)

pub mod csv_sink;

pub use csv_sink::*;
