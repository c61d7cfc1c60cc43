//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - the API surfaces we extract from (`Endpoint`)
//! - the date-range modes and the windows derived from them (`DateRange`, `DateWindow`)
//! - flat stats records as returned by the API (`Record`)

pub mod types;

pub use types::*;
