//! `r2b2-extractor` library crate.
//!
//! The binary is a thin wrapper around this library so that the pipeline
//! (date planning, token exchange, response handling, CSV output) is testable
//! without spawning processes or touching the network.

pub mod app;
pub mod cli;
pub mod config;
pub mod data;
pub mod domain;
pub mod error;
pub mod io;
pub mod logging;
pub mod pipeline;
