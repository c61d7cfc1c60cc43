//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments and installs logging
//! - loads the config file
//! - plans the date windows
//! - runs the extraction pipeline against the live API

use chrono::Utc;
use clap::Parser;
use tracing::{error, info};

use crate::cli::Cli;
use crate::config::load_config;
use crate::data::R2b2Client;
use crate::error::AppError;
use crate::io::CsvSink;
use crate::pipeline::{Extractor, plan_windows};

/// Entry point for the `r2b2-extractor` binary.
pub fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    if let Err(err) = crate::logging::init_logging(cli.loglevel) {
        eprintln!("{err}");
        return Err(err);
    }

    let result = extract(&cli);
    if let Err(err) = &result {
        error!("{err}");
    }
    result
}

fn extract(cli: &Cli) -> Result<(), AppError> {
    let config = load_config(&cli.config)?;

    let windows = plan_windows(&config.date_range, Utc::now())?;
    if windows.is_empty() {
        info!("Date range '{}' produced no windows, nothing to do", config.date_range.mode_name());
        return Ok(());
    }

    let client = R2b2Client::new(&config)?;
    let extractor = Extractor::new(client, config, CsvSink::new(&cli.outpath));
    let summary = extractor.run(&windows)?;

    info!(
        "Done: {} window(s), {} extraction(s), {} without data, {} row(s) written to '{}'",
        summary.windows,
        summary.extractions,
        summary.empty,
        summary.rows,
        extractor.sink().dir().display()
    );
    Ok(())
}
