//! Command-line parsing for the extractor.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(
    name = "r2b2-extractor",
    version,
    about = "Download R2B2 publisher stats into per-endpoint CSV files"
)]
pub struct Cli {
    /// Filename of the config JSON.
    #[arg(short = 'f', long, value_name = "JSON", default_value = "../config.json")]
    pub config: PathBuf,

    /// Output directory for the CSV files.
    #[arg(short = 'o', long, value_name = "DIR", default_value = "../output")]
    pub outpath: PathBuf,

    /// Minimum severity of log lines written to stdout.
    #[arg(short = 'l', long, value_enum, ignore_case = true, default_value_t = LogLevel::Info)]
    pub loglevel: LogLevel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    #[value(name = "INFO")]
    Info,
    #[value(name = "WARN")]
    Warn,
    #[value(name = "ERROR")]
    Error,
    #[value(name = "DEBUG")]
    Debug,
}

impl LogLevel {
    pub fn as_tracing(self) -> tracing::Level {
        match self {
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Error => tracing::Level::ERROR,
            LogLevel::Debug => tracing::Level::DEBUG,
        }
    }
}
