//! Process-wide log output.
//!
//! Installed once at start-up; per-extraction context (endpoint, window) is
//! attached through `tracing` spans rather than a shared logger object.

use crate::cli::LogLevel;
use crate::error::AppError;

/// Write `[timestamp] LEVEL message` lines to stdout at or above `level`.
pub fn init_logging(level: LogLevel) -> Result<(), AppError> {
    tracing_subscriber::fmt()
        .with_max_level(level.as_tracing())
        .with_writer(std::io::stdout)
        .with_target(false)
        .try_init()
        .map_err(|e| AppError::new(1, format!("Failed to initialize logging: {e}")))
}
