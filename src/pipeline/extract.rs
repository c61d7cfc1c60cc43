//! One extraction = one window x one endpoint:
//! token -> stats request -> classify -> normalize -> append CSV.

use std::thread::sleep;

use tracing::{info, info_span, warn};

use crate::config::ExtractorConfig;
use crate::data::{StatsApi, StatsOutcome, StatsRequest, parse_stats_response};
use crate::domain::{DateWindow, Endpoint};
use crate::error::AppError;
use crate::io::{CsvSink, SinkReport};
use crate::pipeline::normalize::attach_window;

/// Result of a single successful extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractionOutcome {
    /// Rows were appended to the endpoint's CSV.
    Written(SinkReport),
    /// The API had no data for the window; nothing was written.
    Empty,
}

/// Totals for a whole run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub windows: usize,
    pub extractions: usize,
    pub empty: usize,
    pub rows: usize,
}

pub struct Extractor<A> {
    api: A,
    config: ExtractorConfig,
    sink: CsvSink,
}

impl<A: StatsApi> Extractor<A> {
    pub fn new(api: A, config: ExtractorConfig, sink: CsvSink) -> Self {
        Self { api, config, sink }
    }

    pub fn sink(&self) -> &CsvSink {
        &self.sink
    }

    /// Extract every window for every enabled endpoint, in order.
    ///
    /// Stops at the first error; nothing after it is attempted.
    pub fn run(&self, windows: &[DateWindow]) -> Result<RunSummary, AppError> {
        let mut summary = RunSummary {
            windows: windows.len(),
            ..RunSummary::default()
        };

        for window in windows {
            for &endpoint in &self.config.endpoints {
                summary.extractions += 1;
                match self.extract(window, endpoint)? {
                    ExtractionOutcome::Written(report) => summary.rows += report.rows,
                    ExtractionOutcome::Empty => summary.empty += 1,
                }
            }
        }

        Ok(summary)
    }

    /// Run a single extraction, retrying the known transient token failure.
    ///
    /// Each attempt fetches a fresh token. Past `retry.max_attempts` the
    /// transient failure becomes a remote error.
    pub fn extract(&self, window: &DateWindow, endpoint: Endpoint) -> Result<ExtractionOutcome, AppError> {
        let span = info_span!("extract", %endpoint, from = %window.from_wire(), to = %window.to_wire());
        let _guard = span.enter();

        info!(
            "Requested date in '{}' mode, downloading data from {} to {}",
            self.config.date_range.mode_name(),
            window.from_wire(),
            window.to_wire()
        );

        let request = StatsRequest::new(
            endpoint,
            window,
            self.config.dimensions_for(endpoint),
            self.config.display_custom_name,
        );
        let policy = self.config.retry;

        let mut attempt = 1;
        let mut records = loop {
            let token = self.api.access_token(endpoint.scope())?;
            let body = self.api.post_stats(endpoint, &request, &token)?;

            match parse_stats_response(&body)? {
                StatsOutcome::Rows(records) => break records,
                StatsOutcome::Empty => {
                    warn!("Endpoint {endpoint} returned no data");
                    return Ok(ExtractionOutcome::Empty);
                }
                StatsOutcome::Transient(reason) => {
                    if attempt >= policy.max_attempts {
                        return Err(AppError::remote(format!(
                            "Endpoint {endpoint} still failing after {attempt} attempts: {reason}"
                        )));
                    }
                    info!(
                        "This is a known R2B2 API bug, will retry in {}s (attempt {}/{})",
                        policy.delay.as_secs_f64(),
                        attempt + 1,
                        policy.max_attempts
                    );
                    if !policy.delay.is_zero() {
                        sleep(policy.delay);
                    }
                    attempt += 1;
                }
            }
        };

        attach_window(&mut records, window);

        info!(
            "Exporting {endpoint} to '{}'",
            self.sink.path_for(endpoint).display()
        );
        let report = self.sink.append(endpoint, &records)?;
        info!(
            rows = report.rows,
            created = report.created,
            path = %report.path.display(),
            "export done"
        );

        Ok(ExtractionOutcome::Written(report))
    }
}
