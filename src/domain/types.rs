//! Shared domain types.
//!
//! These types are intentionally small: the pipeline only ever moves a handful
//! of timestamps, a bearer token and a list of flat JSON records around.

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde_json::{Map, Value};

/// Wire format for window bounds, e.g. `2024-01-01T00:00:00.000Z`.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";

/// One flat stats record. Key order is the order the API sent the fields in.
pub type Record = Map<String, Value>;

/// A stats surface of the publisher API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    /// Aggregated publisher statistics.
    Stats,
    /// Private-deal statistics.
    PrivateDeals,
}

impl Endpoint {
    pub const ALL: [Endpoint; 2] = [Endpoint::Stats, Endpoint::PrivateDeals];

    /// Name used in the config file and for the output file stem.
    pub fn name(self) -> &'static str {
        match self {
            Endpoint::Stats => "stats",
            Endpoint::PrivateDeals => "private-deals",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|e| e.name() == name)
    }

    /// URL path relative to the API base.
    pub fn path(self) -> &'static str {
        match self {
            Endpoint::Stats => "/api/v1/publisher/stats",
            Endpoint::PrivateDeals => "/api/v1/publisher/stats/private-deals",
        }
    }

    /// OAuth scope a token must carry to read this endpoint.
    pub fn scope(self) -> &'static str {
        match self {
            Endpoint::Stats => "aym-api",
            Endpoint::PrivateDeals => "aym-api-deals",
        }
    }

    pub fn default_dimensions(self) -> Vec<String> {
        let dims: &[&str] = match self {
            Endpoint::Stats => &["day", "website", "placement"],
            Endpoint::PrivateDeals => &[
                "day",
                "website",
                "deal_name",
                "deal_id",
                "placement",
                "advertiser",
                "buyer",
            ],
        };
        dims.iter().map(|d| d.to_string()).collect()
    }

    /// Only the aggregate stats endpoint understands `displayCustomName`.
    pub fn supports_custom_name(self) -> bool {
        matches!(self, Endpoint::Stats)
    }

    pub fn file_name(self) -> String {
        format!("{}.csv", self.name())
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// How the extraction date range is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateRange {
    /// Calendar dates, both inclusive.
    Fixed { from: NaiveDate, to: NaiveDate },
    /// A single rolling window of `days` ending now (or at today's midnight).
    Interval { days: u32, include_today: bool },
    /// `days` one-day windows, most recent first.
    Backfill { days: u32, include_today: bool },
}

impl DateRange {
    /// Mode name as written in the config file.
    pub fn mode_name(&self) -> &'static str {
        match self {
            DateRange::Fixed { .. } => "fixed",
            DateRange::Interval { .. } => "interval",
            DateRange::Backfill { .. } => "backfill",
        }
    }
}

/// Half-open `[from, to)` request window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
}

impl DateWindow {
    pub fn new(from: DateTime<Utc>, to: DateTime<Utc>) -> Self {
        Self { from, to }
    }

    pub fn from_wire(&self) -> String {
        self.from.format(TIMESTAMP_FORMAT).to_string()
    }

    pub fn to_wire(&self) -> String {
        self.to.format(TIMESTAMP_FORMAT).to_string()
    }
}

impl fmt::Display for DateWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} .. {}", self.from_wire(), self.to_wire())
    }
}

/// OAuth client credentials.
#[derive(Clone)]
pub struct Credentials {
    pub client_id: String,
    pub client_secret: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .finish()
    }
}
