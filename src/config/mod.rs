//! Extractor configuration.
//!
//! The config file is JSON. Current exports nest everything under a
//! `parameters` key; older ones put the same keys at the top level, so both
//! layouts are accepted.
//!
//! Parsing happens in two steps:
//! - deserialize into `RawParameters` (everything optional, names as on disk)
//! - resolve into `ExtractorConfig` (validated, typed, immutable)

use std::collections::HashMap;
use std::fs::File;
use std::path::Path;
use std::time::Duration;

use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

use crate::domain::{Credentials, DateRange, Endpoint};
use crate::error::AppError;

pub const DEFAULT_API_BASE_URL: &str = "https://aym.r2b2.cz";

/// Upper bound for `date_interval` (about ten years of days).
pub const MAX_DATE_INTERVAL: u32 = 3660;

const ENV_CLIENT_ID: &str = "R2B2_CLIENT_ID";
const ENV_CLIENT_SECRET: &str = "R2B2_CLIENT_SECRET";

/// How transient API failures are retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts per extraction, including the first one. Always >= 1.
    pub max_attempts: u32,
    /// Fixed pause before each retry.
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            delay: Duration::from_secs(10),
        }
    }
}

/// Fully resolved configuration for one run.
#[derive(Debug, Clone)]
pub struct ExtractorConfig {
    pub date_range: DateRange,
    /// Enabled endpoints, in config order, without duplicates.
    pub endpoints: Vec<Endpoint>,
    pub credentials: Credentials,
    pub dimensions: HashMap<Endpoint, Vec<String>>,
    pub display_custom_name: bool,
    pub retry: RetryPolicy,
    pub api_base_url: String,
    pub http_timeout: Option<Duration>,
}

impl ExtractorConfig {
    pub fn dimensions_for(&self, endpoint: Endpoint) -> Vec<String> {
        self.dimensions
            .get(&endpoint)
            .cloned()
            .unwrap_or_else(|| endpoint.default_dimensions())
    }
}

#[derive(Debug, Default, Deserialize)]
struct RawParameters {
    date_type: Option<String>,
    from: Option<String>,
    to: Option<String>,
    date_interval: Option<i64>,
    #[serde(default)]
    include_today: bool,
    #[serde(default)]
    endpoints: Vec<String>,
    credentials: Option<RawCredentials>,
    #[serde(default)]
    display_custom_name: bool,
    #[serde(default)]
    dimensions: HashMap<String, Vec<String>>,
    retry: Option<RawRetry>,
    api_base_url: Option<String>,
    http_timeout_seconds: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct RawCredentials {
    client_id: Option<String>,
    #[serde(rename = "#client_secret")]
    client_secret: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RawRetry {
    max_attempts: Option<u32>,
    delay_seconds: Option<u64>,
}

/// Load and resolve the config file at `path`.
///
/// Credentials may also come from `R2B2_CLIENT_ID` / `R2B2_CLIENT_SECRET`
/// (a `.env` file is honoured); the environment wins over the file.
pub fn load_config(path: &Path) -> Result<ExtractorConfig, AppError> {
    if !path.exists() {
        return Err(AppError::config(format!(
            "Configuration not specified, was expected at '{}'",
            path.display()
        )));
    }

    let file = File::open(path)
        .map_err(|e| AppError::config(format!("Failed to open config '{}': {e}", path.display())))?;
    let root: Value = serde_json::from_reader(file)
        .map_err(|e| AppError::config(format!("Invalid config JSON '{}': {e}", path.display())))?;

    dotenvy::dotenv().ok();
    let env_credentials = (
        std::env::var(ENV_CLIENT_ID).ok(),
        std::env::var(ENV_CLIENT_SECRET).ok(),
    );

    parse_config(root, env_credentials)
}

/// Resolve an already-parsed config document.
///
/// `env_credentials` is `(client_id, client_secret)` taken from the environment.
pub fn parse_config(
    root: Value,
    env_credentials: (Option<String>, Option<String>),
) -> Result<ExtractorConfig, AppError> {
    let params = match root {
        Value::Object(mut map) => match map.remove("parameters") {
            Some(params) => params,
            None => Value::Object(map),
        },
        _ => return Err(AppError::config("Config root must be a JSON object.")),
    };

    let raw: RawParameters = serde_json::from_value(params)
        .map_err(|e| AppError::config(format!("Invalid config parameters: {e}")))?;

    let date_range = resolve_date_range(&raw)?;
    let endpoints = resolve_endpoints(&raw.endpoints)?;
    let credentials = resolve_credentials(raw.credentials.unwrap_or_default(), env_credentials)?;

    let mut dimensions = HashMap::new();
    for (name, dims) in raw.dimensions {
        let Some(endpoint) = Endpoint::from_name(&name) else {
            warn!("Ignoring dimensions for unknown endpoint '{name}'");
            continue;
        };
        if dims.is_empty() {
            return Err(AppError::config(format!(
                "Dimension list for '{name}' must not be empty."
            )));
        }
        dimensions.insert(endpoint, dims);
    }

    let retry = match raw.retry {
        None => RetryPolicy::default(),
        Some(r) => {
            let defaults = RetryPolicy::default();
            let max_attempts = r.max_attempts.unwrap_or(defaults.max_attempts);
            if max_attempts == 0 {
                return Err(AppError::config("`retry.max_attempts` must be >= 1."));
            }
            RetryPolicy {
                max_attempts,
                delay: r.delay_seconds.map(Duration::from_secs).unwrap_or(defaults.delay),
            }
        }
    };

    let api_base_url = raw
        .api_base_url
        .map(|u| u.trim_end_matches('/').to_string())
        .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string());

    Ok(ExtractorConfig {
        date_range,
        endpoints,
        credentials,
        dimensions,
        display_custom_name: raw.display_custom_name,
        retry,
        api_base_url,
        http_timeout: raw.http_timeout_seconds.map(Duration::from_secs),
    })
}

fn resolve_date_range(raw: &RawParameters) -> Result<DateRange, AppError> {
    let date_type = raw
        .date_type
        .as_deref()
        .ok_or_else(|| AppError::config("Missing required parameter `date_type`."))?;

    match date_type {
        "fixed" => {
            let from = parse_day(raw.from.as_deref(), "from")?;
            let to = parse_day(raw.to.as_deref(), "to")?;
            if to < from {
                return Err(AppError::config(format!(
                    "`to` ({to}) must not be before `from` ({from})."
                )));
            }
            Ok(DateRange::Fixed { from, to })
        }
        "interval" => Ok(DateRange::Interval {
            days: interval_days(raw.date_interval)?,
            include_today: raw.include_today,
        }),
        // Anything else has always meant a day-by-day backfill.
        _ => Ok(DateRange::Backfill {
            days: interval_days(raw.date_interval)?,
            include_today: raw.include_today,
        }),
    }
}

fn parse_day(value: Option<&str>, key: &str) -> Result<NaiveDate, AppError> {
    let value = value.ok_or_else(|| {
        AppError::config(format!("Missing required parameter `{key}` for fixed dates."))
    })?;
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|e| {
        AppError::config(format!("Invalid `{key}` date '{value}' (expected YYYY-MM-DD): {e}"))
    })
}

fn interval_days(value: Option<i64>) -> Result<u32, AppError> {
    let days = value.ok_or_else(|| AppError::config("Missing required parameter `date_interval`."))?;
    match u32::try_from(days) {
        Ok(d) if d <= MAX_DATE_INTERVAL => Ok(d),
        _ => Err(AppError::config(format!(
            "`date_interval` must be between 0 and {MAX_DATE_INTERVAL} days, got {days}."
        ))),
    }
}

fn resolve_endpoints(names: &[String]) -> Result<Vec<Endpoint>, AppError> {
    let mut out = Vec::new();
    for name in names {
        match Endpoint::from_name(name) {
            Some(e) if !out.contains(&e) => out.push(e),
            Some(_) => {}
            None => warn!("Ignoring unknown endpoint '{name}'"),
        }
    }
    if out.is_empty() {
        return Err(AppError::config(format!(
            "No known endpoints enabled; expected any of: {}.",
            Endpoint::ALL.map(Endpoint::name).join(", ")
        )));
    }
    Ok(out)
}

fn resolve_credentials(
    raw: RawCredentials,
    env: (Option<String>, Option<String>),
) -> Result<Credentials, AppError> {
    let client_id = non_empty(env.0)
        .or(non_empty(raw.client_id))
        .ok_or_else(|| AppError::config("Missing `credentials.client_id`."))?;
    let client_secret = non_empty(env.1)
        .or(non_empty(raw.client_secret))
        .ok_or_else(|| AppError::config("Missing `credentials.#client_secret`."))?;
    Ok(Credentials {
        client_id,
        client_secret,
    })
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn no_env() -> (Option<String>, Option<String>) {
        (None, None)
    }

    fn base_params() -> Value {
        json!({
            "date_type": "fixed",
            "from": "2024-01-01",
            "to": "2024-01-03",
            "endpoints": ["stats", "private-deals"],
            "credentials": { "client_id": "abc", "#client_secret": "s3cret" },
            "display_custom_name": true
        })
    }

    #[test]
    fn reads_parameters_wrapper() {
        let cfg = parse_config(json!({ "parameters": base_params() }), no_env()).unwrap();
        assert_eq!(
            cfg.date_range,
            DateRange::Fixed {
                from: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                to: NaiveDate::from_ymd_opt(2024, 1, 3).unwrap(),
            }
        );
        assert_eq!(cfg.endpoints, vec![Endpoint::Stats, Endpoint::PrivateDeals]);
        assert_eq!(cfg.credentials.client_secret, "s3cret");
        assert!(cfg.display_custom_name);
        assert_eq!(cfg.retry, RetryPolicy::default());
        assert_eq!(cfg.api_base_url, DEFAULT_API_BASE_URL);
        assert_eq!(cfg.dimensions_for(Endpoint::Stats), vec!["day", "website", "placement"]);
    }

    #[test]
    fn reads_flat_layout() {
        let cfg = parse_config(base_params(), no_env()).unwrap();
        assert_eq!(cfg.endpoints.len(), 2);
    }

    #[test]
    fn unknown_date_type_means_backfill() {
        let mut params = base_params();
        params["date_type"] = json!("daily");
        params["date_interval"] = json!(7);
        let cfg = parse_config(params, no_env()).unwrap();
        assert_eq!(
            cfg.date_range,
            DateRange::Backfill {
                days: 7,
                include_today: false
            }
        );
    }

    #[test]
    fn interval_requires_day_count() {
        let mut params = base_params();
        params["date_type"] = json!("interval");
        let err = parse_config(params, no_env()).unwrap_err();
        assert_eq!(err.exit_code(), crate::error::EXIT_CONFIG);
        assert!(err.message().contains("date_interval"));
    }

    #[test]
    fn fixed_rejects_reversed_dates() {
        let mut params = base_params();
        params["to"] = json!("2023-12-31");
        assert!(parse_config(params, no_env()).is_err());
    }

    #[test]
    fn endpoints_skip_unknown_and_duplicates() {
        let mut params = base_params();
        params["endpoints"] = json!(["private-deals", "bogus", "private-deals", "stats"]);
        let cfg = parse_config(params, no_env()).unwrap();
        assert_eq!(cfg.endpoints, vec![Endpoint::PrivateDeals, Endpoint::Stats]);

        let mut params = base_params();
        params["endpoints"] = json!(["bogus"]);
        assert!(parse_config(params, no_env()).is_err());
    }

    #[test]
    fn environment_overrides_credentials() {
        let env = (Some("env-id".to_string()), Some("env-secret".to_string()));
        let cfg = parse_config(base_params(), env).unwrap();
        assert_eq!(cfg.credentials.client_id, "env-id");
        assert_eq!(cfg.credentials.client_secret, "env-secret");
    }

    #[test]
    fn empty_environment_values_fall_back_to_file() {
        let env = (Some(String::new()), Some(String::new()));
        let cfg = parse_config(base_params(), env).unwrap();
        assert_eq!(cfg.credentials.client_id, "abc");
        assert_eq!(cfg.credentials.client_secret, "s3cret");
    }

    #[test]
    fn oversized_interval_is_config_error() {
        for date_type in ["interval", "backfill"] {
            let mut params = base_params();
            params["date_type"] = json!(date_type);
            params["date_interval"] = json!(100_000_000);
            let err = parse_config(params, no_env()).unwrap_err();
            assert_eq!(err.exit_code(), crate::error::EXIT_CONFIG);
            assert!(err.message().contains("date_interval"));
        }

        let mut params = base_params();
        params["date_type"] = json!("interval");
        params["date_interval"] = json!(MAX_DATE_INTERVAL);
        assert!(parse_config(params, no_env()).is_ok());
    }

    #[test]
    fn missing_secret_is_config_error() {
        let mut params = base_params();
        params["credentials"] = json!({ "client_id": "abc" });
        let err = parse_config(params, no_env()).unwrap_err();
        assert!(err.message().contains("#client_secret"));
    }

    #[test]
    fn optional_overrides_apply() {
        let mut params = base_params();
        params["dimensions"] = json!({ "stats": ["day"] });
        params["retry"] = json!({ "max_attempts": 2, "delay_seconds": 0 });
        params["api_base_url"] = json!("http://localhost:8080/");
        params["http_timeout_seconds"] = json!(30);
        let cfg = parse_config(params, no_env()).unwrap();
        assert_eq!(cfg.dimensions_for(Endpoint::Stats), vec!["day"]);
        assert_eq!(cfg.dimensions_for(Endpoint::PrivateDeals).len(), 7);
        assert_eq!(cfg.retry.max_attempts, 2);
        assert_eq!(cfg.retry.delay, Duration::ZERO);
        assert_eq!(cfg.api_base_url, "http://localhost:8080");
        assert_eq!(cfg.http_timeout, Some(Duration::from_secs(30)));
    }

    #[test]
    fn zero_attempts_rejected() {
        let mut params = base_params();
        params["retry"] = json!({ "max_attempts": 0 });
        assert!(parse_config(params, no_env()).is_err());
    }

    #[test]
    fn missing_file_is_config_error() {
        let err = load_config(Path::new("/definitely/not/here/config.json")).unwrap_err();
        assert_eq!(err.exit_code(), crate::error::EXIT_CONFIG);
        assert!(err.message().contains("Configuration not specified"));
    }
}
