//! Stats request bodies and response classification.
//!
//! The API answers every stats call with `{ "status": ..., "payload": ... }`.
//! `payload` holds the rows on success and an error object otherwise.

use serde::Serialize;
use serde_json::Value;
use tracing::{error, warn};

use crate::domain::{DateWindow, Endpoint, Record};
use crate::error::AppError;

/// Error message the API returns when it loses track of a token it just issued.
const TOKEN_NOT_FOUND: &str = "oauthAccessTokenWasNotFound";
const ACCESS_DENIED: &str = "access_denied";

/// JSON body of a stats request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatsRequest {
    pub from: String,
    pub to: String,
    pub dimensions: Vec<String>,
    #[serde(rename = "displayCustomName", skip_serializing_if = "Option::is_none")]
    pub display_custom_name: Option<bool>,
}

impl StatsRequest {
    pub fn new(endpoint: Endpoint, window: &DateWindow, dimensions: Vec<String>, display_custom_name: bool) -> Self {
        Self {
            from: window.from_wire(),
            to: window.to_wire(),
            dimensions,
            display_custom_name: endpoint.supports_custom_name().then_some(display_custom_name),
        }
    }
}

/// Classified stats response.
#[derive(Debug, Clone, PartialEq)]
pub enum StatsOutcome {
    /// `status == "ok"` with at least one record.
    Rows(Vec<Record>),
    /// `status == "ok"` with nothing in the payload.
    Empty,
    /// A known, transient server-side failure worth retrying.
    Transient(String),
}

/// Classify a raw stats response body.
///
/// Invalid JSON, a missing `status`, an unusable payload and any non-`ok`
/// status that is not a known transient failure are errors.
pub fn parse_stats_response(body: &str) -> Result<StatsOutcome, AppError> {
    let value: Value = serde_json::from_str(body).map_err(|e| {
        error!("{body}");
        AppError::remote(format!("Response from server was invalid JSON ({e})"))
    })?;

    let Some(status) = value.get("status") else {
        error!("{body}");
        return Err(AppError::remote(format!(
            "Unexpected response, keys: [{}]",
            object_keys(&value)
        )));
    };

    let payload = value.get("payload");

    if status.as_str() != Some("ok") {
        if let Some(reason) = transient_reason(payload) {
            warn!("Unexpected response status {status}: {reason}");
            return Ok(StatsOutcome::Transient(reason));
        }
        error!("{body}");
        let detail = payload
            .and_then(|p| p.get("message"))
            .and_then(Value::as_str)
            .map(|m| format!(" ({m})"))
            .unwrap_or_default();
        return Err(AppError::remote(format!(
            "Unexpected response status: {status}{detail}"
        )));
    }

    match payload {
        None | Some(Value::Null) => Ok(StatsOutcome::Empty),
        Some(Value::Array(items)) if items.is_empty() => Ok(StatsOutcome::Empty),
        Some(Value::Array(items)) => {
            let mut rows = Vec::with_capacity(items.len());
            for (idx, item) in items.iter().enumerate() {
                match item {
                    Value::Object(map) => rows.push(map.clone()),
                    other => {
                        error!("{body}");
                        return Err(AppError::remote(format!(
                            "Payload item {idx} is not an object: {other}"
                        )));
                    }
                }
            }
            Ok(StatsOutcome::Rows(rows))
        }
        Some(other) => {
            error!("{body}");
            Err(AppError::remote(format!(
                "Payload is not a list of records (got {})",
                json_kind(other)
            )))
        }
    }
}

/// Recognize the API's token bug: an `oauthAccessTokenWasNotFound` message
/// (usually prefixed with `messages:`) or an `access_denied` error type.
fn transient_reason(payload: Option<&Value>) -> Option<String> {
    let payload = payload?;
    let message = payload.get("message").and_then(Value::as_str);
    let error_type = payload.get("errorType").and_then(Value::as_str);

    if let Some(m) = message {
        if m == TOKEN_NOT_FOUND || m.strip_prefix("messages:") == Some(TOKEN_NOT_FOUND) {
            return Some(m.to_string());
        }
    }
    if error_type == Some(ACCESS_DENIED) {
        return Some(message.unwrap_or(ACCESS_DENIED).to_string());
    }
    None
}

fn object_keys(value: &Value) -> String {
    match value {
        Value::Object(map) => map.keys().cloned().collect::<Vec<_>>().join(", "),
        _ => String::new(),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
