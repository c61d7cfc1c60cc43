//! OAuth2 client-credentials token handling.

use serde::Deserialize;
use tracing::error;

use crate::error::AppError;

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
}

/// Form fields for a client-credentials grant.
pub fn token_form<'a>(client_id: &'a str, client_secret: &'a str, scope: &'a str) -> [(&'static str, &'a str); 4] {
    [
        ("grant_type", "client_credentials"),
        ("client_id", client_id),
        ("client_secret", client_secret),
        ("scope", scope),
    ]
}

/// Pull `access_token` out of a token endpoint response body.
///
/// Anything else (error JSON, HTML, empty body) means we cannot talk to the
/// stats API at all, so it is an authorization error for the whole run.
pub fn parse_token_response(body: &str) -> Result<String, AppError> {
    let token = serde_json::from_str::<TokenResponse>(body)
        .ok()
        .and_then(|r| r.access_token)
        .filter(|t| !t.is_empty());

    match token {
        Some(token) => Ok(token),
        None => {
            error!("{body}");
            Err(AppError::auth(
                "Wrong response from server, there was no 'access_token'",
            ))
        }
    }
}
