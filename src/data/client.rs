//! Blocking HTTP client for the R2B2 publisher API.

use reqwest::StatusCode;
use reqwest::blocking::Client;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use tracing::debug;

use crate::config::ExtractorConfig;
use crate::data::oauth::{parse_token_response, token_form};
use crate::data::stats::StatsRequest;
use crate::data::StatsApi;
use crate::domain::{Credentials, Endpoint};
use crate::error::AppError;

const TOKEN_PATH: &str = "/api/oauth2/access-token";

pub struct R2b2Client {
    client: Client,
    base_url: String,
    credentials: Credentials,
}

impl R2b2Client {
    pub fn new(config: &ExtractorConfig) -> Result<Self, AppError> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.http_timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| AppError::remote(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            base_url: config.api_base_url.clone(),
            credentials: config.credentials.clone(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }
}

impl StatsApi for R2b2Client {
    fn access_token(&self, scope: &str) -> Result<String, AppError> {
        let form = token_form(
            &self.credentials.client_id,
            &self.credentials.client_secret,
            scope,
        );
        let resp = self
            .client
            .post(self.url(TOKEN_PATH))
            .form(&form)
            .send()
            .map_err(|e| AppError::remote(format!("Token request failed: {e}")))?;

        let status = resp.status();
        let body = resp
            .text()
            .map_err(|e| AppError::remote(format!("Failed to read token response: {e}")))?;
        debug!(%status, scope, "token response received");

        parse_token_response(&body)
    }

    fn post_stats(&self, endpoint: Endpoint, request: &StatsRequest, token: &str) -> Result<String, AppError> {
        let resp = self
            .client
            .post(self.url(endpoint.path()))
            .header(CONTENT_TYPE, "application/json")
            .header(AUTHORIZATION, bearer(token))
            .json(request)
            .send()
            .map_err(|e| AppError::remote(format!("Stats request to {endpoint} failed: {e}")))?;

        let status = resp.status();
        let body = resp
            .text()
            .map_err(|e| AppError::remote(format!("Failed to read {endpoint} response: {e}")))?;
        debug!(%status, %endpoint, bytes = body.len(), "stats response received");

        check_stats_body(endpoint, status, &body)?;
        Ok(body)
    }
}

fn bearer(token: &str) -> String {
    format!("Bearer {token}")
}

/// Error statuses usually still carry the JSON envelope; only give up when
/// there is nothing to classify.
fn check_stats_body(endpoint: Endpoint, status: StatusCode, body: &str) -> Result<(), AppError> {
    if !status.is_success() && serde_json::from_str::<serde_json::Value>(body).is_err() {
        return Err(AppError::remote(format!(
            "Stats request to {endpoint} failed with status {status}."
        )));
    }
    Ok(())
}
