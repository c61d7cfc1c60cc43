//! Remote data access for the R2B2 publisher API.
//!
//! - OAuth client-credentials token exchange (`oauth`)
//! - stats request bodies + response classification (`stats`)
//! - the blocking HTTP client that talks to the real API (`client`)
//!
//! The pipeline only sees the `StatsApi` trait, so it can be driven by a
//! scripted API in tests.

pub mod client;
pub mod oauth;
pub mod stats;

pub use client::*;
pub use oauth::*;
pub use stats::*;

use crate::domain::Endpoint;
use crate::error::AppError;

/// The two calls an extraction needs.
pub trait StatsApi {
    /// Exchange the client credentials for a bearer token carrying `scope`.
    fn access_token(&self, scope: &str) -> Result<String, AppError>;

    /// POST a stats request and return the raw response body.
    ///
    /// Classifying the body is left to `parse_stats_response`.
    fn post_stats(&self, endpoint: Endpoint, request: &StatsRequest, token: &str) -> Result<String, AppError>;
}

impl<T: StatsApi + ?Sized> StatsApi for &T {
    fn access_token(&self, scope: &str) -> Result<String, AppError> {
        (**self).access_token(scope)
    }

    fn post_stats(&self, endpoint: Endpoint, request: &StatsRequest, token: &str) -> Result<String, AppError> {
        (**self).post_stats(endpoint, request, token)
    }
}
