//! HTTP plumbing shared by the Neo4j and OpenAI clients.

use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;

use crate::error::{Error, Result};

/// One pooled client per backend, bounded by the configured timeout.
pub fn build_client(timeout: Duration) -> Result<Client> {
    Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| Error::configuration(format!("failed to build HTTP client: {e}")))
}

#[derive(Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Deserialize)]
struct ApiErrorDetail {
    message: String,
}

/// Turn a non-success OpenAI response into an upstream error carrying the
/// API's own message when the body has one.
pub fn api_error(endpoint: &str, status: StatusCode, body: &str) -> Error {
    let detail = serde_json::from_str::<ApiErrorBody>(body)
        .map(|b| b.error.message)
        .unwrap_or_else(|_| body.chars().take(200).collect());
    let hint = match status {
        StatusCode::UNAUTHORIZED => " (check OPENAI_API_KEY)",
        StatusCode::TOO_MANY_REQUESTS => " (rate limited)",
        _ => "",
    };
    Error::upstream(format!("{endpoint} returned {status}{hint}: {detail}"))
}
