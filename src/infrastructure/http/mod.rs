//! HTTP adapters for the upstream backend and the payment gateway.

pub mod orders;
pub mod paystack;
pub mod rates;

use crate::error::{Result, ShippingError};
use reqwest::{Client, Response, StatusCode};
use std::time::Duration;

/// Builds the shared client. Every outbound call is bounded by `timeout`.
pub fn build_client(timeout: Duration) -> Result<Client> {
    Client::builder()
        .timeout(timeout)
        .connect_timeout(timeout)
        .build()
        .map_err(|e| ShippingError::InternalError(Box::new(e)))
}

pub(crate) fn transport_error(service: &str, err: reqwest::Error) -> ShippingError {
    if err.is_timeout() {
        ShippingError::UpstreamUnavailable(format!("{service} timed out"))
    } else {
        ShippingError::UpstreamUnavailable(format!("{service} unreachable: {err}"))
    }
}

/// Pulls a human-readable reason out of an error response body. The backend
/// uses `{detail}`, the gateway uses `{message}`.
pub(crate) async fn error_detail(response: Response, fallback: &str) -> (StatusCode, String) {
    let status = response.status();
    let detail = response
        .json::<serde_json::Value>()
        .await
        .ok()
        .and_then(|body| {
            body.get("detail")
                .or_else(|| body.get("message"))
                .and_then(|v| v.as_str())
                .map(str::to_string)
        })
        .unwrap_or_else(|| fallback.to_string());
    (status, detail)
}

pub(crate) fn trim_base(url: &str) -> String {
    url.trim_end_matches('/').to_string()
}
