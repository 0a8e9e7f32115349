//! HTTP utilities shared by the inference clients

use reqwest::{Client as HttpClient, Response};
use std::time::Duration;

/// Creates an HTTP client bounded by `timeout` per request.
///
/// This prevents infinite hangs when the service is slow or unresponsive.
#[must_use]
pub fn create_http_client(timeout: Duration) -> HttpClient {
    HttpClient::builder()
        .timeout(timeout)
        .build()
        .unwrap_or_else(|_| HttpClient::new())
}

/// Reads the status and body text of a failed response.
///
/// The body is kept verbatim; an unreadable body becomes an empty string.
pub async fn read_error(response: Response) -> (u16, String) {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    (status, body)
}

/// Describes a transport-level failure without leaking the request URL query.
pub fn describe_transport_error(err: reqwest::Error) -> String {
    if err.is_timeout() {
        "request timed out".to_string()
    } else if err.is_connect() {
        "connection failed".to_string()
    } else {
        err.without_url().to_string()
    }
}
