use super::http_utils::{create_http_client, describe_transport_error, read_error};
use super::{TokenRotationError, TokenRotator};
use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE, COOKIE};
use reqwest::{Client as HttpClient, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use tracing::instrument;

#[derive(Deserialize, Debug)]
struct RotationResponse {
    token: Option<String>,
}

/// Rotates the bearer token by presenting a session cookie to the rotation endpoint
pub struct HttpTokenRotator {
    http_client: HttpClient,
    url: String,
    session_cookie: String,
}

impl HttpTokenRotator {
    /// Create a rotator for `url`, authenticated by `session_cookie`
    #[must_use]
    pub fn new(
        url: impl Into<String>,
        session_cookie: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            http_client: create_http_client(timeout),
            url: url.into(),
            session_cookie: session_cookie.into(),
        }
    }
}

#[async_trait]
impl TokenRotator for HttpTokenRotator {
    #[instrument(skip(self), fields(url = %self.url))]
    async fn rotate(&self) -> Result<String, TokenRotationError> {
        let response = self
            .http_client
            .post(&self.url)
            .header(ACCEPT, "application/json")
            .header(CONTENT_TYPE, "application/json")
            .header(COOKIE, &self.session_cookie)
            .send()
            .await
            .map_err(|e| TokenRotationError::Network(describe_transport_error(e)))?;

        if response.status() != StatusCode::OK {
            let (status, body) = read_error(response).await;
            return Err(TokenRotationError::Status { status, body });
        }

        let parsed: RotationResponse = response
            .json()
            .await
            .map_err(|e| TokenRotationError::Malformed(e.without_url().to_string()))?;

        parsed
            .token
            .filter(|token| !token.is_empty())
            .ok_or(TokenRotationError::MissingToken)
    }
}
