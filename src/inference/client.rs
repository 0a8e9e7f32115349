use super::http_utils::{create_http_client, describe_transport_error, read_error};
use super::{GenerationError, ImageGenerator, TokenManager};
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{Client as HttpClient, StatusCode};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument, warn};

/// Client for the image generation endpoint.
///
/// Every request carries the token currently held by the [`TokenManager`].
pub struct GenerationClient {
    http_client: HttpClient,
    api_url: String,
    tokens: Arc<TokenManager>,
}

impl GenerationClient {
    /// Create a client for `api_url` whose calls are bounded by `timeout`
    #[must_use]
    pub fn new(api_url: impl Into<String>, tokens: Arc<TokenManager>, timeout: Duration) -> Self {
        Self {
            http_client: create_http_client(timeout),
            api_url: api_url.into(),
            tokens,
        }
    }
}

#[async_trait]
impl ImageGenerator for GenerationClient {
    #[instrument(skip(self), fields(prompt_len = prompt.chars().count()))]
    async fn generate(&self, prompt: &str) -> Result<Bytes, GenerationError> {
        let token = self.tokens.current_token();

        let response = self
            .http_client
            .post(&self.api_url)
            .bearer_auth(token)
            .json(&json!({ "inputs": prompt }))
            .send()
            .await
            .map_err(|e| GenerationError::Network(describe_transport_error(e)))?;

        if response.status() != StatusCode::OK {
            let (status, body) = read_error(response).await;
            warn!(status, body = %body, "Generation endpoint returned an error");
            return Err(GenerationError::Http { status, body });
        }

        let image = response
            .bytes()
            .await
            .map_err(|e| GenerationError::Network(describe_transport_error(e)))?;
        debug!(bytes = image.len(), "Generation succeeded");
        Ok(image)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inference::MockTokenRotator;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer, token: &str) -> GenerationClient {
        let tokens = Arc::new(TokenManager::new(token, Arc::new(MockTokenRotator::new())));
        GenerationClient::new(
            format!("{}/models/sdxl", server.uri()),
            tokens,
            Duration::from_secs(5),
        )
    }

    #[tokio::test]
    async fn test_generate_sends_prompt_and_bearer() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/models/sdxl"))
            .and(header("Authorization", "Bearer hf_current"))
            .and(body_json(serde_json::json!({"inputs": "cat"})))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![1_u8, 2, 3]))
            .expect(1)
            .mount(&server)
            .await;

        let bytes = client_for(&server, "hf_current").generate("cat").await;
        assert_eq!(bytes.ok().as_deref(), Some(&[1_u8, 2, 3][..]));
    }

    #[tokio::test]
    async fn test_generate_non_200_carries_status_and_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503).set_body_string("Service Unavailable"))
            .mount(&server)
            .await;

        match client_for(&server, "hf_current").generate("cat").await {
            Err(GenerationError::Http { status, body }) => {
                assert_eq!(status, 503);
                assert_eq!(body, "Service Unavailable");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_generate_other_success_codes_are_errors() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(202).set_body_string("queued"))
            .mount(&server)
            .await;

        let result = client_for(&server, "hf_current").generate("cat").await;
        assert!(matches!(
            result,
            Err(GenerationError::Http { status: 202, .. })
        ));
    }

    #[tokio::test]
    async fn test_generate_reads_token_on_every_call() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(header("Authorization", "Bearer rotated"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![9_u8]))
            .expect(1)
            .mount(&server)
            .await;

        let mut rotator = MockTokenRotator::new();
        rotator
            .expect_rotate()
            .returning(|| Ok("rotated".to_string()));
        let tokens = Arc::new(TokenManager::new("stale", Arc::new(rotator)));
        let client = GenerationClient::new(
            format!("{}/models/sdxl", server.uri()),
            tokens.clone(),
            Duration::from_secs(5),
        );

        assert!(tokens.refresh().await.is_ok());
        assert!(client.generate("dog").await.is_ok());
    }

    #[tokio::test]
    async fn test_generate_unreachable_is_network_error() {
        let tokens = Arc::new(TokenManager::new("t", Arc::new(MockTokenRotator::new())));
        // Port 9 (discard) is closed on test hosts
        let client = GenerationClient::new("http://127.0.0.1:9/", tokens, Duration::from_secs(2));

        let result = client.generate("cat").await;
        assert!(matches!(result, Err(GenerationError::Network(_))));
    }
}
