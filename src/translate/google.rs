use super::{LanguageService, TranslationError};
use crate::inference::http_utils::{create_http_client, describe_transport_error, read_error};
use async_trait::async_trait;
use reqwest::Client as HttpClient;
use serde_json::Value;
use std::time::Duration;
use tracing::instrument;

/// Language service backed by the public Google Translate web endpoint.
///
/// One `translate_a/single` call answers both questions: element `[2]` holds
/// the detected source language and `[0][i][0]` the translated segments.
pub struct GoogleTranslate {
    http_client: HttpClient,
    base_url: String,
}

impl GoogleTranslate {
    /// Create a client for `base_url` (e.g. `https://translate.googleapis.com`)
    #[must_use]
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            http_client: create_http_client(timeout),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    async fn query(
        &self,
        text: &str,
        source: &str,
        target: &str,
    ) -> Result<Value, TranslationError> {
        let url = format!("{}/translate_a/single", self.base_url);
        let response = self
            .http_client
            .get(url)
            .query(&[
                ("client", "gtx"),
                ("sl", source),
                ("tl", target),
                ("dt", "t"),
                ("q", text),
            ])
            .send()
            .await
            .map_err(|e| TranslationError::Network(describe_transport_error(e)))?;

        if !response.status().is_success() {
            let (status, body) = read_error(response).await;
            return Err(TranslationError::Http { status, body });
        }

        response
            .json()
            .await
            .map_err(|e| TranslationError::Malformed(e.without_url().to_string()))
    }
}

fn detected_language(response: &Value) -> Result<String, TranslationError> {
    response
        .get(2)
        .and_then(Value::as_str)
        .map(ToString::to_string)
        .ok_or_else(|| TranslationError::Malformed("missing detected language".to_string()))
}

fn translated_text(response: &Value) -> Result<String, TranslationError> {
    let segments = response
        .get(0)
        .and_then(Value::as_array)
        .ok_or_else(|| TranslationError::Malformed("missing translation segments".to_string()))?;

    Ok(segments
        .iter()
        .filter_map(|segment| segment.get(0).and_then(Value::as_str))
        .collect())
}

#[async_trait]
impl LanguageService for GoogleTranslate {
    #[instrument(skip(self, text))]
    async fn detect(&self, text: &str) -> Result<String, TranslationError> {
        let response = self.query(text, "auto", super::TARGET_LANGUAGE).await?;
        detected_language(&response)
    }

    #[instrument(skip(self, text))]
    async fn translate(
        &self,
        text: &str,
        source: &str,
        target: &str,
    ) -> Result<String, TranslationError> {
        let response = self.query(text, source, target).await?;
        translated_text(&response)
    }
}
