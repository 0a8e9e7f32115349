//! Prompt translation
//!
//! Prompts written in Russian are translated to English before generation;
//! everything else is passed through as-is.

/// Google Translate web endpoint client
pub mod google;

pub use google::GoogleTranslate;

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

/// Language code of prompts that are translated
pub const SOURCE_LANGUAGE: &str = "ru";
/// Language code prompts are translated into
pub const TARGET_LANGUAGE: &str = "en";

/// Errors that can occur while detecting or translating text
#[derive(Debug, Error)]
pub enum TranslationError {
    /// The translation service could not be reached or timed out
    #[error("Network error: {0}")]
    Network(String),
    /// The translation service answered with a non-success status
    #[error("Translation service returned {status}: {body}")]
    Http {
        /// HTTP status code
        status: u16,
        /// Response body text
        body: String,
    },
    /// The response did not have the expected shape
    #[error("Malformed translation response: {0}")]
    Malformed(String),
}

/// Language detection and translation backend
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LanguageService: Send + Sync {
    /// Detect the language of `text`, returning an ISO 639-1 code
    async fn detect(&self, text: &str) -> Result<String, TranslationError>;

    /// Translate `text` from `source` to `target`
    async fn translate(
        &self,
        text: &str,
        source: &str,
        target: &str,
    ) -> Result<String, TranslationError>;
}

/// Turns user prompts into English prompts
#[derive(Clone)]
pub struct PromptTranslator {
    service: Arc<dyn LanguageService>,
}

impl PromptTranslator {
    /// Create a translator over `service`
    #[must_use]
    pub fn new(service: Arc<dyn LanguageService>) -> Self {
        Self { service }
    }

    /// Translate `text` to English if it is Russian, otherwise return it unchanged.
    ///
    /// Makes one detection call and, for Russian input only, one translation call.
    ///
    /// # Errors
    ///
    /// Returns a `TranslationError` if either call fails.
    pub async fn to_english(&self, text: &str) -> Result<String, TranslationError> {
        let language = self.service.detect(text).await?;
        debug!(language = %language, "Detected prompt language");

        if language != SOURCE_LANGUAGE {
            return Ok(text.to_string());
        }

        self.service
            .translate(text, SOURCE_LANGUAGE, TARGET_LANGUAGE)
            .await
    }
}
