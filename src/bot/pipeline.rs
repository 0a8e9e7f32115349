//! Prompt-to-image pipeline
//!
//! Turns one incoming text message into one outbound reply:
//! translate → acknowledge → generate → re-encode → cache → send.

use crate::bot::image_cache::ImageCache;
use crate::bot::transport::ChatTransport;
use crate::bot::views;
use crate::inference::{GenerationError, ImageGenerator};
use crate::translate::PromptTranslator;
use anyhow::Result;
use bytes::Bytes;
use image::ImageFormat;
use std::io::Cursor;
use std::sync::Arc;
use teloxide::types::ChatId;
use tokio::sync::Semaphore;
use tracing::{error, info, warn};

/// What happened to a prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptOutcome {
    /// The image was cached and sent
    Delivered,
    /// The generation endpoint answered with an error status
    GenerationFailed,
    /// The endpoint answered 200 but the payload is not an image
    DecodeFailed,
    /// The generation endpoint could not be reached
    Unreachable,
}

/// Decodes any supported image format and re-encodes it as PNG.
///
/// # Errors
///
/// Returns an `image::ImageError` if the bytes are not a decodable image.
pub fn reencode_png(raw: &[u8]) -> Result<Bytes, image::ImageError> {
    let decoded = image::load_from_memory(raw)?;
    let mut png = Cursor::new(Vec::new());
    decoded.write_to(&mut png, ImageFormat::Png)?;
    Ok(Bytes::from(png.into_inner()))
}

/// Orchestrates translation, generation, caching and replies
pub struct ImagePipeline {
    translator: PromptTranslator,
    generator: Arc<dyn ImageGenerator>,
    cache: ImageCache,
    permits: Semaphore,
}

impl ImagePipeline {
    /// Create a pipeline allowing `max_concurrent` generation requests at once
    #[must_use]
    pub fn new(
        translator: PromptTranslator,
        generator: Arc<dyn ImageGenerator>,
        cache: ImageCache,
        max_concurrent: usize,
    ) -> Self {
        Self {
            translator,
            generator,
            cache,
            permits: Semaphore::new(max_concurrent.max(1)),
        }
    }

    /// Process one prompt from `sender` in `chat_id`.
    ///
    /// Generation, decode and reachability failures are answered in the chat
    /// and reported through the returned [`PromptOutcome`]. A translation
    /// failure falls back to the untranslated prompt.
    ///
    /// # Errors
    ///
    /// Returns an error only if sending to the chat fails.
    pub async fn handle_prompt(
        &self,
        transport: &dyn ChatTransport,
        chat_id: ChatId,
        sender: &str,
        text: &str,
    ) -> Result<PromptOutcome> {
        info!(chat_id = chat_id.0, sender = %sender, text = %text, "Prompt received");

        let prompt = match self.translator.to_english(text).await {
            Ok(translated) => translated,
            Err(e) => {
                warn!(error = %e, "Translation failed, using the original prompt");
                text.to_string()
            }
        };

        transport
            .send_text(chat_id, &views::generating(&prompt))
            .await?;

        let generated = {
            let _permit = self.permits.acquire().await?;
            self.generator.generate(&prompt).await
        };

        let raw = match generated {
            Ok(raw) => raw,
            Err(error @ GenerationError::Http { .. }) => {
                warn!(chat_id = chat_id.0, error = %error, "Generation request rejected");
                transport
                    .send_text(chat_id, &views::generation_failed(&error.to_string()))
                    .await?;
                return Ok(PromptOutcome::GenerationFailed);
            }
            Err(GenerationError::Network(reason)) => {
                error!(chat_id = chat_id.0, reason = %reason, "Generation endpoint unreachable");
                transport
                    .send_text(chat_id, views::SERVICE_UNREACHABLE)
                    .await?;
                return Ok(PromptOutcome::Unreachable);
            }
        };

        let png = match reencode_png(&raw) {
            Ok(png) => png,
            Err(e) => {
                warn!(chat_id = chat_id.0, error = %e, "Generated payload is not an image");
                transport
                    .send_text(chat_id, &views::decode_failed(&e.to_string()))
                    .await?;
                return Ok(PromptOutcome::DecodeFailed);
            }
        };

        self.cache.put(chat_id, png.clone()).await;
        transport.send_image(chat_id, png).await?;

        info!(chat_id = chat_id.0, "Image delivered");
        Ok(PromptOutcome::Delivered)
    }
}
