//! Inline-button dispatch
//!
//! Every inline button carries one of the tags in [`crate::bot::views`].
//! The router performs the chat-side effect and tells the caller which toast
//! to show when acknowledging the button press.

use crate::bot::image_cache::ImageCache;
use crate::bot::transport::ChatTransport;
use crate::bot::views::{
    AUTHOR_INFO, CALLBACK_AUTHOR_INFO, CALLBACK_GENERATE_INFO, CALLBACK_SAVE_IMAGE,
    GENERATION_HELP, SAVED_IMAGE_FILE_NAME, SAVE_NOT_FOUND_TOAST, SAVE_SUCCESS_TOAST,
};
use anyhow::Result;
use std::fmt;
use std::str::FromStr;
use teloxide::types::ChatId;
use tracing::{debug, info};

/// Action behind an inline button
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CallbackAction {
    /// Explain how to request an image
    GenerationHelp,
    /// Show who runs the bot
    AuthorInfo,
    /// Re-send the last generated image as a file
    SaveImage,
}

impl CallbackAction {
    /// Tag carried in the button's callback data
    #[must_use]
    pub const fn tag(self) -> &'static str {
        match self {
            Self::GenerationHelp => CALLBACK_GENERATE_INFO,
            Self::AuthorInfo => CALLBACK_AUTHOR_INFO,
            Self::SaveImage => CALLBACK_SAVE_IMAGE,
        }
    }
}

/// Callback data that matches no known action
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownCallback(pub String);

impl fmt::Display for UnknownCallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown callback data: {:?}", self.0)
    }
}

impl std::error::Error for UnknownCallback {}

impl FromStr for CallbackAction {
    type Err = UnknownCallback;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            CALLBACK_GENERATE_INFO => Ok(Self::GenerationHelp),
            CALLBACK_AUTHOR_INFO => Ok(Self::AuthorInfo),
            CALLBACK_SAVE_IMAGE => Ok(Self::SaveImage),
            other => Err(UnknownCallback(other.to_string())),
        }
    }
}

/// How the button press should be acknowledged
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallbackReply {
    /// Toast text, or `None` for a silent acknowledgement
    pub toast: Option<&'static str>,
}

impl CallbackReply {
    const fn silent() -> Self {
        Self { toast: None }
    }

    const fn toast(text: &'static str) -> Self {
        Self { toast: Some(text) }
    }
}

/// Dispatches inline-button actions
#[derive(Clone)]
pub struct CallbackRouter {
    cache: ImageCache,
}

impl CallbackRouter {
    /// Create a router reading saved images from `cache`
    #[must_use]
    pub const fn new(cache: ImageCache) -> Self {
        Self { cache }
    }

    /// Perform `action` for `chat_id`.
    ///
    /// # Errors
    ///
    /// Returns an error if sending to the chat fails.
    pub async fn handle(
        &self,
        transport: &dyn ChatTransport,
        chat_id: ChatId,
        action: CallbackAction,
    ) -> Result<CallbackReply> {
        debug!(chat_id = chat_id.0, action = action.tag(), "Handling callback");

        match action {
            CallbackAction::GenerationHelp => {
                transport.send_text(chat_id, GENERATION_HELP).await?;
                Ok(CallbackReply::silent())
            }
            CallbackAction::AuthorInfo => {
                transport.send_text(chat_id, AUTHOR_INFO).await?;
                Ok(CallbackReply::silent())
            }
            CallbackAction::SaveImage => {
                let Some(image) = self.cache.get(chat_id).await else {
                    info!(chat_id = chat_id.0, "Save requested but no image is cached");
                    return Ok(CallbackReply::toast(SAVE_NOT_FOUND_TOAST));
                };

                transport
                    .send_document(chat_id, image, SAVED_IMAGE_FILE_NAME)
                    .await?;
                Ok(CallbackReply::toast(SAVE_SUCCESS_TOAST))
            }
        }
    }
}
