use crate::bot::views::{save_image_keyboard, SAVED_IMAGE_FILE_NAME};
use anyhow::Result;
use async_trait::async_trait;
use bytes::Bytes;
use teloxide::prelude::*;
use teloxide::types::{ChatId, InlineKeyboardMarkup, InputFile};

/// Outbound side of the chat: everything the pipeline and router send.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Send a plain text message
    async fn send_text(&self, chat_id: ChatId, text: &str) -> Result<()>;

    /// Send a text message with an inline keyboard
    async fn send_text_with_keyboard(
        &self,
        chat_id: ChatId,
        text: &str,
        keyboard: InlineKeyboardMarkup,
    ) -> Result<()>;

    /// Send a generated PNG as a photo carrying the "save as file" button
    async fn send_image(&self, chat_id: ChatId, png: Bytes) -> Result<()>;

    /// Send bytes as a downloadable file
    async fn send_document(&self, chat_id: ChatId, content: Bytes, file_name: &str) -> Result<()>;
}

/// Telegram implementation of [`ChatTransport`].
#[derive(Clone)]
pub struct TelegramTransport {
    bot: Bot,
}

impl TelegramTransport {
    /// Wrap a bot handle
    #[must_use]
    pub const fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

#[async_trait]
impl ChatTransport for TelegramTransport {
    async fn send_text(&self, chat_id: ChatId, text: &str) -> Result<()> {
        self.bot.send_message(chat_id, text).await?;
        Ok(())
    }

    async fn send_text_with_keyboard(
        &self,
        chat_id: ChatId,
        text: &str,
        keyboard: InlineKeyboardMarkup,
    ) -> Result<()> {
        self.bot
            .send_message(chat_id, text)
            .reply_markup(keyboard)
            .await?;
        Ok(())
    }

    async fn send_image(&self, chat_id: ChatId, png: Bytes) -> Result<()> {
        crate::utils::retry_telegram_operation(|| async {
            let photo = InputFile::memory(png.to_vec()).file_name(SAVED_IMAGE_FILE_NAME);
            self.bot
                .send_photo(chat_id, photo)
                .reply_markup(save_image_keyboard())
                .await
                .map(|_| ())
                .map_err(|e| anyhow::anyhow!("Telegram photo upload error: {e}"))
        })
        .await
    }

    async fn send_document(&self, chat_id: ChatId, content: Bytes, file_name: &str) -> Result<()> {
        crate::utils::retry_telegram_operation(|| async {
            let document = InputFile::memory(content.to_vec()).file_name(file_name.to_string());
            self.bot
                .send_document(chat_id, document)
                .await
                .map(|_| ())
                .map_err(|e| anyhow::anyhow!("Telegram document upload error: {e}"))
        })
        .await
    }
}
