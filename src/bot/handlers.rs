use crate::bot::callbacks::{CallbackAction, CallbackRouter};
use crate::bot::pipeline::ImagePipeline;
use crate::bot::transport::ChatTransport;
use crate::bot::views;
use anyhow::Result;
use teloxide::{
    prelude::*,
    types::{CallbackQuery, ChatId},
    utils::command::BotCommands,
};
use tracing::{debug, warn};

/// Supported commands for the bot
#[derive(BotCommands, Clone, Debug, PartialEq, Eq)]
#[command(rename_rule = "lowercase", description = "Supported commands:")]
pub enum Command {
    /// Show the welcome message with the info buttons
    #[command(description = "Start the bot.")]
    Start,
    /// Explain how to request an image
    #[command(description = "How to generate an image.")]
    Help,
}

/// Best-effort display name of the message sender
#[must_use]
pub fn get_user_name(msg: &Message) -> String {
    if let Some(ref user) = msg.from {
        if let Some(ref username) = user.username {
            return username.clone();
        }
        if !user.first_name.is_empty() {
            return user.first_name.clone();
        }
    }
    "Unknown".to_string()
}

/// Handle the /start command
///
/// # Errors
///
/// Returns an error if the welcome message cannot be sent.
pub async fn start(transport: &dyn ChatTransport, chat_id: ChatId) -> Result<()> {
    transport
        .send_text_with_keyboard(chat_id, views::WELCOME, views::welcome_keyboard())
        .await
}

/// Handle the /help command
///
/// # Errors
///
/// Returns an error if the instructions cannot be sent.
pub async fn help(transport: &dyn ChatTransport, chat_id: ChatId) -> Result<()> {
    transport.send_text(chat_id, views::GENERATION_HELP).await
}

/// Run a non-command text message through the image pipeline.
///
/// Messages without text are ignored.
///
/// # Errors
///
/// Returns an error if a reply cannot be sent.
pub async fn handle_text(
    transport: &dyn ChatTransport,
    pipeline: &ImagePipeline,
    msg: &Message,
) -> Result<()> {
    let Some(text) = msg.text() else {
        debug!(chat_id = msg.chat.id.0, "Ignoring non-text message");
        return Ok(());
    };

    let outcome = pipeline
        .handle_prompt(transport, msg.chat.id, &get_user_name(msg), text)
        .await?;
    debug!(chat_id = msg.chat.id.0, ?outcome, "Prompt handled");
    Ok(())
}

/// Handle an inline-button press and acknowledge it.
///
/// Queries without an attached chat or with unknown data are acknowledged
/// silently and otherwise ignored. A failed action is acknowledged with a
/// failure toast.
///
/// # Errors
///
/// Returns an error if the action or the acknowledgement fails.
pub async fn handle_callback(
    bot: &Bot,
    transport: &dyn ChatTransport,
    router: &CallbackRouter,
    q: CallbackQuery,
) -> Result<()> {
    let Some(chat_id) = q.message.as_ref().map(|msg| msg.chat().id) else {
        debug!("Callback query without a chat, acknowledging only");
        bot.answer_callback_query(q.id.clone()).await?;
        return Ok(());
    };

    let action = match q.data.as_deref().unwrap_or_default().parse::<CallbackAction>() {
        Ok(action) => action,
        Err(e) => {
            warn!(chat_id = chat_id.0, error = %e, "Ignoring callback");
            bot.answer_callback_query(q.id.clone()).await?;
            return Ok(());
        }
    };

    let result = router.handle(transport, chat_id, action).await;

    let toast = match &result {
        Ok(reply) => reply.toast,
        Err(_) => Some(views::ACTION_FAILED_TOAST),
    };
    let mut answer = bot.answer_callback_query(q.id.clone());
    if let Some(toast) = toast {
        answer = answer.text(toast);
    }
    answer.await?;

    result.map(|_| ())
}
