//! User-facing texts, callback tags and inline keyboards

use crate::utils::truncate_str;
use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};

// ─────────────────────────────────────────────────────────────────────────────
// Callback constants
// ─────────────────────────────────────────────────────────────────────────────

/// Callback data for the "how to generate" button
pub const CALLBACK_GENERATE_INFO: &str = "generate_info";
/// Callback data for the "about the author" button
pub const CALLBACK_AUTHOR_INFO: &str = "author_info";
/// Callback data for the "save as file" button
pub const CALLBACK_SAVE_IMAGE: &str = "save_image";

/// Maximum message length for Telegram with safety margin.
/// Telegram's official limit is 4096 characters.
pub const TELEGRAM_MESSAGE_LIMIT: usize = 4000;

/// File name used when a cached image is sent as a document
pub const SAVED_IMAGE_FILE_NAME: &str = "image.png";

// ─────────────────────────────────────────────────────────────────────────────
// Texts
// ─────────────────────────────────────────────────────────────────────────────

/// Reply to `/start`
pub const WELCOME: &str = "Привет! Отправьте мне текст, и я сгенерирую изображение.";

/// Sent for the "how to generate" button and `/help`
pub const GENERATION_HELP: &str = "Просто отправьте мне описание картинки одним сообщением.\n\n\
     Можно писать по-русски: запрос будет переведён на английский перед генерацией.\n\
     Под готовым изображением есть кнопка «Сохранить файлом», чтобы получить PNG без сжатия.";

/// Sent for the "about the author" button
pub const AUTHOR_INFO: &str = "Бот передаёт ваши запросы модели генерации изображений \
     и возвращает результат в этот чат.";

/// Toast shown after the cached image was sent as a document
pub const SAVE_SUCCESS_TOAST: &str = "Изображение отправлено файлом";
/// Toast shown when there is no cached image for the chat
pub const SAVE_NOT_FOUND_TOAST: &str = "Изображение не найдено. Сгенерируйте новое.";
/// Toast shown when a button action could not be completed
pub const ACTION_FAILED_TOAST: &str = "Не удалось выполнить действие. Попробуйте ещё раз.";

/// Reply when the generation endpoint could not be reached
pub const SERVICE_UNREACHABLE: &str =
    "Не удалось связаться с сервисом генерации. Попробуйте позже.";

/// Acknowledgement sent before the generation request
#[must_use]
pub fn generating(prompt: &str) -> String {
    truncate_str(
        format!("Генерация изображения для запроса: {prompt}"),
        TELEGRAM_MESSAGE_LIMIT,
    )
}

/// Reply when the generation endpoint returned an error
#[must_use]
pub fn generation_failed(error: &str) -> String {
    truncate_str(
        format!("Не удалось получить изображение. {error}"),
        TELEGRAM_MESSAGE_LIMIT,
    )
}

/// Reply when the returned payload is not a decodable image
#[must_use]
pub fn decode_failed(error: &str) -> String {
    truncate_str(
        format!("Ошибка при открытии изображения: {error}"),
        TELEGRAM_MESSAGE_LIMIT,
    )
}

// ─────────────────────────────────────────────────────────────────────────────
// Keyboards
// ─────────────────────────────────────────────────────────────────────────────

/// Keyboard attached to the welcome message
#[must_use]
pub fn welcome_keyboard() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![InlineKeyboardButton::callback(
            "Как генерировать",
            CALLBACK_GENERATE_INFO,
        )],
        vec![InlineKeyboardButton::callback("Об авторе", CALLBACK_AUTHOR_INFO)],
    ])
}

/// Single-button keyboard attached to every generated photo
#[must_use]
pub fn save_image_keyboard() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![InlineKeyboardButton::callback(
        "💾 Сохранить файлом",
        CALLBACK_SAVE_IMAGE,
    )]])
}
