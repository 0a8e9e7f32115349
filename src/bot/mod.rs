/// Inline-button actions and their dispatch
pub mod callbacks;
/// Command, text and callback handlers
pub mod handlers;
/// Per-chat cache of the last generated image
pub mod image_cache;
/// Prompt-to-image pipeline
pub mod pipeline;
/// Outbound chat operations
pub mod transport;
/// User-facing texts and keyboards
pub mod views;

pub use callbacks::{CallbackAction, CallbackReply, CallbackRouter};
pub use image_cache::ImageCache;
pub use pipeline::{ImagePipeline, PromptOutcome};
pub use transport::{ChatTransport, TelegramTransport};
