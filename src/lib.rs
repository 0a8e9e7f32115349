#![deny(missing_docs)]
//! Prompt Painter library.
//!
//! Telegram bot that turns text prompts into images through a hosted
//! inference endpoint, translating Russian prompts to English first.

/// Telegram handlers, pipeline and chat-side state.
pub mod bot;
/// Configuration management.
pub mod config;
/// Generation client and bearer token lifecycle.
pub mod inference;
/// Prompt translation.
pub mod translate;
/// Utility functions.
pub mod utils;
