//! Configuration and settings management
//!
//! Loads settings from environment variables and defines runtime constants.

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Application settings loaded from environment variables
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Settings {
    /// Telegram Bot API token
    pub telegram_token: String,

    /// Image generation endpoint
    pub api_url: String,
    /// Bearer token used until the first successful rotation
    #[serde(default)]
    pub api_token: String,

    /// Token rotation endpoint; rotation is disabled when unset
    pub rotation_url: Option<String>,
    /// Session cookie presented to the rotation endpoint
    pub session_cookie: Option<String>,
    /// Seconds between token rotations
    #[serde(default = "default_token_refresh_interval_secs")]
    pub token_refresh_interval_secs: u64,

    /// Base URL of the translation service
    #[serde(default = "default_translate_base_url")]
    pub translate_base_url: String,

    /// Timeout for a single generation request
    #[serde(default = "default_generation_http_timeout_secs")]
    pub generation_http_timeout_secs: u64,
    /// Timeout for a single rotation request
    #[serde(default = "default_rotation_http_timeout_secs")]
    pub rotation_http_timeout_secs: u64,
    /// Timeout for a single translation request
    #[serde(default = "default_translate_http_timeout_secs")]
    pub translate_http_timeout_secs: u64,

    /// Lifetime of a cached image
    #[serde(default = "default_image_cache_ttl_secs")]
    pub image_cache_ttl_secs: u64,
    /// Total byte budget of the image cache
    #[serde(default = "default_image_cache_max_bytes")]
    pub image_cache_max_bytes: u64,

    /// Upper bound of generation requests in flight at once
    #[serde(default = "default_max_concurrent_generations")]
    pub max_concurrent_generations: usize,
}

const fn default_token_refresh_interval_secs() -> u64 {
    TOKEN_REFRESH_INTERVAL_SECS
}

fn default_translate_base_url() -> String {
    "https://translate.googleapis.com".to_string()
}

const fn default_generation_http_timeout_secs() -> u64 {
    120
}

const fn default_rotation_http_timeout_secs() -> u64 {
    30
}

const fn default_translate_http_timeout_secs() -> u64 {
    15
}

const fn default_image_cache_ttl_secs() -> u64 {
    IMAGE_CACHE_TTL_SECS
}

const fn default_image_cache_max_bytes() -> u64 {
    IMAGE_CACHE_MAX_BYTES
}

const fn default_max_concurrent_generations() -> usize {
    4
}

impl Settings {
    /// Create new settings by loading from environment and files
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use prompt_painter::config::Settings;
    ///
    /// let settings = Settings::new().expect("Failed to load configuration");
    /// ```
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if loading fails.
    pub fn new() -> Result<Self, ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = Config::builder()
            // Start off by merging in the "default" configuration file
            .add_source(File::with_name("config/default").required(false))
            // Add in the current environment file
            .add_source(File::with_name(&format!("config/{run_mode}")).required(false))
            // Local overrides, not checked into git
            .add_source(File::with_name("config/local").required(false))
            // Eg.. `APP__API_URL=... ./target/app` would set the `api_url` key
            .add_source(Environment::with_prefix("APP").separator("__"))
            // Plain env vars; empty values are treated as unset
            .add_source(Environment::default().ignore_empty(true))
            .build()?;

        s.try_deserialize()
    }

    /// Rotation endpoint together with its session cookie, if both are set
    #[must_use]
    pub fn rotation(&self) -> Option<(&str, &str)> {
        let url = self.rotation_url.as_deref().filter(|s| !s.is_empty())?;
        let cookie = self.session_cookie.as_deref().filter(|s| !s.is_empty())?;
        Some((url, cookie))
    }

    /// Interval between token rotations
    #[must_use]
    pub fn token_refresh_interval(&self) -> Duration {
        Duration::from_secs(self.token_refresh_interval_secs.max(1))
    }
}

/// Default interval between token rotations (5 minutes)
pub const TOKEN_REFRESH_INTERVAL_SECS: u64 = 300;

/// Default lifetime of a cached image (24 hours)
pub const IMAGE_CACHE_TTL_SECS: u64 = 86_400;
/// Default byte budget of the image cache (256 MiB)
pub const IMAGE_CACHE_MAX_BYTES: u64 = 256 * 1024 * 1024;

// Telegram upload retry policy
/// Initial backoff before retrying a Telegram API call
pub const TELEGRAM_API_INITIAL_BACKOFF_MS: u64 = 500;
/// Upper bound of the backoff between Telegram API retries
pub const TELEGRAM_API_MAX_BACKOFF_MS: u64 = 4000;
/// Maximum retries of a Telegram API call
pub const TELEGRAM_API_MAX_RETRIES: usize = 3;

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    fn settings() -> Settings {
        Settings {
            telegram_token: "dummy".to_string(),
            api_url: "https://example.com/models/sdxl".to_string(),
            api_token: "fallback".to_string(),
            rotation_url: None,
            session_cookie: None,
            token_refresh_interval_secs: TOKEN_REFRESH_INTERVAL_SECS,
            translate_base_url: default_translate_base_url(),
            generation_http_timeout_secs: 120,
            rotation_http_timeout_secs: 30,
            translate_http_timeout_secs: 15,
            image_cache_ttl_secs: IMAGE_CACHE_TTL_SECS,
            image_cache_max_bytes: IMAGE_CACHE_MAX_BYTES,
            max_concurrent_generations: 4,
        }
    }

    // Single test touching the process environment to avoid races
    #[test]
    fn test_config_env_loading() -> Result<(), Box<dyn std::error::Error>> {
        env::set_var("TELEGRAM_TOKEN", "dummy_token");
        env::set_var("API_URL", "https://example.com/models/sdxl");
        env::set_var("ROTATION_URL", "");

        let settings = Settings::new()?;
        assert_eq!(settings.telegram_token, "dummy_token");
        assert_eq!(settings.api_url, "https://example.com/models/sdxl");
        assert_eq!(settings.rotation_url, None);
        assert_eq!(settings.token_refresh_interval_secs, 300);
        assert_eq!(settings.max_concurrent_generations, 4);

        env::set_var("TOKEN_REFRESH_INTERVAL_SECS", "60");
        let settings = Settings::new()?;
        assert_eq!(settings.token_refresh_interval(), Duration::from_secs(60));

        env::remove_var("TOKEN_REFRESH_INTERVAL_SECS");
        env::remove_var("ROTATION_URL");
        env::remove_var("API_URL");
        env::remove_var("TELEGRAM_TOKEN");
        Ok(())
    }

    #[test]
    fn test_rotation_requires_url_and_cookie() {
        let mut settings = settings();
        assert!(settings.rotation().is_none());

        settings.rotation_url = Some("https://example.com/rotate".to_string());
        assert!(settings.rotation().is_none());

        settings.session_cookie = Some(String::new());
        assert!(settings.rotation().is_none());

        settings.session_cookie = Some("session=abc".to_string());
        assert_eq!(
            settings.rotation(),
            Some(("https://example.com/rotate", "session=abc"))
        );
    }

    #[test]
    fn test_refresh_interval_never_zero() {
        let mut settings = settings();
        settings.token_refresh_interval_secs = 0;
        assert_eq!(settings.token_refresh_interval(), Duration::from_secs(1));
    }
}
