//! Per-chat cache of the last generated image
//!
//! Backs the "save as file" button: the pipeline stores the PNG it just sent,
//! and a later button press reads it back. Each chat holds at most one image;
//! a newer generation overwrites the older one.

use bytes::Bytes;
use moka::future::Cache;
use moka::policy::EvictionPolicy;
use std::time::Duration;
use teloxide::types::ChatId;

/// Cache mapping a chat to its most recently generated image
///
/// Entries are weighed by their byte length, so `max_bytes` bounds the
/// memory held by images rather than their count. Entries also expire after
/// `ttl` so abandoned chats do not pin memory for the process lifetime.
#[derive(Clone)]
pub struct ImageCache {
    cache: Cache<i64, Bytes>,
}

impl ImageCache {
    /// Creates a new `ImageCache`
    ///
    /// # Arguments
    ///
    /// * `ttl_secs` - Time-to-live for a cached image
    /// * `max_bytes` - Total byte budget across all cached images
    ///
    /// # Examples
    ///
    /// ```
    /// use prompt_painter::bot::ImageCache;
    ///
    /// let cache = ImageCache::new(
    ///     86_400,            // 24 hours TTL
    ///     256 * 1024 * 1024, // 256 MiB
    /// );
    /// ```
    #[must_use]
    pub fn new(ttl_secs: u64, max_bytes: u64) -> Self {
        let cache = Cache::builder()
            .weigher(|_chat: &i64, image: &Bytes| u32::try_from(image.len()).unwrap_or(u32::MAX))
            .max_capacity(max_bytes)
            // The newest image of a chat must always be admitted
            .eviction_policy(EvictionPolicy::lru())
            .time_to_live(Duration::from_secs(ttl_secs))
            .build();

        Self { cache }
    }

    /// Stores `image` as the latest image of `chat_id`, replacing any previous one
    pub async fn put(&self, chat_id: ChatId, image: Bytes) {
        self.cache.insert(chat_id.0, image).await;
    }

    /// Returns the latest image of `chat_id` without removing it
    pub async fn get(&self, chat_id: ChatId) -> Option<Bytes> {
        self.cache.get(&chat_id.0).await
    }

    /// Returns the current number of cached images
    ///
    /// Useful for monitoring and health checks.
    #[must_use]
    pub fn entry_count(&self) -> u64 {
        self.cache.entry_count()
    }
}
