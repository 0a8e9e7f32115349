//! Bearer credential shared by every generation request.
//!
//! A single [`TokenManager`] owns the current token. Only its `refresh`
//! writes it; generation requests read it through `current_token`.
//! [`TokenRefresher`] drives `refresh` on a fixed interval in the background.

use super::{TokenRotationError, TokenRotator};
use crate::utils::mask_secret;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Owner of the current bearer credential
pub struct TokenManager {
    current: RwLock<String>,
    rotator: Option<Arc<dyn TokenRotator>>,
}

impl TokenManager {
    /// Create a manager seeded with the configured fallback token
    #[must_use]
    pub fn new(initial_token: impl Into<String>, rotator: Arc<dyn TokenRotator>) -> Self {
        Self {
            current: RwLock::new(initial_token.into()),
            rotator: Some(rotator),
        }
    }

    /// Create a manager whose token never changes
    #[must_use]
    pub fn fixed(token: impl Into<String>) -> Self {
        Self {
            current: RwLock::new(token.into()),
            rotator: None,
        }
    }

    /// Whether `refresh` can ever change the token
    #[must_use]
    pub const fn rotates(&self) -> bool {
        self.rotator.is_some()
    }

    /// Returns the current token. Never blocks on a rotation in progress.
    #[must_use]
    pub fn current_token(&self) -> String {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Rotate the token once.
    ///
    /// The credential is replaced only when the rotator returns a non-empty
    /// token; on any failure it is left untouched and the failure is logged.
    ///
    /// # Errors
    ///
    /// Returns the rotation failure after logging it.
    pub async fn refresh(&self) -> Result<(), TokenRotationError> {
        let Some(rotator) = &self.rotator else {
            debug!("Token rotation is not configured, keeping the fixed token");
            return Ok(());
        };

        match rotator.rotate().await {
            Ok(token) if !token.is_empty() => {
                info!(token = %mask_secret(&token), "API token rotated");
                *self.current.write().unwrap_or_else(PoisonError::into_inner) = token;
                Ok(())
            }
            Ok(_) => {
                warn!("Token rotation returned an empty token, keeping the current one");
                Err(TokenRotationError::MissingToken)
            }
            Err(e) => {
                warn!(error = %e, "Token rotation failed, keeping the current token");
                Err(e)
            }
        }
    }
}

/// Background driver that refreshes the token on a fixed interval
pub struct TokenRefresher {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

impl TokenRefresher {
    /// Rotate once now, then keep rotating every `interval` in a spawned task.
    ///
    /// The first rotation is awaited so the bot starts with a fresh token when
    /// the rotation endpoint is healthy. Its failure is not fatal: the
    /// configured fallback token stays in place and the schedule starts anyway.
    pub async fn start(manager: Arc<TokenManager>, interval: Duration) -> Self {
        if manager.refresh().await.is_err() {
            warn!("Initial token rotation failed, using the configured token");
        }
        Self::spawn(manager, interval)
    }

    /// Spawn the periodic task; the first rotation happens one `interval` from now.
    #[must_use]
    pub fn spawn(manager: Arc<TokenManager>, interval: Duration) -> Self {
        let cancel = CancellationToken::new();
        let task_cancel = cancel.clone();

        let handle = tokio::spawn(async move {
            let start = tokio::time::Instant::now() + interval;
            let mut ticker = tokio::time::interval_at(start, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    () = task_cancel.cancelled() => break,
                    _ = ticker.tick() => {
                        // Failures are already logged; the schedule never changes.
                        let _ = manager.refresh().await;
                    }
                }
            }
            debug!("Token refresher stopped");
        });

        info!(interval_secs = interval.as_secs(), "Token refresher started");
        Self { cancel, handle }
    }

    /// Stop the periodic task and wait for it to finish
    pub async fn shutdown(self) {
        self.cancel.cancel();
        if let Err(e) = self.handle.await {
            warn!(error = %e, "Token refresher task ended abnormally");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inference::MockTokenRotator;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn manager_with(rotator: MockTokenRotator) -> TokenManager {
        TokenManager::new("fallback", Arc::new(rotator))
    }

    #[tokio::test]
    async fn test_refresh_replaces_token_on_success() {
        let mut rotator = MockTokenRotator::new();
        rotator
            .expect_rotate()
            .times(1)
            .returning(|| Ok("fresh-token".to_string()));
        let manager = manager_with(rotator);

        assert_eq!(manager.current_token(), "fallback");
        assert!(manager.refresh().await.is_ok());
        assert_eq!(manager.current_token(), "fresh-token");
    }

    #[tokio::test]
    async fn test_refresh_keeps_token_on_failure() {
        let mut rotator = MockTokenRotator::new();
        rotator.expect_rotate().times(1).returning(|| {
            Err(TokenRotationError::Status {
                status: 401,
                body: "expired session".to_string(),
            })
        });
        let manager = manager_with(rotator);

        let result = manager.refresh().await;
        assert!(matches!(
            result,
            Err(TokenRotationError::Status { status: 401, .. })
        ));
        assert_eq!(manager.current_token(), "fallback");
    }

    #[tokio::test]
    async fn test_refresh_rejects_empty_token() {
        let mut rotator = MockTokenRotator::new();
        rotator
            .expect_rotate()
            .times(1)
            .returning(|| Ok(String::new()));
        let manager = manager_with(rotator);

        assert!(matches!(
            manager.refresh().await,
            Err(TokenRotationError::MissingToken)
        ));
        assert_eq!(manager.current_token(), "fallback");
    }

    #[tokio::test]
    async fn test_fixed_token_never_changes() {
        let manager = TokenManager::fixed("static");
        assert!(!manager.rotates());
        assert!(manager.refresh().await.is_ok());
        assert_eq!(manager.current_token(), "static");
    }

    /// Counts rotations and fails every other one.
    struct CountingRotator {
        calls: AtomicUsize,
    }

    #[async_trait::async_trait]
    impl TokenRotator for CountingRotator {
        async fn rotate(&self) -> Result<String, TokenRotationError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if n % 2 == 0 {
                Err(TokenRotationError::Network("connection failed".to_string()))
            } else {
                Ok(format!("token-{n}"))
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_refresher_ticks_once_per_interval_regardless_of_outcome() {
        let rotator = Arc::new(CountingRotator {
            calls: AtomicUsize::new(0),
        });
        let manager = Arc::new(TokenManager::new("fallback", rotator.clone()));
        let interval = Duration::from_secs(300);

        let refresher = TokenRefresher::start(manager.clone(), interval).await;
        assert_eq!(rotator.calls.load(Ordering::SeqCst), 1);
        assert_eq!(manager.current_token(), "token-1");

        // Second rotation fails, third succeeds again.
        tokio::time::sleep(interval * 2 + Duration::from_secs(1)).await;
        assert_eq!(rotator.calls.load(Ordering::SeqCst), 3);
        assert_eq!(manager.current_token(), "token-3");

        tokio::time::sleep(interval * 2).await;
        assert_eq!(rotator.calls.load(Ordering::SeqCst), 5);

        refresher.shutdown().await;
        tokio::time::sleep(interval * 3).await;
        assert_eq!(rotator.calls.load(Ordering::SeqCst), 5);
    }
}
