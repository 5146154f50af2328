//! Access token cache
//!
//! Holds one bearer token with an explicit expiry. Owned by whoever builds the
//! grocery client and passed in, so tests and multiple clients never share
//! hidden process-wide state.

use std::future::Future;
use std::time::{Duration, Instant};

use tokio::sync::Mutex;

/// Tokens are treated as expired this long before the server says so
pub const DEFAULT_EXPIRY_SKEW: Duration = Duration::from_secs(60);

/// Longest lifetime accepted from a token response
pub const MAX_TOKEN_LIFETIME: Duration = Duration::from_secs(24 * 60 * 60);

fn expiry_from_now(expires_in: Duration) -> Instant {
    let now = Instant::now();
    now.checked_add(expires_in.min(MAX_TOKEN_LIFETIME)).unwrap_or(now)
}

#[derive(Debug, Clone)]
struct CachedToken {
    token: String,
    expires_at: Instant,
}

impl CachedToken {
    fn valid_at(&self, now: Instant, skew: Duration) -> bool {
        now + skew < self.expires_at
    }
}

/// Single-token cache with expiry
#[derive(Debug)]
pub struct TokenCache {
    slot: Mutex<Option<CachedToken>>,
    skew: Duration,
}

impl Default for TokenCache {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenCache {
    pub fn new() -> Self {
        Self::with_skew(DEFAULT_EXPIRY_SKEW)
    }

    pub fn with_skew(skew: Duration) -> Self {
        Self {
            slot: Mutex::new(None),
            skew,
        }
    }

    /// The cached token, if it is still valid
    pub async fn get(&self) -> Option<String> {
        let slot = self.slot.lock().await;
        slot.as_ref()
            .filter(|t| t.valid_at(Instant::now(), self.skew))
            .map(|t| t.token.clone())
    }

    /// Store a token that the server says lives for `expires_in`
    pub async fn store(&self, token: String, expires_in: Duration) {
        let mut slot = self.slot.lock().await;
        *slot = Some(CachedToken {
            token,
            expires_at: expiry_from_now(expires_in),
        });
    }

    /// Forget the cached token (e.g. after a 401)
    pub async fn clear(&self) {
        *self.slot.lock().await = None;
    }

    /// Return the cached token, or fetch and cache a new one.
    ///
    /// The lock is held during the refresh so concurrent callers wait for a
    /// single token request.
    pub async fn get_or_refresh<F, Fut, E>(&self, refresh: F) -> Result<String, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<(String, Duration), E>>,
    {
        let mut slot = self.slot.lock().await;
        if let Some(cached) = slot.as_ref() {
            if cached.valid_at(Instant::now(), self.skew) {
                return Ok(cached.token.clone());
            }
        }

        let (token, expires_in) = refresh().await?;
        *slot = Some(CachedToken {
            token: token.clone(),
            expires_at: expiry_from_now(expires_in),
        });
        Ok(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_validity_respects_skew() {
        let now = Instant::now();
        let token = CachedToken {
            token: "t".to_string(),
            expires_at: now + Duration::from_secs(90),
        };
        assert!(token.valid_at(now, Duration::from_secs(60)));
        assert!(!token.valid_at(now + Duration::from_secs(31), Duration::from_secs(60)));
        assert!(!token.valid_at(now, Duration::from_secs(90)));
    }

    #[tokio::test]
    async fn test_store_and_get() {
        let cache = TokenCache::new();
        assert_eq!(cache.get().await, None);

        cache.store("abc".to_string(), Duration::from_secs(1800)).await;
        assert_eq!(cache.get().await.as_deref(), Some("abc"));

        cache.clear().await;
        assert_eq!(cache.get().await, None);
    }

    #[tokio::test]
    async fn test_huge_lifetime_is_clamped() {
        let cache = TokenCache::new();
        cache.store("abc".to_string(), Duration::MAX).await;
        assert_eq!(cache.get().await.as_deref(), Some("abc"));

        let token: Result<String, ()> = TokenCache::new()
            .get_or_refresh(|| async { Ok(("big".to_string(), Duration::from_secs(u64::MAX))) })
            .await;
        assert_eq!(token.unwrap(), "big");
    }

    #[test]
    fn test_expiry_never_exceeds_cap() {
        let before = Instant::now();
        let expires_at = expiry_from_now(Duration::MAX);
        assert!(expires_at <= Instant::now() + MAX_TOKEN_LIFETIME);
        assert!(expires_at > before);
    }

    #[tokio::test]
    async fn test_short_lived_token_is_not_served() {
        let cache = TokenCache::new();
        cache.store("abc".to_string(), Duration::from_secs(30)).await;
        assert_eq!(cache.get().await, None);
    }

    #[tokio::test]
    async fn test_refresh_only_when_needed() {
        let cache = TokenCache::new();
        let calls = AtomicUsize::new(0);

        for _ in 0..3 {
            let token: Result<String, ()> = cache
                .get_or_refresh(|| async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(("fresh".to_string(), Duration::from_secs(1800)))
                })
                .await;
            assert_eq!(token.unwrap(), "fresh");
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_refresh_error_leaves_cache_empty() {
        let cache = TokenCache::new();
        let result: Result<String, &str> = cache.get_or_refresh(|| async { Err("denied") }).await;
        assert_eq!(result.unwrap_err(), "denied");
        assert_eq!(cache.get().await, None);
    }
}
