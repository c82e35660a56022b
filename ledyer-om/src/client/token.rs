//! Bearer token cache.

use std::{fmt, time::Duration};

use tokio::{sync::RwLock, time::Instant};

/// Upper bound on how long a token is cached, whatever lifetime the server reports.
pub const MAX_TOKEN_TTL: Duration = Duration::from_secs(30 * 24 * 60 * 60);

/// Cached bearer token shared between clients.
///
/// Entries expire after the lifetime the OAuth server reported. Concurrent refreshes
/// may race; the last writer wins and both tokens are valid.
///
/// # Examples
///
/// ```
/// use std::{sync::Arc, time::Duration};
///
/// use ledyer_om::client::TokenStore;
///
/// # async fn example() {
/// let store = Arc::new(TokenStore::new());
/// store.set("abc".to_owned(), Duration::from_secs(3600)).await;
/// assert_eq!(store.get().await.as_deref(), Some("abc"));
///
/// store.invalidate().await;
/// assert!(store.get().await.is_none());
/// # }
/// ```
#[derive(Default)]
pub struct TokenStore {
    slot: RwLock<Option<CachedToken>>,
}

struct CachedToken {
    value: String,
    expires_at: Instant,
}

impl TokenStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached token unless it has expired.
    pub async fn get(&self) -> Option<String> {
        let slot = self.slot.read().await;
        slot.as_ref()
            .filter(|token| Instant::now() < token.expires_at)
            .map(|token| token.value.clone())
    }

    /// Caches `token` for `ttl`, capped at [`MAX_TOKEN_TTL`].
    pub async fn set(&self, token: String, ttl: Duration) {
        let expires_at = Instant::now() + ttl.min(MAX_TOKEN_TTL);
        *self.slot.write().await = Some(CachedToken { value: token, expires_at });
    }

    /// Drops the cached token.
    pub async fn invalidate(&self) {
        *self.slot.write().await = None;
    }
}

impl fmt::Debug for TokenStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cached = self.slot.try_read().map_or("locked", |slot| {
            if slot.is_some() { "cached" } else { "empty" }
        });
        f.debug_struct("TokenStore").field("token", &cached).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_token_expires_after_ttl() {
        let store = TokenStore::new();
        store.set("abc".to_owned(), Duration::from_secs(60)).await;

        tokio::time::advance(Duration::from_secs(59)).await;
        assert_eq!(store.get().await.as_deref(), Some("abc"));

        tokio::time::advance(Duration::from_secs(1)).await;
        assert!(store.get().await.is_none());
    }

    #[tokio::test]
    async fn test_zero_ttl_is_never_served() {
        let store = TokenStore::new();
        store.set("abc".to_owned(), Duration::ZERO).await;
        assert!(store.get().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_huge_ttl_is_capped() {
        let store = TokenStore::new();
        store.set("abc".to_owned(), Duration::from_secs(u64::MAX)).await;
        assert_eq!(store.get().await.as_deref(), Some("abc"));

        tokio::time::advance(MAX_TOKEN_TTL).await;
        assert!(store.get().await.is_none());
    }

    #[tokio::test]
    async fn test_set_replaces_token() {
        let store = TokenStore::new();
        store.set("first".to_owned(), Duration::from_secs(60)).await;
        store.set("second".to_owned(), Duration::from_secs(60)).await;
        assert_eq!(store.get().await.as_deref(), Some("second"));
    }

    #[tokio::test]
    async fn test_debug_hides_token() {
        let store = TokenStore::new();
        store.set("very-secret".to_owned(), Duration::from_secs(60)).await;
        let debug = format!("{store:?}");
        assert!(!debug.contains("very-secret"));
        assert!(debug.contains("cached"));
    }
}
