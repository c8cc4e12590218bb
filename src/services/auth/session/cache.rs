use std::{future::Future, pin::Pin, sync::Arc};

use crate::services::{
    auth::session::store::{SessionError, SessionStore},
    cache::{CacheClient, ValkeyClient},
};

/// Default key prefix of login records written by the login service.
pub const LOGIN_TOKEN_KEY_PREFIX: &str = "login_tokens:";

/// Cache-backed session store.
///
/// A session is live while `<prefix><session_key>` exists. The value is never read.
#[derive(Clone)]
pub struct CacheSessionStore<C: CacheClient> {
    cache: Arc<C>,
    prefix: String,
}

impl CacheSessionStore<ValkeyClient> {
    pub async fn connect(redis_url: &str, prefix: impl Into<String>) -> Result<Self, SessionError> {
        let client = ValkeyClient::new(redis_url).await?;

        Ok(Self {
            cache: Arc::new(client),
            prefix: prefix.into(),
        })
    }
}

impl<C: CacheClient> CacheSessionStore<C> {
    pub fn new_with_cache(cache: Arc<C>, prefix: impl Into<String>) -> Self {
        Self {
            cache,
            prefix: prefix.into(),
        }
    }

    pub fn key(&self, session_key: &str) -> String {
        format!("{}{}", self.prefix, session_key)
    }
}

impl<C: CacheClient> SessionStore for CacheSessionStore<C> {
    fn is_live<'a>(
        &'a self,
        session_key: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<bool, SessionError>> + Send + 'a>> {
        Box::pin(async move {
            let full_key = self.key(session_key);
            let live = self.cache.exists(&full_key).await?;

            tracing::debug!(
                backend = self.cache.backend_name(),
                key = %full_key,
                live,
                "session liveness checked"
            );

            Ok(live)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::cache::MemoryCache;

    #[test]
    fn key_is_prefix_followed_by_session_key() {
        let store =
            CacheSessionStore::new_with_cache(Arc::new(MemoryCache::new()), "login_tokens:");
        assert_eq!(store.key("abc-123"), "login_tokens:abc-123");
    }

    #[tokio::test]
    async fn live_only_while_record_exists() {
        let cache = Arc::new(MemoryCache::new());
        let store = CacheSessionStore::new_with_cache(cache.clone(), LOGIN_TOKEN_KEY_PREFIX);

        assert!(!store.is_live("s1").await.unwrap());

        cache.insert("login_tokens:s1");
        assert!(store.is_live("s1").await.unwrap());

        // forced logout
        cache.remove("login_tokens:s1");
        assert!(!store.is_live("s1").await.unwrap());
    }

    #[tokio::test]
    async fn record_under_a_different_prefix_does_not_count() {
        let cache = Arc::new(MemoryCache::new());
        cache.insert("s1");
        let store = CacheSessionStore::new_with_cache(cache, LOGIN_TOKEN_KEY_PREFIX);

        assert!(!store.is_live("s1").await.unwrap());
    }

    #[tokio::test]
    async fn backend_failure_is_an_error() {
        let store =
            CacheSessionStore::new_with_cache(Arc::new(MemoryCache::unavailable()), "p:");

        let err = store.is_live("s1").await.unwrap_err();
        assert!(matches!(err, SessionError::Cache(_)));
    }
}
