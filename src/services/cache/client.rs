//! Cache client interface used by higher-level services (session liveness checks).
use async_trait::async_trait;
use thiserror::Error;

/// Result type for cache operations.
pub type CacheResult<T> = Result<T, CacheError>;

/// Cache-layer errors (transport/command).
///
/// Note:
/// - We keep this independent from `AppError` so callers can decide how to fail
///   (the session gate fails closed).
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache connection error: {0}")]
    BackendConnection(String),
    #[error("cache command error: {0}")]
    BackendCommand(String),
}

/// A minimal, read-only cache interface.
///
/// The gateway never writes session records; login/logout services own their lifecycle.
/// Implementations must be cheap to clone (typically `Arc<...>` inside).
#[async_trait]
pub trait CacheClient: Clone + Send + Sync + 'static {
    // Returns the cache backend name (for logging).
    fn backend_name(&self) -> &'static str;

    // Whether `key` currently exists. Only presence matters, never the value.
    async fn exists(&self, key: &str) -> CacheResult<bool>;
}
