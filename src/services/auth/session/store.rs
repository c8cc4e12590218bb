use std::{future::Future, pin::Pin};

use crate::services::cache::CacheError;

/// Session liveness check result:
/// - `Ok(true)`: a login record exists for the session key
/// - `Ok(false)`: no record (logged out, expired or revoked)
/// - `Err(_)`: store failure (caller must treat as not live)
pub trait SessionStore: Send + Sync {
    fn is_live<'a>(
        &'a self,
        session_key: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<bool, SessionError>> + Send + 'a>>;
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Cache(#[from] CacheError),
}
