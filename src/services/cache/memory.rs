//! In-process cache double for tests.
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use crate::services::cache::client::{CacheClient, CacheError, CacheResult};

#[derive(Clone, Debug, Default)]
pub struct MemoryCache {
    keys: Arc<Mutex<HashSet<String>>>,
    unavailable: bool,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// A cache whose every command fails, as if the backend were down.
    pub fn unavailable() -> Self {
        Self {
            unavailable: true,
            ..Self::default()
        }
    }

    pub fn insert(&self, key: impl Into<String>) {
        self.keys.lock().unwrap().insert(key.into());
    }

    pub fn remove(&self, key: &str) {
        self.keys.lock().unwrap().remove(key);
    }
}

#[async_trait]
impl CacheClient for MemoryCache {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    async fn exists(&self, key: &str) -> CacheResult<bool> {
        if self.unavailable {
            return Err(CacheError::BackendConnection("connection refused".into()));
        }
        Ok(self.keys.lock().unwrap().contains(key))
    }
}
