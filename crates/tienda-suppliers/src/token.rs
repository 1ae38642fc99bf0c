//! Access-token caching for token-API suppliers.
//!
//! The cache is an explicit dependency injected at adapter construction,
//! keyed by adapter identity, so its lifetime is scoped to the process (or
//! whatever object the caller hands in) instead of an ambient file on disk.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

/// Get/set storage for supplier access tokens.
#[async_trait]
pub trait TokenCache: Send + Sync {
    async fn get(&self, key: &str) -> Option<String>;
    async fn set(&self, key: &str, token: &str);
    /// Drops a cached token, forcing the next call to re-authenticate.
    async fn invalidate(&self, key: &str);
}

/// Process-lifetime in-memory [`TokenCache`].
#[derive(Debug, Default)]
pub struct MemoryTokenCache {
    tokens: Mutex<HashMap<String, String>>,
}

impl MemoryTokenCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TokenCache for MemoryTokenCache {
    async fn get(&self, key: &str) -> Option<String> {
        self.tokens.lock().await.get(key).cloned()
    }

    async fn set(&self, key: &str, token: &str) {
        self.tokens.lock().await.insert(key.to_owned(), token.to_owned());
    }

    async fn invalidate(&self, key: &str) {
        self.tokens.lock().await.remove(key);
    }
}
