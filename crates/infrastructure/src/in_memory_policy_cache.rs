use std::collections::HashMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use gatehouse_application::DistributedCache;
use gatehouse_core::AppResult;
use regex::Regex;
use tokio::sync::RwLock;

struct PolicyCacheEntry {
    value: Vec<u8>,
    expires_at: Instant,
}

/// In-memory stand-in for the shared policy cache layer.
#[derive(Default)]
pub struct InMemoryPolicyCache {
    entries: RwLock<HashMap<String, PolicyCacheEntry>>,
}

impl InMemoryPolicyCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DistributedCache for InMemoryPolicyCache {
    async fn get(&self, key: &str) -> AppResult<Option<Vec<u8>>> {
        {
            let entries = self.entries.read().await;
            match entries.get(key) {
                Some(entry) if entry.expires_at > Instant::now() => {
                    return Ok(Some(entry.value.clone()));
                }
                Some(_) => {}
                None => return Ok(None),
            }
        }

        let mut entries = self.entries.write().await;
        if entries
            .get(key)
            .is_some_and(|entry| entry.expires_at <= Instant::now())
        {
            entries.remove(key);
        }

        Ok(None)
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> AppResult<()> {
        if ttl.is_zero() {
            return Ok(());
        }

        let now = Instant::now();
        let expires_at = now.checked_add(ttl).unwrap_or(now);

        self.entries
            .write()
            .await
            .insert(key.to_owned(), PolicyCacheEntry { value, expires_at });

        Ok(())
    }

    async fn invalidate_pattern(&self, pattern: &Regex) -> AppResult<u64> {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|key, _| !pattern.is_match(key));
        Ok(u64::try_from(before - entries.len()).unwrap_or(u64::MAX))
    }
}
