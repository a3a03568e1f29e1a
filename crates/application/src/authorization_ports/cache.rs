use std::time::Duration;

use async_trait::async_trait;
use gatehouse_core::AppResult;
use regex::Regex;

/// Shared cache layer visible to every process serving the same tenants.
///
/// Values are opaque bytes; the policy cache owns their encoding.
#[async_trait]
pub trait DistributedCache: Send + Sync {
    /// Returns the value stored under a key.
    async fn get(&self, key: &str) -> AppResult<Option<Vec<u8>>>;

    /// Stores a value that expires after `ttl`.
    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> AppResult<()>;

    /// Removes every key matching the pattern and returns the removed count.
    async fn invalidate_pattern(&self, pattern: &Regex) -> AppResult<u64>;
}
