//! Redis-backed shared layer of the policy cache.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use gatehouse_application::{DistributedCache, POLICY_KEY_NAMESPACE};
use gatehouse_core::{AppError, AppResult};
use redis::AsyncCommands;
use redis::aio::ConnectionManager;
use regex::Regex;
use tokio::sync::OnceCell;
use tracing::{debug, info};

const SCAN_BATCH_SIZE: usize = 500;

/// Redis implementation of the distributed policy cache port.
///
/// Clones share one reconnecting connection, opened on first use so that
/// startup does not depend on Redis being reachable.
#[derive(Clone)]
pub struct RedisPolicyCache {
    client: redis::Client,
    shared_connection: Arc<OnceCell<ConnectionManager>>,
    key_prefix: String,
}

impl RedisPolicyCache {
    /// Creates a cache adapter with a configured Redis client and key prefix.
    #[must_use]
    pub fn new(client: redis::Client, key_prefix: impl Into<String>) -> Self {
        Self {
            client,
            shared_connection: Arc::new(OnceCell::new()),
            key_prefix: key_prefix.into(),
        }
    }

    /// Round-trips a `PING` to verify connectivity.
    pub async fn ping(&self) -> AppResult<()> {
        let mut connection = self.connection().await?;
        redis::cmd("PING")
            .query_async::<String>(&mut connection)
            .await
            .map(|_| ())
            .map_err(|error| AppError::Unavailable(format!("redis ping failed: {error}")))
    }

    fn key_for(&self, key: &str) -> String {
        format!("{}:{key}", self.key_prefix)
    }

    fn unprefixed<'a>(&self, stored_key: &'a str) -> Option<&'a str> {
        stored_key
            .strip_prefix(self.key_prefix.as_str())
            .and_then(|rest| rest.strip_prefix(':'))
    }

    fn scan_pattern(&self) -> String {
        format!("{}:{POLICY_KEY_NAMESPACE}:*", self.key_prefix)
    }

    async fn connection(&self) -> AppResult<ConnectionManager> {
        self.shared_connection
            .get_or_try_init(|| async {
                let manager = ConnectionManager::new(self.client.clone())
                    .await
                    .map_err(|error| {
                        AppError::Unavailable(format!("failed to connect to redis: {error}"))
                    })?;
                info!("redis policy cache connection established");
                Ok::<_, AppError>(manager)
            })
            .await
            .cloned()
    }
}

#[async_trait]
impl DistributedCache for RedisPolicyCache {
    async fn get(&self, key: &str) -> AppResult<Option<Vec<u8>>> {
        let mut connection = self.connection().await?;

        connection.get(self.key_for(key)).await.map_err(|error| {
            AppError::Unavailable(format!("failed to read policy cache entry: {error}"))
        })
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> AppResult<()> {
        if ttl.is_zero() {
            return Ok(());
        }

        let mut connection = self.connection().await?;

        connection
            .set_ex(self.key_for(key), value, ttl.as_secs().max(1))
            .await
            .map_err(|error| {
                AppError::Unavailable(format!("failed to write policy cache entry: {error}"))
            })
    }

    async fn invalidate_pattern(&self, pattern: &Regex) -> AppResult<u64> {
        let mut connection = self.connection().await?;
        let scan_pattern = self.scan_pattern();
        let mut cursor: u64 = 0;
        let mut removed: u64 = 0;

        loop {
            let (next_cursor, keys): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(&scan_pattern)
                .arg("COUNT")
                .arg(SCAN_BATCH_SIZE)
                .query_async(&mut connection)
                .await
                .map_err(|error| {
                    AppError::Unavailable(format!("failed to scan policy cache keys: {error}"))
                })?;

            let matching: Vec<String> = keys
                .into_iter()
                .filter(|key| self.unprefixed(key).is_some_and(|key| pattern.is_match(key)))
                .collect();
            if !matching.is_empty() {
                let deleted: u64 = connection.del(matching).await.map_err(|error| {
                    AppError::Unavailable(format!("failed to delete policy cache keys: {error}"))
                })?;
                removed += deleted;
            }

            if next_cursor == 0 {
                break;
            }
            cursor = next_cursor;
        }

        debug!(pattern = pattern.as_str(), removed, "invalidated redis policy cache keys");
        Ok(removed)
    }
}
