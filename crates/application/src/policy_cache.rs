//! Two-layer memoization of policy lookups.
//!
//! A process-local layer is always present. When a distributed layer is
//! configured and reachable it is authoritative; the local layer then only
//! answers while the distributed layer is unavailable. A global epoch is
//! bumped on every invalidation so that fetches started before the bump do
//! not repopulate either layer with stale data. A distributed write that was
//! still in flight when the epoch moved is deleted again once it completes.

mod keys;


use std::collections::{BTreeSet, HashMap};
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use gatehouse_core::{ActorId, AppResult, TenantId};
use gatehouse_domain::{MaintenanceState, OperationName, OperationPermissionConfig, PermissionGrant};
use regex::Regex;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::sync::RwLock;
use tracing::{debug, trace, warn};

use crate::bounded_call::bounded;
use crate::{Clock, DistributedCache};

pub use keys::POLICY_KEY_NAMESPACE;

struct CacheEntry<T> {
    value: T,
    fetched_at: DateTime<Utc>,
}

struct LocalLayer<T> {
    entries: RwLock<HashMap<String, CacheEntry<T>>>,
}

impl<T: Clone> LocalLayer<T> {
    fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    async fn get(&self, key: &str, now: DateTime<Utc>, ttl: TimeDelta) -> Option<T> {
        {
            let entries = self.entries.read().await;
            match entries.get(key) {
                None => return None,
                Some(entry) if now - entry.fetched_at < ttl => return Some(entry.value.clone()),
                Some(_) => {}
            }
        }

        let mut entries = self.entries.write().await;
        if entries
            .get(key)
            .is_some_and(|entry| now - entry.fetched_at >= ttl)
        {
            entries.remove(key);
        }

        None
    }

    async fn insert_if_current(
        &self,
        key: String,
        value: T,
        fetched_at: DateTime<Utc>,
        epoch: &AtomicU64,
        observed_epoch: u64,
    ) -> bool {
        let mut entries = self.entries.write().await;
        if epoch.load(Ordering::Acquire) != observed_epoch {
            return false;
        }

        entries.insert(key, CacheEntry { value, fetched_at });
        true
    }

    async fn remove_matching(&self, pattern: &Regex) -> usize {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|key, _| !pattern.is_match(key));
        before - entries.len()
    }
}

enum DistributedRead<T> {
    Hit(T),
    Miss,
    Unavailable,
}

/// Read-through cache for operation overrides, maintenance state and
/// resolved role grants.
pub struct PolicyCache {
    configs: LocalLayer<Option<OperationPermissionConfig>>,
    maintenance: LocalLayer<Option<MaintenanceState>>,
    role_grants: LocalLayer<BTreeSet<PermissionGrant>>,
    distributed: Option<Arc<dyn DistributedCache>>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
    call_timeout: Duration,
    epoch: AtomicU64,
}

impl PolicyCache {
    /// Creates a local-only cache. A zero `ttl` disables caching.
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>, ttl: Duration, call_timeout: Duration) -> Self {
        Self {
            configs: LocalLayer::new(),
            maintenance: LocalLayer::new(),
            role_grants: LocalLayer::new(),
            distributed: None,
            clock,
            ttl,
            call_timeout,
            epoch: AtomicU64::new(0),
        }
    }

    /// Adds the shared distributed layer.
    #[must_use]
    pub fn with_distributed(mut self, distributed: Arc<dyn DistributedCache>) -> Self {
        self.distributed = Some(distributed);
        self
    }

    /// Returns the override for one operation, calling `fetch` on a miss.
    pub async fn config<F>(
        &self,
        tenant_id: TenantId,
        operation: &OperationName,
        fetch: F,
    ) -> AppResult<Option<OperationPermissionConfig>>
    where
        F: Future<Output = AppResult<Option<OperationPermissionConfig>>>,
    {
        self.read_through(&self.configs, keys::config_key(tenant_id, operation), fetch)
            .await
    }

    /// Returns the tenant maintenance state, calling `fetch` on a miss.
    pub async fn maintenance_state<F>(
        &self,
        tenant_id: TenantId,
        fetch: F,
    ) -> AppResult<Option<MaintenanceState>>
    where
        F: Future<Output = AppResult<Option<MaintenanceState>>>,
    {
        self.read_through(&self.maintenance, keys::maintenance_key(tenant_id), fetch)
            .await
    }

    /// Returns the grants an actor holds through custom roles, calling
    /// `fetch` on a miss.
    pub async fn role_grants<F>(
        &self,
        tenant_id: TenantId,
        actor_id: ActorId,
        fetch: F,
    ) -> AppResult<BTreeSet<PermissionGrant>>
    where
        F: Future<Output = AppResult<BTreeSet<PermissionGrant>>>,
    {
        self.read_through(
            &self.role_grants,
            keys::roles_key(tenant_id, actor_id),
            fetch,
        )
        .await
    }

    /// Drops the cached override for one operation from both layers.
    pub async fn invalidate_config(
        &self,
        tenant_id: TenantId,
        operation: &OperationName,
    ) -> AppResult<()> {
        self.invalidate(keys::config_pattern(tenant_id, operation)?)
            .await;
        Ok(())
    }

    /// Drops every cached entry of a tenant from both layers.
    pub async fn invalidate_tenant(&self, tenant_id: TenantId) -> AppResult<()> {
        self.invalidate(keys::tenant_pattern(tenant_id)?).await;
        Ok(())
    }

    /// Drops one actor's cached role grants from both layers.
    ///
    /// Role assignments are written outside this engine. Whatever process
    /// changes an actor's roles, or the grants of a role they hold, calls
    /// this (usually through [`crate::RoleResolver::forget_actor`]) so the
    /// change applies before the ttl runs out.
    pub async fn invalidate_actor_roles(
        &self,
        tenant_id: TenantId,
        actor_id: ActorId,
    ) -> AppResult<()> {
        self.invalidate(keys::actor_roles_pattern(tenant_id, actor_id)?)
            .await;
        Ok(())
    }

    async fn read_through<T, F>(&self, layer: &LocalLayer<T>, key: String, fetch: F) -> AppResult<T>
    where
        T: Clone + Serialize + DeserializeOwned,
        F: Future<Output = AppResult<T>>,
    {
        if self.ttl.is_zero() {
            return bounded(self.call_timeout, "policy store read", fetch).await;
        }

        let observed_epoch = self.epoch.load(Ordering::Acquire);

        let distributed_reachable = match self.read_distributed::<T>(&key).await {
            DistributedRead::Hit(value) => {
                trace!(key = %key, "policy cache hit in distributed layer");
                layer
                    .insert_if_current(
                        key,
                        value.clone(),
                        self.clock.now(),
                        &self.epoch,
                        observed_epoch,
                    )
                    .await;
                return Ok(value);
            }
            DistributedRead::Miss => true,
            DistributedRead::Unavailable => false,
        };

        if !distributed_reachable
            && let Some(value) = layer.get(&key, self.clock.now(), self.local_ttl()).await
        {
            trace!(key = %key, "policy cache hit in local layer");
            return Ok(value);
        }

        let value = bounded(self.call_timeout, "policy store read", fetch).await?;
        self.populate(layer, key, &value, observed_epoch, distributed_reachable)
            .await;

        Ok(value)
    }

    async fn read_distributed<T: DeserializeOwned>(&self, key: &str) -> DistributedRead<T> {
        let Some(distributed) = &self.distributed else {
            return DistributedRead::Unavailable;
        };

        match bounded(self.call_timeout, "distributed policy cache read", distributed.get(key))
            .await
        {
            Ok(Some(bytes)) => match serde_json::from_slice(&bytes) {
                Ok(value) => DistributedRead::Hit(value),
                Err(error) => {
                    warn!(key = %key, error = %error, "discarding undecodable policy cache entry");
                    DistributedRead::Miss
                }
            },
            Ok(None) => DistributedRead::Miss,
            Err(error) => {
                warn!(key = %key, error = %error, "distributed policy cache unavailable, using local layer");
                DistributedRead::Unavailable
            }
        }
    }

    async fn populate<T>(
        &self,
        layer: &LocalLayer<T>,
        key: String,
        value: &T,
        observed_epoch: u64,
        write_distributed: bool,
    ) where
        T: Clone + Serialize,
    {
        if write_distributed
            && let Some(distributed) = &self.distributed
            && self.epoch.load(Ordering::Acquire) == observed_epoch
        {
            match serde_json::to_vec(value) {
                Ok(bytes) => {
                    if let Err(error) = bounded(
                        self.call_timeout,
                        "distributed policy cache write",
                        distributed.set(&key, bytes, self.ttl),
                    )
                    .await
                    {
                        warn!(key = %key, error = %error, "failed to populate distributed policy cache");
                    }
                    if self.epoch.load(Ordering::Acquire) != observed_epoch {
                        self.retract_distributed(distributed.as_ref(), &key).await;
                    }
                }
                Err(error) => {
                    warn!(key = %key, error = %error, "failed to encode policy cache entry");
                }
            }
        }

        let stored = layer
            .insert_if_current(
                key,
                value.clone(),
                self.clock.now(),
                &self.epoch,
                observed_epoch,
            )
            .await;
        if !stored {
            debug!("skipped policy cache population after concurrent invalidation");
        }
    }

    /// Deletes an entry whose write raced an invalidation. The invalidation
    /// may have scanned the distributed layer before the write landed.
    async fn retract_distributed(&self, distributed: &dyn DistributedCache, key: &str) {
        let pattern = match keys::exact_pattern(key) {
            Ok(pattern) => pattern,
            Err(error) => {
                warn!(key = %key, error = %error, "cannot retract raced policy cache entry");
                return;
            }
        };

        match bounded(
            self.call_timeout,
            "distributed policy cache retraction",
            distributed.invalidate_pattern(&pattern),
        )
        .await
        {
            Ok(removed) => {
                debug!(key = %key, removed, "retracted policy cache entry written during invalidation");
            }
            Err(error) => {
                warn!(
                    key = %key,
                    error = %error,
                    "failed to retract raced policy cache entry, it expires by ttl"
                );
            }
        }
    }

    async fn invalidate(&self, pattern: Regex) {
        self.epoch.fetch_add(1, Ordering::AcqRel);

        let removed = self.configs.remove_matching(&pattern).await
            + self.maintenance.remove_matching(&pattern).await
            + self.role_grants.remove_matching(&pattern).await;
        debug!(pattern = pattern.as_str(), removed, "invalidated local policy cache entries");

        let Some(distributed) = &self.distributed else {
            return;
        };

        match bounded(
            self.call_timeout,
            "distributed policy cache invalidation",
            distributed.invalidate_pattern(&pattern),
        )
        .await
        {
            Ok(removed) => {
                debug!(pattern = pattern.as_str(), removed, "invalidated distributed policy cache entries");
            }
            Err(error) => {
                warn!(
                    pattern = pattern.as_str(),
                    error = %error,
                    "distributed policy cache invalidation failed, entries expire by ttl"
                );
            }
        }
    }

    fn local_ttl(&self) -> TimeDelta {
        TimeDelta::from_std(self.ttl).unwrap_or(TimeDelta::MAX)
    }
}
