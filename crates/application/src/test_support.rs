use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use std::sync::Mutex as StdMutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use gatehouse_core::{ActorId, AppError, AppResult, TenantId};
use gatehouse_domain::{
    AuditEntry, CustomRole, CustomRoleId, MaintenanceState, OperationName,
    OperationPermissionConfig, PermissionGrant, PermissionPolicy,
};
use regex::Regex;
use tokio::sync::{Mutex, oneshot};

use crate::{
    AuditLog, AuditLogQuery, AuthorizationEngine, AuthorizationPorts, AuthorizationSettings,
    Clock, ConfigStore, DistributedCache, MaintenanceStore, RoleStore,
};

pub(crate) fn operation(name: &str) -> OperationName {
    match OperationName::new(name) {
        Ok(operation) => operation,
        Err(error) => panic!("invalid operation in test: {error}"),
    }
}

pub(crate) fn grant(value: &str) -> PermissionGrant {
    match PermissionGrant::parse(value) {
        Ok(grant) => grant,
        Err(error) => panic!("invalid grant in test: {error}"),
    }
}

pub(crate) fn start_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, 1, 12, 0, 0)
        .single()
        .unwrap_or_default()
}

pub(crate) fn override_config(
    tenant_id: TenantId,
    operation: &OperationName,
    policy: PermissionPolicy,
) -> OperationPermissionConfig {
    OperationPermissionConfig {
        tenant_id,
        operation: operation.clone(),
        policy,
        allowed_user_ids: BTreeSet::new(),
        denied_user_ids: BTreeSet::new(),
        is_configurable: true,
        created_by: ActorId::new(1),
        created_at: start_time(),
        updated_by: ActorId::new(1),
        updated_at: start_time(),
    }
}

pub(crate) struct ManualClock {
    now: StdMutex<DateTime<Utc>>,
}

impl ManualClock {
    pub(crate) fn new() -> Self {
        Self {
            now: StdMutex::new(start_time()),
        }
    }

    pub(crate) fn advance(&self, by: Duration) {
        let delta = TimeDelta::from_std(by).unwrap_or_default();
        match self.now.lock() {
            Ok(mut now) => *now += delta,
            Err(poisoned) => *poisoned.into_inner() += delta,
        }
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        match self.now.lock() {
            Ok(now) => *now,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }
}

#[derive(Default)]
pub(crate) struct FakeConfigStore {
    pub(crate) configs: Mutex<HashMap<(TenantId, OperationName), OperationPermissionConfig>>,
    pub(crate) find_calls: AtomicUsize,
    pub(crate) write_calls: AtomicUsize,
    pub(crate) hang_reads: AtomicBool,
}

impl FakeConfigStore {
    pub(crate) async fn seed(&self, config: OperationPermissionConfig) {
        self.configs
            .lock()
            .await
            .insert((config.tenant_id, config.operation.clone()), config);
    }

    pub(crate) fn find_count(&self) -> usize {
        self.find_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ConfigStore for FakeConfigStore {
    async fn find_config(
        &self,
        tenant_id: TenantId,
        operation: &OperationName,
    ) -> AppResult<Option<OperationPermissionConfig>> {
        self.find_calls.fetch_add(1, Ordering::SeqCst);
        if self.hang_reads.load(Ordering::SeqCst) {
            tokio::time::sleep(Duration::from_secs(30)).await;
        }

        Ok(self
            .configs
            .lock()
            .await
            .get(&(tenant_id, operation.clone()))
            .cloned())
    }

    async fn upsert_config(&self, config: &OperationPermissionConfig) -> AppResult<()> {
        self.write_calls.fetch_add(1, Ordering::SeqCst);
        self.seed(config.clone()).await;
        Ok(())
    }

    async fn delete_config(
        &self,
        tenant_id: TenantId,
        operation: &OperationName,
    ) -> AppResult<bool> {
        self.write_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .configs
            .lock()
            .await
            .remove(&(tenant_id, operation.clone()))
            .is_some())
    }
}

#[derive(Default)]
pub(crate) struct FakeRoleStore {
    pub(crate) assignments: Mutex<HashMap<(TenantId, ActorId), BTreeSet<CustomRoleId>>>,
    pub(crate) roles: Mutex<HashMap<CustomRoleId, CustomRole>>,
    pub(crate) fail_reads: AtomicBool,
}

impl FakeRoleStore {
    pub(crate) async fn assign(
        &self,
        tenant_id: TenantId,
        actor_id: ActorId,
        name: &str,
        grants: &[&str],
    ) -> CustomRoleId {
        let role = CustomRole {
            role_id: CustomRoleId::new(),
            tenant_id,
            name: name.to_owned(),
            permissions: grants.iter().map(|value| grant(value)).collect(),
        };
        let role_id = role.role_id;
        self.roles.lock().await.insert(role_id, role);
        self.assignments
            .lock()
            .await
            .entry((tenant_id, actor_id))
            .or_default()
            .insert(role_id);
        role_id
    }
}

#[async_trait]
impl RoleStore for FakeRoleStore {
    async fn assigned_role_ids(
        &self,
        tenant_id: TenantId,
        actor_id: ActorId,
    ) -> AppResult<BTreeSet<CustomRoleId>> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(AppError::Persistence("role store offline".to_owned()));
        }

        Ok(self
            .assignments
            .lock()
            .await
            .get(&(tenant_id, actor_id))
            .cloned()
            .unwrap_or_default())
    }

    async fn find_roles(&self, role_ids: &BTreeSet<CustomRoleId>) -> AppResult<Vec<CustomRole>> {
        let roles = self.roles.lock().await;
        Ok(role_ids
            .iter()
            .filter_map(|role_id| roles.get(role_id).cloned())
            .collect())
    }
}

#[derive(Default)]
pub(crate) struct FakeMaintenanceStore {
    pub(crate) states: Mutex<HashMap<TenantId, MaintenanceState>>,
    pub(crate) find_calls: AtomicUsize,
}

#[async_trait]
impl MaintenanceStore for FakeMaintenanceStore {
    async fn find_state(&self, tenant_id: TenantId) -> AppResult<Option<MaintenanceState>> {
        self.find_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.states.lock().await.get(&tenant_id).cloned())
    }

    async fn upsert_state(&self, state: &MaintenanceState) -> AppResult<()> {
        self.states
            .lock()
            .await
            .insert(state.tenant_id, state.clone());
        Ok(())
    }

    async fn delete_state(&self, tenant_id: TenantId) -> AppResult<bool> {
        Ok(self.states.lock().await.remove(&tenant_id).is_some())
    }
}

#[derive(Default)]
pub(crate) struct FakeAuditLog {
    pub(crate) entries: Mutex<Vec<AuditEntry>>,
    pub(crate) fail_writes: AtomicBool,
    pub(crate) hang_writes: AtomicBool,
}

impl FakeAuditLog {
    pub(crate) async fn recorded(&self) -> Vec<AuditEntry> {
        self.entries.lock().await.clone()
    }
}

#[async_trait]
impl AuditLog for FakeAuditLog {
    async fn append_entry(&self, entry: AuditEntry) -> AppResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(AppError::Persistence("audit table locked".to_owned()));
        }
        if self.hang_writes.load(Ordering::SeqCst) {
            tokio::time::sleep(Duration::from_secs(30)).await;
        }

        self.entries.lock().await.push(entry);
        Ok(())
    }

    async fn list_entries(
        &self,
        tenant_id: TenantId,
        query: AuditLogQuery,
    ) -> AppResult<Vec<AuditEntry>> {
        let entries = self.entries.lock().await;
        Ok(entries
            .iter()
            .rev()
            .filter(|entry| entry.tenant_id == tenant_id)
            .filter(|entry| {
                query
                    .operation
                    .as_ref()
                    .is_none_or(|operation| entry.operation.as_ref() == Some(operation))
            })
            .take(query.limit)
            .cloned()
            .collect())
    }
}

/// Holds the next distributed write until the test releases it.
pub(crate) struct SetGate {
    started: oneshot::Sender<()>,
    release: oneshot::Receiver<()>,
}

#[derive(Default)]
pub(crate) struct FakeDistributedCache {
    pub(crate) entries: Mutex<HashMap<String, Vec<u8>>>,
    pub(crate) unavailable: AtomicBool,
    pub(crate) set_gate: Mutex<Option<SetGate>>,
}

impl FakeDistributedCache {
    /// Gates the next `set`. The first receiver fires once the write has
    /// started; sending on the returned sender lets it land.
    pub(crate) async fn gate_next_set(&self) -> (oneshot::Receiver<()>, oneshot::Sender<()>) {
        let (started, on_started) = oneshot::channel();
        let (release_write, release) = oneshot::channel();
        *self.set_gate.lock().await = Some(SetGate { started, release });
        (on_started, release_write)
    }

    fn check_available(&self) -> AppResult<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(AppError::Unavailable("cache connection refused".to_owned()));
        }
        Ok(())
    }
}

#[async_trait]
impl DistributedCache for FakeDistributedCache {
    async fn get(&self, key: &str) -> AppResult<Option<Vec<u8>>> {
        self.check_available()?;
        Ok(self.entries.lock().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: Vec<u8>, _ttl: Duration) -> AppResult<()> {
        self.check_available()?;
        let gate = self.set_gate.lock().await.take();
        if let Some(gate) = gate {
            let _ = gate.started.send(());
            let _ = gate.release.await;
        }
        self.entries.lock().await.insert(key.to_owned(), value);
        Ok(())
    }

    async fn invalidate_pattern(&self, pattern: &Regex) -> AppResult<u64> {
        self.check_available()?;
        let mut entries = self.entries.lock().await;
        let before = entries.len();
        entries.retain(|key, _| !pattern.is_match(key));
        Ok(u64::try_from(before - entries.len()).unwrap_or_default())
    }
}

/// Engine wired to in-process fakes that tests can inspect.
pub(crate) struct Harness {
    pub(crate) engine: AuthorizationEngine,
    pub(crate) clock: Arc<ManualClock>,
    pub(crate) configs: Arc<FakeConfigStore>,
    pub(crate) roles: Arc<FakeRoleStore>,
    pub(crate) maintenance: Arc<FakeMaintenanceStore>,
    pub(crate) audit: Arc<FakeAuditLog>,
    pub(crate) distributed: Arc<FakeDistributedCache>,
}

impl Harness {
    pub(crate) fn new() -> Self {
        Self::with_settings(AuthorizationSettings::default(), false)
    }

    /// Waits for pending audit appends, then returns what landed.
    pub(crate) async fn audit_entries(&self) -> Vec<AuditEntry> {
        self.engine.audit_recorder.flush().await;
        self.audit.recorded().await
    }

    pub(crate) fn with_settings(settings: AuthorizationSettings, use_distributed: bool) -> Self {
        let clock = Arc::new(ManualClock::new());
        let configs = Arc::new(FakeConfigStore::default());
        let roles = Arc::new(FakeRoleStore::default());
        let maintenance = Arc::new(FakeMaintenanceStore::default());
        let audit = Arc::new(FakeAuditLog::default());
        let distributed = Arc::new(FakeDistributedCache::default());

        let ports = AuthorizationPorts {
            config_store: configs.clone(),
            role_store: roles.clone(),
            maintenance_store: maintenance.clone(),
            audit_log: audit.clone(),
            distributed_cache: use_distributed
                .then(|| distributed.clone() as Arc<dyn DistributedCache>),
            clock: clock.clone(),
        };

        Self {
            engine: AuthorizationEngine::new(ports, settings),
            clock,
            configs,
            roles,
            maintenance,
            audit,
            distributed,
        }
    }
}
