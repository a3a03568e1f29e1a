use std::sync::Arc;

use crate::{
    AuditLog, AuditRecorder, AuthorizationSettings, Clock, ConfigMutator, ConfigStore,
    DistributedCache, MaintenanceGate, MaintenanceStore, PermissionResolver, PolicyCache,
    RoleResolver, RoleStore,
};

/// Adapters the engine is assembled from.
pub struct AuthorizationPorts {
    /// Operation override persistence.
    pub config_store: Arc<dyn ConfigStore>,
    /// Custom role lookups.
    pub role_store: Arc<dyn RoleStore>,
    /// Maintenance state persistence.
    pub maintenance_store: Arc<dyn MaintenanceStore>,
    /// Audit trail persistence.
    pub audit_log: Arc<dyn AuditLog>,
    /// Optional shared cache layer.
    pub distributed_cache: Option<Arc<dyn DistributedCache>>,
    /// Time source.
    pub clock: Arc<dyn Clock>,
}

/// Services sharing one policy cache and one set of settings.
#[derive(Clone)]
pub struct AuthorizationEngine {
    /// Permission decisions.
    pub resolver: PermissionResolver,
    /// Override writes.
    pub config_mutator: ConfigMutator,
    /// Tenant lockdowns.
    pub maintenance_gate: MaintenanceGate,
    /// Custom role grants.
    pub role_resolver: RoleResolver,
    /// Audit trail.
    pub audit_recorder: AuditRecorder,
    /// Shared cache, exposed for out-of-band invalidation.
    pub policy_cache: Arc<PolicyCache>,
}

impl AuthorizationEngine {
    /// Wires every service over the given ports.
    #[must_use]
    pub fn new(ports: AuthorizationPorts, settings: AuthorizationSettings) -> Self {
        let settings = Arc::new(settings);

        let mut policy_cache = PolicyCache::new(
            ports.clock.clone(),
            settings.cache_ttl,
            settings.store_timeout,
        );
        if let Some(distributed) = ports.distributed_cache {
            policy_cache = policy_cache.with_distributed(distributed);
        }
        let policy_cache = Arc::new(policy_cache);

        let audit_recorder = AuditRecorder::new(
            ports.audit_log,
            ports.clock.clone(),
            settings.audit_timeout,
        );
        let maintenance_gate = MaintenanceGate::new(
            ports.maintenance_store,
            policy_cache.clone(),
            audit_recorder.clone(),
            ports.clock.clone(),
            settings.store_timeout,
        );
        let role_resolver = RoleResolver::new(ports.role_store, policy_cache.clone());
        let resolver = PermissionResolver::new(
            settings.clone(),
            ports.config_store.clone(),
            policy_cache.clone(),
            maintenance_gate.clone(),
            role_resolver.clone(),
            audit_recorder.clone(),
        );
        let config_mutator = ConfigMutator::new(
            settings,
            ports.config_store,
            policy_cache.clone(),
            audit_recorder.clone(),
            ports.clock,
        );

        Self {
            resolver,
            config_mutator,
            maintenance_gate,
            role_resolver,
            audit_recorder,
            policy_cache,
        }
    }
}
