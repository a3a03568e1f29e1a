//! Application services and ports.

#![forbid(unsafe_code)]

mod audit_recorder;
mod authorization_engine;
mod authorization_ports;
mod authorization_settings;
mod bounded_call;
mod config_mutator;
mod maintenance_gate;
mod permission_resolver;
mod policy_cache;
mod role_resolver;

#[cfg(test)]
mod test_support;

pub use audit_recorder::{AUDIT_QUERY_MAX_LIMIT, AuditRecorder};
pub use authorization_engine::{AuthorizationEngine, AuthorizationPorts};
pub use authorization_ports::{
    AuditLog, AuditLogQuery, Clock, ConfigStore, DistributedCache, MaintenanceStore, RoleStore,
    SystemClock,
};
pub use authorization_settings::{
    AuthorizationSettings, DEFAULT_POLICY_CACHE_TTL, DEFAULT_STORE_TIMEOUT, DeveloperAllowlist,
};
pub use config_mutator::{
    ConfigMutator, OPERATION_CONFIG_MAX_LIST_LENGTH, OperationConfigInput, OperationPolicyView,
};
pub use maintenance_gate::MaintenanceGate;
pub use permission_resolver::PermissionResolver;
pub use policy_cache::{POLICY_KEY_NAMESPACE, PolicyCache};
pub use role_resolver::RoleResolver;
