//! In-memory adapters for every authorization persistence port.

mod audit;
mod configs;
mod maintenance;
mod roles;

#[cfg(test)]
mod tests;

use std::collections::{BTreeSet, HashMap};

use gatehouse_core::{ActorId, TenantId};
use gatehouse_domain::{
    AuditEntry, CustomRole, CustomRoleId, MaintenanceState, OperationName,
    OperationPermissionConfig,
};
use tokio::sync::RwLock;

/// Process-local store backing the `memory` backend and tests.
#[derive(Default)]
pub struct InMemoryAuthorizationStore {
    configs: RwLock<HashMap<(TenantId, OperationName), OperationPermissionConfig>>,
    roles: RwLock<HashMap<CustomRoleId, CustomRole>>,
    assignments: RwLock<HashMap<(TenantId, ActorId), BTreeSet<CustomRoleId>>>,
    maintenance: RwLock<HashMap<TenantId, MaintenanceState>>,
    audit_entries: RwLock<Vec<AuditEntry>>,
}

impl InMemoryAuthorizationStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}
