use std::collections::BTreeSet;

use async_trait::async_trait;
use gatehouse_core::{ActorId, AppResult, TenantId};
use gatehouse_domain::{
    CustomRole, CustomRoleId, MaintenanceState, OperationName, OperationPermissionConfig,
};

/// Persistence port for per-tenant operation overrides.
#[async_trait]
pub trait ConfigStore: Send + Sync {
    /// Finds the override for one operation. `None` selects the catalog default.
    async fn find_config(
        &self,
        tenant_id: TenantId,
        operation: &OperationName,
    ) -> AppResult<Option<OperationPermissionConfig>>;

    /// Inserts or replaces the override keyed by tenant and operation.
    async fn upsert_config(&self, config: &OperationPermissionConfig) -> AppResult<()>;

    /// Deletes the override and reports whether one existed.
    async fn delete_config(&self, tenant_id: TenantId, operation: &OperationName)
    -> AppResult<bool>;
}

/// Read port for tenant-defined custom roles.
#[async_trait]
pub trait RoleStore: Send + Sync {
    /// Lists custom roles assigned to an actor in one tenant.
    async fn assigned_role_ids(
        &self,
        tenant_id: TenantId,
        actor_id: ActorId,
    ) -> AppResult<BTreeSet<CustomRoleId>>;

    /// Loads role definitions by id. Unknown ids are skipped.
    async fn find_roles(&self, role_ids: &BTreeSet<CustomRoleId>) -> AppResult<Vec<CustomRole>>;
}

/// Persistence port for tenant maintenance state.
#[async_trait]
pub trait MaintenanceStore: Send + Sync {
    /// Finds the current state for a tenant.
    async fn find_state(&self, tenant_id: TenantId) -> AppResult<Option<MaintenanceState>>;

    /// Inserts or replaces the tenant state.
    async fn upsert_state(&self, state: &MaintenanceState) -> AppResult<()>;

    /// Deletes the tenant state and reports whether one existed.
    async fn delete_state(&self, tenant_id: TenantId) -> AppResult<bool>;
}
