use std::collections::BTreeSet;
use std::sync::Arc;

use gatehouse_core::{ActorId, AppResult, TenantId};
use gatehouse_domain::{OperationName, PermissionGrant};
use tracing::warn;

use crate::{PolicyCache, RoleStore};

/// Resolves RBAC grants an actor holds through tenant custom roles.
#[derive(Clone)]
pub struct RoleResolver {
    role_store: Arc<dyn RoleStore>,
    cache: Arc<PolicyCache>,
}

impl RoleResolver {
    /// Creates a role resolver.
    #[must_use]
    pub fn new(role_store: Arc<dyn RoleStore>, cache: Arc<PolicyCache>) -> Self {
        Self { role_store, cache }
    }

    /// Returns the union of grants across the actor's roles in one tenant.
    ///
    /// Roles owned by another tenant are ignored even when assigned.
    pub async fn resolve_grants(
        &self,
        tenant_id: TenantId,
        actor_id: ActorId,
    ) -> AppResult<BTreeSet<PermissionGrant>> {
        self.cache
            .role_grants(tenant_id, actor_id, self.load_grants(tenant_id, actor_id))
            .await
    }

    /// Returns whether any held grant covers the operation.
    pub async fn grants_operation(
        &self,
        tenant_id: TenantId,
        actor_id: ActorId,
        operation: &OperationName,
    ) -> AppResult<bool> {
        Ok(self
            .resolve_grants(tenant_id, actor_id)
            .await?
            .iter()
            .any(|grant| grant.matches(operation)))
    }

    /// Forgets the actor's cached grants in every process.
    ///
    /// Call after changing the actor's assignments or the grants of a role
    /// they hold; otherwise the change shows once the cache ttl runs out.
    pub async fn forget_actor(&self, tenant_id: TenantId, actor_id: ActorId) -> AppResult<()> {
        self.cache.invalidate_actor_roles(tenant_id, actor_id).await
    }

    async fn load_grants(
        &self,
        tenant_id: TenantId,
        actor_id: ActorId,
    ) -> AppResult<BTreeSet<PermissionGrant>> {
        let role_ids = self.role_store.assigned_role_ids(tenant_id, actor_id).await?;
        if role_ids.is_empty() {
            return Ok(BTreeSet::new());
        }

        let mut grants = BTreeSet::new();
        for role in self.role_store.find_roles(&role_ids).await? {
            if role.tenant_id != tenant_id {
                warn!(
                    tenant_id = %tenant_id,
                    actor_id = %actor_id,
                    role_id = %role.role_id,
                    role_tenant_id = %role.tenant_id,
                    "ignoring custom role owned by another tenant"
                );
                continue;
            }
            grants.extend(role.permissions);
        }

        Ok(grants)
    }
}

#[cfg(test)]
mod tests {
    use gatehouse_core::{ActorId, TenantId};

    use crate::test_support::{Harness, operation};

    #[tokio::test]
    async fn wildcard_and_prefix_grants_cover_operations() {
        let harness = Harness::new();
        let tenant_id = TenantId::new(1);
        harness
            .roles
            .assign(tenant_id, ActorId::new(5), "economy", &["operation.economy.*"])
            .await;
        harness
            .roles
            .assign(tenant_id, ActorId::new(6), "everything", &["operation.*"])
            .await;
        let resolver = &harness.engine.role_resolver;

        let pay = operation("economy.pay");
        assert!(resolver.grants_operation(tenant_id, ActorId::new(5), &pay).await.unwrap_or_default());
        assert!(!resolver.grants_operation(tenant_id, ActorId::new(5), &operation("ban")).await.unwrap_or(true));
        assert!(resolver.grants_operation(tenant_id, ActorId::new(6), &operation("ban")).await.unwrap_or_default());
    }

    #[tokio::test]
    async fn roles_from_another_tenant_are_ignored() {
        let harness = Harness::new();
        let foreign_role = harness
            .roles
            .assign(TenantId::new(2), ActorId::new(5), "foreign", &["operation.ban"])
            .await;
        harness
            .roles
            .assignments
            .lock()
            .await
            .entry((TenantId::new(1), ActorId::new(5)))
            .or_default()
            .insert(foreign_role);

        let grants = harness
            .engine
            .role_resolver
            .resolve_grants(TenantId::new(1), ActorId::new(5))
            .await;
        assert!(grants.is_ok_and(|grants| grants.is_empty()));
    }

    #[tokio::test]
    async fn forgetting_an_actor_picks_up_new_assignments() {
        let harness = Harness::new();
        let tenant_id = TenantId::new(1);
        let resolver = &harness.engine.role_resolver;
        let kick = operation("kick");
        harness.roles.assign(tenant_id, ActorId::new(5), "a", &["operation.ban"]).await;
        harness.roles.assign(tenant_id, ActorId::new(6), "a", &["operation.ban"]).await;
        assert!(!resolver.grants_operation(tenant_id, ActorId::new(5), &kick).await.unwrap_or(true));
        assert!(!resolver.grants_operation(tenant_id, ActorId::new(6), &kick).await.unwrap_or(true));

        harness.roles.assign(tenant_id, ActorId::new(5), "b", &["operation.kick"]).await;
        harness.roles.assign(tenant_id, ActorId::new(6), "b", &["operation.kick"]).await;
        assert!(!resolver.grants_operation(tenant_id, ActorId::new(5), &kick).await.unwrap_or(true));

        assert!(resolver.forget_actor(tenant_id, ActorId::new(5)).await.is_ok());
        assert!(resolver.grants_operation(tenant_id, ActorId::new(5), &kick).await.unwrap_or_default());
        assert!(!resolver.grants_operation(tenant_id, ActorId::new(6), &kick).await.unwrap_or(true));
    }

    #[tokio::test]
    async fn union_of_grants_spans_every_role() {
        let harness = Harness::new();
        let tenant_id = TenantId::new(1);
        harness.roles.assign(tenant_id, ActorId::new(5), "a", &["operation.ban"]).await;
        harness.roles.assign(tenant_id, ActorId::new(5), "b", &["operation.kick"]).await;

        let grants = harness
            .engine
            .role_resolver
            .resolve_grants(tenant_id, ActorId::new(5))
            .await
            .unwrap_or_default();
        assert_eq!(grants.len(), 2);
    }
}
