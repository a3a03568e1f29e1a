use std::collections::BTreeSet;

use async_trait::async_trait;
use gatehouse_application::RoleStore;
use gatehouse_core::{ActorId, AppError, AppResult, TenantId};
use gatehouse_domain::{CustomRole, CustomRoleId, RoleAssignment};

use super::InMemoryAuthorizationStore;

impl InMemoryAuthorizationStore {
    /// Inserts or replaces a custom role. Names are unique per tenant.
    pub async fn save_role(&self, role: CustomRole) -> AppResult<()> {
        let mut roles = self.roles.write().await;
        let duplicate = roles.values().any(|existing| {
            existing.tenant_id == role.tenant_id
                && existing.name == role.name
                && existing.role_id != role.role_id
        });
        if duplicate {
            return Err(AppError::Validation(format!(
                "custom role '{}' already exists in tenant {}",
                role.name, role.tenant_id
            )));
        }

        roles.insert(role.role_id, role);
        Ok(())
    }

    /// Assigns an existing role of the same tenant to an actor.
    pub async fn assign_role(&self, assignment: RoleAssignment) -> AppResult<()> {
        let role_tenant = self
            .roles
            .read()
            .await
            .get(&assignment.role_id)
            .map(|role| role.tenant_id);
        if role_tenant != Some(assignment.tenant_id) {
            return Err(AppError::Validation(format!(
                "custom role {} does not exist in tenant {}",
                assignment.role_id, assignment.tenant_id
            )));
        }

        self.assignments
            .write()
            .await
            .entry((assignment.tenant_id, assignment.actor_id))
            .or_default()
            .insert(assignment.role_id);
        Ok(())
    }
}

#[async_trait]
impl RoleStore for InMemoryAuthorizationStore {
    async fn assigned_role_ids(
        &self,
        tenant_id: TenantId,
        actor_id: ActorId,
    ) -> AppResult<BTreeSet<CustomRoleId>> {
        Ok(self
            .assignments
            .read()
            .await
            .get(&(tenant_id, actor_id))
            .cloned()
            .unwrap_or_default())
    }

    async fn find_roles(&self, role_ids: &BTreeSet<CustomRoleId>) -> AppResult<Vec<CustomRole>> {
        let roles = self.roles.read().await;
        Ok(role_ids
            .iter()
            .filter_map(|role_id| roles.get(role_id).cloned())
            .collect())
    }
}
