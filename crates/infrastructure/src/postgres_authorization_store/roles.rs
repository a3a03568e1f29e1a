use std::collections::BTreeSet;

use async_trait::async_trait;
use gatehouse_application::RoleStore;
use gatehouse_core::{ActorId, AppError, AppResult, TenantId};
use gatehouse_domain::{CustomRole, CustomRoleId, PermissionGrant};
use sqlx::FromRow;
use tracing::warn;
use uuid::Uuid;

use super::{PostgresAuthorizationStore, persistence_error};

#[derive(Debug, FromRow)]
struct CustomRoleRow {
    role_id: Uuid,
    tenant_id: String,
    name: String,
    permissions: Vec<String>,
}

impl TryFrom<CustomRoleRow> for CustomRole {
    type Error = AppError;

    fn try_from(row: CustomRoleRow) -> Result<Self, Self::Error> {
        let role_id = CustomRoleId::from_uuid(row.role_id);
        let tenant_id = TenantId::parse(&row.tenant_id).map_err(|error| {
            AppError::Internal(format!("corrupt tenant id on custom role {role_id}: {error}"))
        })?;

        let permissions = row
            .permissions
            .iter()
            .filter_map(|value| match PermissionGrant::parse(value) {
                Ok(grant) => Some(grant),
                Err(error) => {
                    warn!(role_id = %role_id, error = %error, "skipping malformed permission grant");
                    None
                }
            })
            .collect();

        Ok(Self {
            role_id,
            tenant_id,
            name: row.name,
            permissions,
        })
    }
}

#[async_trait]
impl RoleStore for PostgresAuthorizationStore {
    async fn assigned_role_ids(
        &self,
        tenant_id: TenantId,
        actor_id: ActorId,
    ) -> AppResult<BTreeSet<CustomRoleId>> {
        let role_ids = sqlx::query_scalar::<_, Uuid>(
            r#"
            SELECT role_id
            FROM custom_role_assignments
            WHERE tenant_id = $1 AND actor_id = $2
            "#,
        )
        .bind(tenant_id.to_string())
        .bind(actor_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| persistence_error("list custom role assignments", error))?;

        Ok(role_ids.into_iter().map(CustomRoleId::from_uuid).collect())
    }

    async fn find_roles(&self, role_ids: &BTreeSet<CustomRoleId>) -> AppResult<Vec<CustomRole>> {
        if role_ids.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<Uuid> = role_ids.iter().map(CustomRoleId::as_uuid).collect();
        let rows = sqlx::query_as::<_, CustomRoleRow>(
            r#"
            SELECT role_id, tenant_id, name, permissions
            FROM custom_roles
            WHERE role_id = ANY($1)
            ORDER BY name
            "#,
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await
        .map_err(|error| persistence_error("load custom roles", error))?;

        rows.into_iter().map(CustomRole::try_from).collect()
    }
}
