use async_trait::async_trait;
use chrono::{DateTime, Utc};
use gatehouse_application::MaintenanceStore;
use gatehouse_core::{ActorId, AppError, AppResult, TenantId};
use gatehouse_domain::MaintenanceState;
use sqlx::FromRow;

use super::{PostgresAuthorizationStore, parse_stored_ids, persistence_error, stored_ids};

#[derive(Debug, FromRow)]
struct MaintenanceStateRow {
    tenant_id: String,
    enabled: bool,
    allowed_user_ids: Vec<String>,
    reason: Option<String>,
    enabled_by: String,
    enabled_at: DateTime<Utc>,
}

impl TryFrom<MaintenanceStateRow> for MaintenanceState {
    type Error = AppError;

    fn try_from(row: MaintenanceStateRow) -> Result<Self, Self::Error> {
        Ok(Self {
            tenant_id: TenantId::parse(&row.tenant_id).map_err(|error| {
                AppError::Internal(format!("corrupt value in column tenant_id: {error}"))
            })?,
            enabled: row.enabled,
            allowed_user_ids: parse_stored_ids(
                "allowed_user_ids",
                row.allowed_user_ids,
                ActorId::parse,
            )?,
            reason: row.reason,
            enabled_by: ActorId::parse(&row.enabled_by).map_err(|error| {
                AppError::Internal(format!("corrupt value in column enabled_by: {error}"))
            })?,
            enabled_at: row.enabled_at,
        })
    }
}

#[async_trait]
impl MaintenanceStore for PostgresAuthorizationStore {
    async fn find_state(&self, tenant_id: TenantId) -> AppResult<Option<MaintenanceState>> {
        let row = sqlx::query_as::<_, MaintenanceStateRow>(
            r#"
            SELECT tenant_id, enabled, allowed_user_ids, reason, enabled_by, enabled_at
            FROM maintenance_states
            WHERE tenant_id = $1
            "#,
        )
        .bind(tenant_id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| persistence_error("find maintenance state", error))?;

        row.map(MaintenanceState::try_from).transpose()
    }

    async fn upsert_state(&self, state: &MaintenanceState) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO maintenance_states (
                tenant_id,
                enabled,
                allowed_user_ids,
                reason,
                enabled_by,
                enabled_at
            )
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (tenant_id) DO UPDATE SET
                enabled = EXCLUDED.enabled,
                allowed_user_ids = EXCLUDED.allowed_user_ids,
                reason = EXCLUDED.reason,
                enabled_by = EXCLUDED.enabled_by,
                enabled_at = EXCLUDED.enabled_at
            "#,
        )
        .bind(state.tenant_id.to_string())
        .bind(state.enabled)
        .bind(stored_ids(&state.allowed_user_ids))
        .bind(state.reason.as_deref())
        .bind(state.enabled_by.to_string())
        .bind(state.enabled_at)
        .execute(&self.pool)
        .await
        .map_err(|error| persistence_error("upsert maintenance state", error))?;

        Ok(())
    }

    async fn delete_state(&self, tenant_id: TenantId) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM maintenance_states WHERE tenant_id = $1")
            .bind(tenant_id.to_string())
            .execute(&self.pool)
            .await
            .map_err(|error| persistence_error("delete maintenance state", error))?;

        Ok(result.rows_affected() > 0)
    }
}
