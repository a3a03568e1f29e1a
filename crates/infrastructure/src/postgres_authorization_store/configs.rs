use async_trait::async_trait;
use chrono::{DateTime, Utc};
use gatehouse_application::ConfigStore;
use gatehouse_core::{ActorId, AppError, AppResult, TenantId};
use gatehouse_domain::{OperationName, OperationPermissionConfig, PermissionPolicy};
use sqlx::FromRow;
use sqlx::types::Json;

use super::{PostgresAuthorizationStore, parse_stored_ids, persistence_error, stored_ids};

#[derive(Debug, FromRow)]
struct OperationConfigRow {
    tenant_id: String,
    operation: String,
    policy: Json<PermissionPolicy>,
    allowed_user_ids: Vec<String>,
    denied_user_ids: Vec<String>,
    is_configurable: bool,
    created_by: String,
    created_at: DateTime<Utc>,
    updated_by: String,
    updated_at: DateTime<Utc>,
}

impl TryFrom<OperationConfigRow> for OperationPermissionConfig {
    type Error = AppError;

    fn try_from(row: OperationConfigRow) -> Result<Self, Self::Error> {
        let corrupt = |column: &str, error: AppError| {
            AppError::Internal(format!("corrupt value in column {column}: {error}"))
        };

        Ok(Self {
            tenant_id: TenantId::parse(&row.tenant_id).map_err(|error| corrupt("tenant_id", error))?,
            operation: OperationName::new(row.operation)
                .map_err(|error| corrupt("operation", error))?,
            policy: row.policy.0,
            allowed_user_ids: parse_stored_ids("allowed_user_ids", row.allowed_user_ids, ActorId::parse)?,
            denied_user_ids: parse_stored_ids("denied_user_ids", row.denied_user_ids, ActorId::parse)?,
            is_configurable: row.is_configurable,
            created_by: ActorId::parse(&row.created_by).map_err(|error| corrupt("created_by", error))?,
            created_at: row.created_at,
            updated_by: ActorId::parse(&row.updated_by).map_err(|error| corrupt("updated_by", error))?,
            updated_at: row.updated_at,
        })
    }
}

#[async_trait]
impl ConfigStore for PostgresAuthorizationStore {
    async fn find_config(
        &self,
        tenant_id: TenantId,
        operation: &OperationName,
    ) -> AppResult<Option<OperationPermissionConfig>> {
        let row = sqlx::query_as::<_, OperationConfigRow>(
            r#"
            SELECT
                tenant_id,
                operation,
                policy,
                allowed_user_ids,
                denied_user_ids,
                is_configurable,
                created_by,
                created_at,
                updated_by,
                updated_at
            FROM operation_permission_configs
            WHERE tenant_id = $1 AND operation = $2
            "#,
        )
        .bind(tenant_id.to_string())
        .bind(operation.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| persistence_error("find operation config", error))?;

        row.map(OperationPermissionConfig::try_from).transpose()
    }

    async fn upsert_config(&self, config: &OperationPermissionConfig) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO operation_permission_configs (
                tenant_id,
                operation,
                policy,
                allowed_user_ids,
                denied_user_ids,
                is_configurable,
                created_by,
                created_at,
                updated_by,
                updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            ON CONFLICT (tenant_id, operation) DO UPDATE SET
                policy = EXCLUDED.policy,
                allowed_user_ids = EXCLUDED.allowed_user_ids,
                denied_user_ids = EXCLUDED.denied_user_ids,
                is_configurable = EXCLUDED.is_configurable,
                updated_by = EXCLUDED.updated_by,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(config.tenant_id.to_string())
        .bind(config.operation.as_str())
        .bind(Json(&config.policy))
        .bind(stored_ids(&config.allowed_user_ids))
        .bind(stored_ids(&config.denied_user_ids))
        .bind(config.is_configurable)
        .bind(config.created_by.to_string())
        .bind(config.created_at)
        .bind(config.updated_by.to_string())
        .bind(config.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|error| persistence_error("upsert operation config", error))?;

        Ok(())
    }

    async fn delete_config(
        &self,
        tenant_id: TenantId,
        operation: &OperationName,
    ) -> AppResult<bool> {
        let result = sqlx::query(
            r#"
            DELETE FROM operation_permission_configs
            WHERE tenant_id = $1 AND operation = $2
            "#,
        )
        .bind(tenant_id.to_string())
        .bind(operation.as_str())
        .execute(&self.pool)
        .await
        .map_err(|error| persistence_error("delete operation config", error))?;

        Ok(result.rows_affected() > 0)
    }
}
