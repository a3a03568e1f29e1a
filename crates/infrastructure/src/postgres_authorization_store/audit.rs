use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use gatehouse_application::{AuditLog, AuditLogQuery};
use gatehouse_core::{ActorId, AppError, AppResult, TenantId};
use gatehouse_domain::{AuditAction, AuditEntry, OperationName};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

use super::{PostgresAuthorizationStore, persistence_error};

#[derive(Debug, FromRow)]
struct AuditEntryRow {
    entry_id: Uuid,
    tenant_id: String,
    operation: Option<String>,
    action: String,
    old_value: Option<Value>,
    new_value: Option<Value>,
    actor_id: String,
    reason: Option<String>,
    recorded_at: DateTime<Utc>,
}

impl TryFrom<AuditEntryRow> for AuditEntry {
    type Error = AppError;

    fn try_from(row: AuditEntryRow) -> Result<Self, Self::Error> {
        let entry_id = row.entry_id;
        let corrupt = |column: &str, error: AppError| {
            AppError::Internal(format!(
                "corrupt value in column {column} of audit entry {entry_id}: {error}"
            ))
        };

        Ok(Self {
            entry_id,
            tenant_id: TenantId::parse(&row.tenant_id)
                .map_err(|error| corrupt("tenant_id", error))?,
            operation: row
                .operation
                .map(OperationName::new)
                .transpose()
                .map_err(|error| corrupt("operation", error))?,
            action: AuditAction::from_str(&row.action)
                .map_err(|error| corrupt("action", error))?,
            old_value: row.old_value,
            new_value: row.new_value,
            actor_id: ActorId::parse(&row.actor_id).map_err(|error| corrupt("actor_id", error))?,
            reason: row.reason,
            recorded_at: row.recorded_at,
        })
    }
}

#[async_trait]
impl AuditLog for PostgresAuthorizationStore {
    async fn append_entry(&self, entry: AuditEntry) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO permission_audit_entries (
                entry_id,
                tenant_id,
                operation,
                action,
                old_value,
                new_value,
                actor_id,
                reason,
                recorded_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(entry.entry_id)
        .bind(entry.tenant_id.to_string())
        .bind(entry.operation.as_ref().map(OperationName::as_str))
        .bind(entry.action.as_str())
        .bind(entry.old_value)
        .bind(entry.new_value)
        .bind(entry.actor_id.to_string())
        .bind(entry.reason)
        .bind(entry.recorded_at)
        .execute(&self.pool)
        .await
        .map_err(|error| persistence_error("append audit entry", error))?;

        Ok(())
    }

    async fn list_entries(
        &self,
        tenant_id: TenantId,
        query: AuditLogQuery,
    ) -> AppResult<Vec<AuditEntry>> {
        let limit = i64::try_from(query.limit).unwrap_or(i64::MAX);
        let rows = sqlx::query_as::<_, AuditEntryRow>(
            r#"
            SELECT
                entry_id,
                tenant_id,
                operation,
                action,
                old_value,
                new_value,
                actor_id,
                reason,
                recorded_at
            FROM permission_audit_entries
            WHERE tenant_id = $1
                AND ($2::TEXT IS NULL OR operation = $2)
            ORDER BY recorded_at DESC, entry_id DESC
            LIMIT $3
            "#,
        )
        .bind(tenant_id.to_string())
        .bind(query.operation.as_ref().map(OperationName::as_str))
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|error| persistence_error("list audit entries", error))?;

        rows.into_iter().map(AuditEntry::try_from).collect()
    }
}
