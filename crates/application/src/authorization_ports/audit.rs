use async_trait::async_trait;
use gatehouse_core::{AppResult, TenantId};
use gatehouse_domain::{AuditEntry, OperationName};

/// Filter for audit queries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditLogQuery {
    /// Maximum number of entries to return.
    pub limit: usize,
    /// Restricts entries to one operation.
    pub operation: Option<OperationName>,
}

/// Append-only audit persistence port.
#[async_trait]
pub trait AuditLog: Send + Sync {
    /// Appends one entry.
    async fn append_entry(&self, entry: AuditEntry) -> AppResult<()>;

    /// Lists tenant entries, newest first.
    async fn list_entries(
        &self,
        tenant_id: TenantId,
        query: AuditLogQuery,
    ) -> AppResult<Vec<AuditEntry>>;
}
