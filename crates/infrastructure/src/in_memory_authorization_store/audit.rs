use async_trait::async_trait;
use gatehouse_application::{AuditLog, AuditLogQuery};
use gatehouse_core::{AppResult, TenantId};
use gatehouse_domain::AuditEntry;

use super::InMemoryAuthorizationStore;

#[async_trait]
impl AuditLog for InMemoryAuthorizationStore {
    async fn append_entry(&self, entry: AuditEntry) -> AppResult<()> {
        self.audit_entries.write().await.push(entry);
        Ok(())
    }

    async fn list_entries(
        &self,
        tenant_id: TenantId,
        query: AuditLogQuery,
    ) -> AppResult<Vec<AuditEntry>> {
        let entries = self.audit_entries.read().await;
        let mut matching: Vec<AuditEntry> = entries
            .iter()
            .filter(|entry| entry.tenant_id == tenant_id)
            .filter(|entry| {
                query
                    .operation
                    .as_ref()
                    .is_none_or(|operation| entry.operation.as_ref() == Some(operation))
            })
            .cloned()
            .collect();

        matching.sort_by(|left, right| right.recorded_at.cmp(&left.recorded_at));
        matching.truncate(query.limit);
        Ok(matching)
    }
}
