use async_trait::async_trait;
use gatehouse_application::MaintenanceStore;
use gatehouse_core::{AppResult, TenantId};
use gatehouse_domain::MaintenanceState;

use super::InMemoryAuthorizationStore;

#[async_trait]
impl MaintenanceStore for InMemoryAuthorizationStore {
    async fn find_state(&self, tenant_id: TenantId) -> AppResult<Option<MaintenanceState>> {
        Ok(self.maintenance.read().await.get(&tenant_id).cloned())
    }

    async fn upsert_state(&self, state: &MaintenanceState) -> AppResult<()> {
        self.maintenance
            .write()
            .await
            .insert(state.tenant_id, state.clone());
        Ok(())
    }

    async fn delete_state(&self, tenant_id: TenantId) -> AppResult<bool> {
        Ok(self.maintenance.write().await.remove(&tenant_id).is_some())
    }
}
