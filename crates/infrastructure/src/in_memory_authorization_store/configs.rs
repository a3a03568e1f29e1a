use async_trait::async_trait;
use gatehouse_application::ConfigStore;
use gatehouse_core::{AppResult, TenantId};
use gatehouse_domain::{OperationName, OperationPermissionConfig};

use super::InMemoryAuthorizationStore;

#[async_trait]
impl ConfigStore for InMemoryAuthorizationStore {
    async fn find_config(
        &self,
        tenant_id: TenantId,
        operation: &OperationName,
    ) -> AppResult<Option<OperationPermissionConfig>> {
        Ok(self
            .configs
            .read()
            .await
            .get(&(tenant_id, operation.clone()))
            .cloned())
    }

    async fn upsert_config(&self, config: &OperationPermissionConfig) -> AppResult<()> {
        self.configs
            .write()
            .await
            .insert((config.tenant_id, config.operation.clone()), config.clone());
        Ok(())
    }

    async fn delete_config(
        &self,
        tenant_id: TenantId,
        operation: &OperationName,
    ) -> AppResult<bool> {
        Ok(self
            .configs
            .write()
            .await
            .remove(&(tenant_id, operation.clone()))
            .is_some())
    }
}
