mod input;

#[cfg(test)]
mod tests;

use std::sync::Arc;

use gatehouse_core::{ActorId, AppError, AppResult, FieldError, TenantId};
use gatehouse_domain::{
    AuditAction, NewAuditEntry, OperationCategory, OperationName, OperationPermissionConfig,
    PermissionPolicy,
};
use serde::Serialize;
use tracing::info;

use crate::audit_recorder::audit_snapshot;
use crate::bounded_call::bounded;
use crate::{AuditRecorder, AuthorizationSettings, Clock, ConfigStore, PolicyCache};

pub use input::{OPERATION_CONFIG_MAX_LIST_LENGTH, OperationConfigInput};

/// Effective policy picture of one operation in one tenant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OperationPolicyView {
    /// Described operation.
    pub operation: OperationName,
    /// Static category from the catalog.
    pub category: OperationCategory,
    /// Whether tenants may override this operation.
    pub is_configurable: bool,
    /// Policy applied when no override exists.
    pub default_policy: PermissionPolicy,
    /// Stored tenant override, when any.
    pub override_config: Option<OperationPermissionConfig>,
    /// Policy the resolver currently applies.
    pub effective_policy: PermissionPolicy,
}

/// Administrative writes to per-tenant operation overrides.
#[derive(Clone)]
pub struct ConfigMutator {
    settings: Arc<AuthorizationSettings>,
    config_store: Arc<dyn ConfigStore>,
    cache: Arc<PolicyCache>,
    audit_recorder: AuditRecorder,
    clock: Arc<dyn Clock>,
}

impl ConfigMutator {
    /// Creates a config mutator.
    #[must_use]
    pub fn new(
        settings: Arc<AuthorizationSettings>,
        config_store: Arc<dyn ConfigStore>,
        cache: Arc<PolicyCache>,
        audit_recorder: AuditRecorder,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            settings,
            config_store,
            cache,
            audit_recorder,
            clock,
        }
    }

    /// Validates and stores an override, replacing any previous one.
    pub async fn set_operation_config(
        &self,
        tenant_id: TenantId,
        operation: &OperationName,
        input: OperationConfigInput,
        actor_id: ActorId,
    ) -> AppResult<OperationPermissionConfig> {
        self.require_configurable_category(operation)?;
        let validated = input.validate()?;

        let previous = self.fresh_config(tenant_id, operation).await?;
        require_configurable_override(previous.as_ref(), operation)?;

        let now = self.clock.now();
        let config = OperationPermissionConfig {
            tenant_id,
            operation: operation.clone(),
            policy: validated.policy,
            allowed_user_ids: validated.allowed_user_ids,
            denied_user_ids: validated.denied_user_ids,
            is_configurable: true,
            created_by: previous.as_ref().map_or(actor_id, |config| config.created_by),
            created_at: previous.as_ref().map_or(now, |config| config.created_at),
            updated_by: actor_id,
            updated_at: now,
        };

        bounded(
            self.settings.store_timeout,
            "operation config write",
            self.config_store.upsert_config(&config),
        )
        .await?;
        self.cache.invalidate_config(tenant_id, operation).await?;

        self.audit_recorder
            .record(
                NewAuditEntry::new(tenant_id, AuditAction::Update, actor_id)
                    .operation(operation)
                    .values(
                        previous.as_ref().and_then(audit_snapshot),
                        audit_snapshot(&config),
                    ),
            );

        info!(
            tenant_id = %tenant_id,
            actor_id = %actor_id,
            operation = %operation,
            level = config.policy.level().as_str(),
            "operation config updated"
        );
        Ok(config)
    }

    /// Removes the override so the catalog default applies again.
    ///
    /// Reports whether an override existed; the reset is audited either way.
    pub async fn reset_operation_config(
        &self,
        tenant_id: TenantId,
        operation: &OperationName,
        actor_id: ActorId,
    ) -> AppResult<bool> {
        self.require_configurable_category(operation)?;
        let previous = self.fresh_config(tenant_id, operation).await?;
        require_configurable_override(previous.as_ref(), operation)?;

        let existed = bounded(
            self.settings.store_timeout,
            "operation config delete",
            self.config_store.delete_config(tenant_id, operation),
        )
        .await?;
        self.cache.invalidate_config(tenant_id, operation).await?;

        self.audit_recorder
            .record(
                NewAuditEntry::new(tenant_id, AuditAction::Delete, actor_id)
                    .operation(operation)
                    .values(previous.as_ref().and_then(audit_snapshot), None),
            );

        info!(
            tenant_id = %tenant_id,
            actor_id = %actor_id,
            operation = %operation,
            existed,
            "operation config reset"
        );
        Ok(existed)
    }

    /// Describes the default, stored and effective policy of an operation.
    pub async fn describe_operation(
        &self,
        tenant_id: TenantId,
        operation: &OperationName,
    ) -> AppResult<OperationPolicyView> {
        let category = self.settings.catalog.category_of(operation);
        let default_policy = category.default_policy();
        let override_config = self.fresh_config(tenant_id, operation).await?;
        let effective_policy = override_config
            .as_ref()
            .map_or_else(|| default_policy.clone(), |config| config.policy.clone());

        Ok(OperationPolicyView {
            operation: operation.clone(),
            category,
            is_configurable: category.is_configurable()
                && override_config
                    .as_ref()
                    .is_none_or(|config| config.is_configurable),
            default_policy,
            override_config,
            effective_policy,
        })
    }

    fn require_configurable_category(&self, operation: &OperationName) -> AppResult<()> {
        let category = self.settings.catalog.category_of(operation);
        if category.is_configurable() {
            return Ok(());
        }

        Err(AppError::InvalidFields(vec![FieldError::new(
            "operation",
            format!(
                "operation '{operation}' in category {} is not configurable",
                category.as_str()
            ),
        )]))
    }

    async fn fresh_config(
        &self,
        tenant_id: TenantId,
        operation: &OperationName,
    ) -> AppResult<Option<OperationPermissionConfig>> {
        bounded(
            self.settings.store_timeout,
            "operation config read",
            self.config_store.find_config(tenant_id, operation),
        )
        .await
    }
}

fn require_configurable_override(
    previous: Option<&OperationPermissionConfig>,
    operation: &OperationName,
) -> AppResult<()> {
    if previous.is_none_or(|config| config.is_configurable) {
        return Ok(());
    }

    Err(AppError::InvalidFields(vec![FieldError::new(
        "operation",
        format!("operation '{operation}' is locked for this tenant"),
    )]))
}
