
use std::sync::Arc;

use gatehouse_core::AppResult;
use gatehouse_domain::{
    ActorContext, AuditAction, Bypass, Decision, DenyReason, NewAuditEntry, OperationName,
    TenantContext,
};
use tracing::{debug, error};

use crate::{
    AuditRecorder, AuthorizationSettings, ConfigStore, MaintenanceGate, PolicyCache, RoleResolver,
};

/// Single decision point for command authorization.
///
/// Rules are evaluated in a fixed order: maintenance gate, developer bypass,
/// explicit deny, explicit allow, RBAC grants, then the level policy. Any
/// collaborator failure denies with [`DenyReason::CheckFailed`].
#[derive(Clone)]
pub struct PermissionResolver {
    settings: Arc<AuthorizationSettings>,
    config_store: Arc<dyn ConfigStore>,
    cache: Arc<PolicyCache>,
    maintenance_gate: MaintenanceGate,
    role_resolver: RoleResolver,
    audit_recorder: AuditRecorder,
}

impl PermissionResolver {
    /// Creates a permission resolver.
    #[must_use]
    pub fn new(
        settings: Arc<AuthorizationSettings>,
        config_store: Arc<dyn ConfigStore>,
        cache: Arc<PolicyCache>,
        maintenance_gate: MaintenanceGate,
        role_resolver: RoleResolver,
        audit_recorder: AuditRecorder,
    ) -> Self {
        Self {
            settings,
            config_store,
            cache,
            maintenance_gate,
            role_resolver,
            audit_recorder,
        }
    }

    /// Decides whether the actor may run the operation in the tenant.
    pub async fn check_permission(
        &self,
        actor: &ActorContext,
        operation: &OperationName,
        tenant: &TenantContext,
    ) -> Decision {
        match self.evaluate(actor, operation, tenant).await {
            Ok(decision) => decision,
            Err(error) => {
                error!(
                    tenant_id = %tenant.tenant_id,
                    actor_id = %actor.actor_id,
                    operation = %operation,
                    error = %error,
                    "permission check failed, denying"
                );
                Decision::deny(DenyReason::CheckFailed)
            }
        }
    }

    async fn evaluate(
        &self,
        actor: &ActorContext,
        operation: &OperationName,
        tenant: &TenantContext,
    ) -> AppResult<Decision> {
        let tenant_id = tenant.tenant_id;
        let actor_id = actor.actor_id;

        if !self.maintenance_gate.admits(tenant_id, actor_id).await? {
            debug!(tenant_id = %tenant_id, actor_id = %actor_id, "blocked by maintenance");
            return Ok(Decision::deny(DenyReason::Maintenance));
        }

        let is_developer = self.settings.developer_allowlist.contains(actor_id);
        if is_developer {
            return Ok(Decision::bypass(Bypass::Developer));
        }

        let config = self
            .cache
            .config(
                tenant_id,
                operation,
                self.config_store.find_config(tenant_id, operation),
            )
            .await?;

        if let Some(config) = &config {
            if config.denies(actor_id) {
                self.record_denial(actor, operation, tenant, DenyReason::ExplicitDeny);
                return Ok(Decision::deny(DenyReason::ExplicitDeny));
            }
            if config.allows(actor_id) {
                return Ok(Decision::bypass(Bypass::ExplicitAllow));
            }
        }

        if self
            .role_resolver
            .grants_operation(tenant_id, actor_id, operation)
            .await?
        {
            return Ok(Decision::allow());
        }

        let admitted = match &config {
            Some(config) => config.policy.admits(actor, tenant, is_developer),
            None => self
                .settings
                .catalog
                .default_policy(operation)
                .admits(actor, tenant, is_developer),
        };
        if admitted {
            return Ok(Decision::allow());
        }

        self.record_denial(actor, operation, tenant, DenyReason::InsufficientPermissions);
        Ok(Decision::deny(DenyReason::InsufficientPermissions))
    }

    fn record_denial(
        &self,
        actor: &ActorContext,
        operation: &OperationName,
        tenant: &TenantContext,
        reason: DenyReason,
    ) {
        debug!(
            tenant_id = %tenant.tenant_id,
            actor_id = %actor.actor_id,
            operation = %operation,
            reason = reason.as_str(),
            "permission denied"
        );
        self.audit_recorder
            .record(
                NewAuditEntry::new(tenant.tenant_id, AuditAction::PermissionDenied, actor.actor_id)
                    .operation(operation)
                    .reason(reason.as_str()),
            );
    }
}
