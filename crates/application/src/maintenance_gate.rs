use std::sync::Arc;
use std::time::Duration;

use gatehouse_core::{ActorId, AppError, AppResult, TenantId};
use gatehouse_domain::{
    AuditAction, MaintenanceState, NewAuditEntry, normalize_maintenance_reason,
};
use tracing::info;

use crate::audit_recorder::audit_snapshot;
use crate::bounded_call::bounded;
use crate::{AuditRecorder, Clock, MaintenanceStore, PolicyCache};

/// Tenant-wide lockdown consulted before any other permission rule.
#[derive(Clone)]
pub struct MaintenanceGate {
    store: Arc<dyn MaintenanceStore>,
    cache: Arc<PolicyCache>,
    audit_recorder: AuditRecorder,
    clock: Arc<dyn Clock>,
    store_timeout: Duration,
}

impl MaintenanceGate {
    /// Creates a maintenance gate.
    #[must_use]
    pub fn new(
        store: Arc<dyn MaintenanceStore>,
        cache: Arc<PolicyCache>,
        audit_recorder: AuditRecorder,
        clock: Arc<dyn Clock>,
        store_timeout: Duration,
    ) -> Self {
        Self {
            store,
            cache,
            audit_recorder,
            clock,
            store_timeout,
        }
    }

    /// Returns the cached maintenance state of a tenant.
    pub async fn current_state(&self, tenant_id: TenantId) -> AppResult<Option<MaintenanceState>> {
        self.cache
            .maintenance_state(tenant_id, self.store.find_state(tenant_id))
            .await
    }

    /// Returns whether the actor passes the gate.
    pub async fn admits(&self, tenant_id: TenantId, actor_id: ActorId) -> AppResult<bool> {
        Ok(self
            .current_state(tenant_id)
            .await?
            .is_none_or(|state| state.admits(actor_id)))
    }

    /// Starts a lockdown whose allowlist holds only the enabling actor.
    ///
    /// Enabling an already locked tenant replaces the previous state.
    pub async fn enable(
        &self,
        tenant_id: TenantId,
        reason: Option<&str>,
        actor_id: ActorId,
    ) -> AppResult<MaintenanceState> {
        let reason = normalize_maintenance_reason(reason)?;
        let previous = self.fresh_state(tenant_id).await?;
        let state = MaintenanceState::enabled_by(tenant_id, actor_id, reason, self.clock.now());

        bounded(
            self.store_timeout,
            "maintenance state write",
            self.store.upsert_state(&state),
        )
        .await?;
        self.cache.invalidate_tenant(tenant_id).await?;

        let mut entry = NewAuditEntry::new(tenant_id, AuditAction::MaintenanceEnabled, actor_id)
            .values(
                previous.as_ref().and_then(audit_snapshot),
                audit_snapshot(&state),
            );
        entry.reason = state.reason.clone();
        self.audit_recorder.record(entry);

        info!(tenant_id = %tenant_id, actor_id = %actor_id, "maintenance enabled");
        Ok(state)
    }

    /// Ends a lockdown and reports whether one was active.
    ///
    /// Disabling an unlocked tenant still writes an audit entry.
    pub async fn disable(&self, tenant_id: TenantId, actor_id: ActorId) -> AppResult<bool> {
        let previous = self.fresh_state(tenant_id).await?;

        let existed = bounded(
            self.store_timeout,
            "maintenance state delete",
            self.store.delete_state(tenant_id),
        )
        .await?;
        self.cache.invalidate_tenant(tenant_id).await?;

        self.audit_recorder
            .record(
                NewAuditEntry::new(tenant_id, AuditAction::MaintenanceDisabled, actor_id)
                    .values(previous.as_ref().and_then(audit_snapshot), None),
            );

        info!(tenant_id = %tenant_id, actor_id = %actor_id, existed, "maintenance disabled");
        Ok(existed)
    }

    /// Exempts another actor from an active lockdown.
    pub async fn allow_actor(
        &self,
        tenant_id: TenantId,
        target_actor_id: ActorId,
        actor_id: ActorId,
    ) -> AppResult<MaintenanceState> {
        let Some(previous) = self
            .fresh_state(tenant_id)
            .await?
            .filter(|state| state.enabled)
        else {
            return Err(AppError::Validation(format!(
                "maintenance is not enabled for tenant {tenant_id}"
            )));
        };

        let mut state = previous.clone();
        state.allowed_user_ids.insert(target_actor_id);

        bounded(
            self.store_timeout,
            "maintenance state write",
            self.store.upsert_state(&state),
        )
        .await?;
        self.cache.invalidate_tenant(tenant_id).await?;

        self.audit_recorder
            .record(
                NewAuditEntry::new(
                    tenant_id,
                    AuditAction::MaintenanceAllowlistUpdated,
                    actor_id,
                )
                .values(audit_snapshot(&previous), audit_snapshot(&state)),
            );

        info!(
            tenant_id = %tenant_id,
            actor_id = %actor_id,
            target_actor_id = %target_actor_id,
            "maintenance allowlist updated"
        );
        Ok(state)
    }

    async fn fresh_state(&self, tenant_id: TenantId) -> AppResult<Option<MaintenanceState>> {
        bounded(
            self.store_timeout,
            "maintenance state read",
            self.store.find_state(tenant_id),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use gatehouse_core::{ActorId, AppError, TenantId};
    use gatehouse_domain::AuditAction;

    use crate::test_support::Harness;

    #[tokio::test]
    async fn enabling_admits_only_the_enabling_actor() {
        let harness = Harness::new();
        let gate = &harness.engine.maintenance_gate;
        let tenant_id = TenantId::new(1);

        assert!(gate.admits(tenant_id, ActorId::new(9)).await.unwrap_or_default());
        let state = gate
            .enable(tenant_id, Some("  database upgrade "), ActorId::new(5))
            .await;
        assert!(matches!(&state, Ok(state) if state.reason.as_deref() == Some("database upgrade")));

        assert!(gate.admits(tenant_id, ActorId::new(5)).await.unwrap_or_default());
        assert!(!gate.admits(tenant_id, ActorId::new(9)).await.unwrap_or(true));
        assert!(gate.admits(TenantId::new(2), ActorId::new(9)).await.unwrap_or_default());
    }

    #[tokio::test]
    async fn allow_actor_requires_active_lockdown() {
        let harness = Harness::new();
        let gate = &harness.engine.maintenance_gate;
        let tenant_id = TenantId::new(1);

        let result = gate
            .allow_actor(tenant_id, ActorId::new(9), ActorId::new(5))
            .await;
        assert!(matches!(result, Err(AppError::Validation(_))));

        let _ = gate.enable(tenant_id, None, ActorId::new(5)).await;
        let state = gate
            .allow_actor(tenant_id, ActorId::new(9), ActorId::new(5))
            .await;
        assert!(state.is_ok_and(|state| state.allowed_user_ids.len() == 2));
        assert!(gate.admits(tenant_id, ActorId::new(9)).await.unwrap_or_default());
    }

    #[tokio::test]
    async fn disable_is_audited_even_when_nothing_was_enabled() {
        let harness = Harness::new();
        let gate = &harness.engine.maintenance_gate;

        let existed = gate.disable(TenantId::new(1), ActorId::new(5)).await;
        assert!(matches!(existed, Ok(false)));

        let entries = harness.audit_entries().await;
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].action, AuditAction::MaintenanceDisabled);
        assert!(entries[0].old_value.is_none());
    }

    #[tokio::test]
    async fn disable_reopens_a_cached_lockdown() {
        let harness = Harness::new();
        let gate = &harness.engine.maintenance_gate;
        let tenant_id = TenantId::new(1);

        let _ = gate.enable(tenant_id, None, ActorId::new(5)).await;
        assert!(!gate.admits(tenant_id, ActorId::new(9)).await.unwrap_or(true));
        harness.engine.audit_recorder.flush().await;

        let _ = gate.disable(tenant_id, ActorId::new(5)).await;
        assert!(gate.admits(tenant_id, ActorId::new(9)).await.unwrap_or_default());

        let actions: Vec<_> = harness
            .audit_entries()
            .await
            .into_iter()
            .map(|entry| entry.action)
            .collect();
        assert_eq!(
            actions,
            vec![AuditAction::MaintenanceEnabled, AuditAction::MaintenanceDisabled]
        );
    }

    #[tokio::test]
    async fn overlong_reason_is_rejected_before_any_write() {
        let harness = Harness::new();
        let reason = "x".repeat(600);

        let result = harness
            .engine
            .maintenance_gate
            .enable(TenantId::new(1), Some(reason.as_str()), ActorId::new(5))
            .await;

        assert!(matches!(result, Err(AppError::Validation(_))));
        assert!(harness.maintenance.states.lock().await.is_empty());
        assert!(harness.audit_entries().await.is_empty());
    }
}
