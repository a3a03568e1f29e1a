use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use gatehouse_core::{ActorId, AppError, TenantId};
use serde::{Deserialize, Serialize};

/// Maximum length of a maintenance reason.
pub const MAINTENANCE_REASON_MAX_LENGTH: usize = 512;

/// Tenant-wide lockdown state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaintenanceState {
    /// Locked tenant.
    pub tenant_id: TenantId,
    /// Whether the lockdown is active.
    pub enabled: bool,
    /// Actors exempt from the lockdown.
    pub allowed_user_ids: BTreeSet<ActorId>,
    /// Optional operator-provided reason.
    pub reason: Option<String>,
    /// Actor that enabled the lockdown.
    pub enabled_by: ActorId,
    /// Lockdown start.
    pub enabled_at: DateTime<Utc>,
}

impl MaintenanceState {
    /// Creates an active lockdown whose allowlist holds the enabling actor.
    #[must_use]
    pub fn enabled_by(
        tenant_id: TenantId,
        actor_id: ActorId,
        reason: Option<String>,
        enabled_at: DateTime<Utc>,
    ) -> Self {
        Self {
            tenant_id,
            enabled: true,
            allowed_user_ids: BTreeSet::from([actor_id]),
            reason,
            enabled_by: actor_id,
            enabled_at,
        }
    }

    /// Returns whether the actor may act while this state is in force.
    #[must_use]
    pub fn admits(&self, actor_id: ActorId) -> bool {
        !self.enabled || self.allowed_user_ids.contains(&actor_id)
    }
}

/// Normalizes an operator-provided maintenance reason.
pub fn normalize_maintenance_reason(reason: Option<&str>) -> Result<Option<String>, AppError> {
    let Some(reason) = reason.map(str::trim).filter(|reason| !reason.is_empty()) else {
        return Ok(None);
    };

    if reason.chars().count() > MAINTENANCE_REASON_MAX_LENGTH {
        return Err(AppError::Validation(format!(
            "maintenance reason must be at most {MAINTENANCE_REASON_MAX_LENGTH} characters"
        )));
    }

    Ok(Some(reason.to_owned()))
}
