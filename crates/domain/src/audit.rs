use std::str::FromStr;

use chrono::{DateTime, Utc};
use gatehouse_core::{ActorId, AppError, TenantId};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::OperationName;

/// Stable audit actions emitted by the authorization engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditAction {
    /// An operation override was created or replaced.
    Update,
    /// An operation override was removed.
    Delete,
    /// A tenant lockdown started.
    MaintenanceEnabled,
    /// A tenant lockdown ended.
    MaintenanceDisabled,
    /// An actor was exempted from an active lockdown.
    MaintenanceAllowlistUpdated,
    /// A permission check denied an actor.
    PermissionDenied,
}

impl AuditAction {
    /// Returns a stable storage value for this action.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Update => "UPDATE",
            Self::Delete => "DELETE",
            Self::MaintenanceEnabled => "MAINTENANCE_ENABLED",
            Self::MaintenanceDisabled => "MAINTENANCE_DISABLED",
            Self::MaintenanceAllowlistUpdated => "MAINTENANCE_ALLOWLIST_UPDATED",
            Self::PermissionDenied => "PERMISSION_DENIED",
        }
    }
}

impl FromStr for AuditAction {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "UPDATE" => Ok(Self::Update),
            "DELETE" => Ok(Self::Delete),
            "MAINTENANCE_ENABLED" => Ok(Self::MaintenanceEnabled),
            "MAINTENANCE_DISABLED" => Ok(Self::MaintenanceDisabled),
            "MAINTENANCE_ALLOWLIST_UPDATED" => Ok(Self::MaintenanceAllowlistUpdated),
            "PERMISSION_DENIED" => Ok(Self::PermissionDenied),
            _ => Err(AppError::Validation(format!(
                "unknown audit action '{value}'"
            ))),
        }
    }
}

/// Audit payload before the recorder assigns identity and time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAuditEntry {
    /// Tenant scope.
    pub tenant_id: TenantId,
    /// Operation concerned, when any.
    pub operation: Option<OperationName>,
    /// Action performed.
    pub action: AuditAction,
    /// State before the action.
    pub old_value: Option<Value>,
    /// State after the action.
    pub new_value: Option<Value>,
    /// Actor responsible.
    pub actor_id: ActorId,
    /// Optional human-readable reason.
    pub reason: Option<String>,
}

impl NewAuditEntry {
    /// Starts an entry without operation, values or reason.
    #[must_use]
    pub fn new(tenant_id: TenantId, action: AuditAction, actor_id: ActorId) -> Self {
        Self {
            tenant_id,
            operation: None,
            action,
            old_value: None,
            new_value: None,
            actor_id,
            reason: None,
        }
    }

    /// Sets the operation.
    #[must_use]
    pub fn operation(mut self, operation: &OperationName) -> Self {
        self.operation = Some(operation.clone());
        self
    }

    /// Sets the before/after values.
    #[must_use]
    pub fn values(mut self, old_value: Option<Value>, new_value: Option<Value>) -> Self {
        self.old_value = old_value;
        self.new_value = new_value;
        self
    }

    /// Sets the reason.
    #[must_use]
    pub fn reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Stamps the entry with an identifier and timestamp.
    #[must_use]
    pub fn recorded(self, entry_id: Uuid, recorded_at: DateTime<Utc>) -> AuditEntry {
        AuditEntry {
            entry_id,
            tenant_id: self.tenant_id,
            operation: self.operation,
            action: self.action,
            old_value: self.old_value,
            new_value: self.new_value,
            actor_id: self.actor_id,
            reason: self.reason,
            recorded_at,
        }
    }
}

/// Append-only audit record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEntry {
    /// Stable entry identifier.
    pub entry_id: Uuid,
    /// Tenant scope.
    pub tenant_id: TenantId,
    /// Operation concerned, when any.
    pub operation: Option<OperationName>,
    /// Action performed.
    pub action: AuditAction,
    /// State before the action.
    pub old_value: Option<Value>,
    /// State after the action.
    pub new_value: Option<Value>,
    /// Actor responsible.
    pub actor_id: ActorId,
    /// Optional human-readable reason.
    pub reason: Option<String>,
    /// Time the entry was recorded.
    pub recorded_at: DateTime<Utc>,
}
