use std::collections::BTreeSet;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use gatehouse_core::{ActorId, AppError, RoleId, TenantId};
use serde::{Deserialize, Serialize};

use crate::{ActorContext, Capabilities, OperationName, TenantContext};

/// Coarse policy category attached to an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PermissionLevel {
    /// Global developers only.
    Developer,
    /// The tenant owner only.
    Owner,
    /// Actors holding the administrator capability.
    Admin,
    /// Actors holding a moderation capability or role.
    Moderator,
    /// Everyone.
    Public,
    /// Actors holding one of the configured roles.
    Custom,
}

impl PermissionLevel {
    /// Returns a stable storage value for this level.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Developer => "DEVELOPER",
            Self::Owner => "OWNER",
            Self::Admin => "ADMIN",
            Self::Moderator => "MODERATOR",
            Self::Public => "PUBLIC",
            Self::Custom => "CUSTOM",
        }
    }
}

impl FromStr for PermissionLevel {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_uppercase().as_str() {
            "DEVELOPER" => Ok(Self::Developer),
            "OWNER" => Ok(Self::Owner),
            "ADMIN" => Ok(Self::Admin),
            "MODERATOR" => Ok(Self::Moderator),
            "PUBLIC" => Ok(Self::Public),
            "CUSTOM" => Ok(Self::Custom),
            _ => Err(AppError::Validation(format!(
                "unknown permission level '{value}'"
            ))),
        }
    }
}

/// Level-specific policy carrying only the fields its level reads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "level", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PermissionPolicy {
    /// Allowed only for developer-allowlisted actors.
    Developer,
    /// Allowed only for the tenant owner.
    Owner,
    /// Allowed for administrators.
    Admin,
    /// Allowed for holders of any listed capability or role.
    Moderator {
        /// Capability bits, any of which qualifies.
        required_capabilities: Capabilities,
        /// Native roles, any of which qualifies.
        required_role_ids: BTreeSet<RoleId>,
    },
    /// Allowed for everyone.
    Public,
    /// Allowed for members of any listed role.
    Custom {
        /// Native roles, any of which qualifies.
        required_role_ids: BTreeSet<RoleId>,
    },
}

impl PermissionPolicy {
    /// Returns the level of this policy.
    #[must_use]
    pub fn level(&self) -> PermissionLevel {
        match self {
            Self::Developer => PermissionLevel::Developer,
            Self::Owner => PermissionLevel::Owner,
            Self::Admin => PermissionLevel::Admin,
            Self::Moderator { .. } => PermissionLevel::Moderator,
            Self::Public => PermissionLevel::Public,
            Self::Custom { .. } => PermissionLevel::Custom,
        }
    }

    /// Evaluates the level switch for one actor.
    #[must_use]
    pub fn admits(&self, actor: &ActorContext, tenant: &TenantContext, is_developer: bool) -> bool {
        match self {
            Self::Developer => is_developer,
            Self::Owner => tenant.owner_id == actor.actor_id,
            Self::Admin => actor.capabilities.is_administrator(),
            Self::Moderator {
                required_capabilities,
                required_role_ids,
            } => {
                actor.capabilities.satisfies_any(*required_capabilities)
                    || actor.holds_any_role(required_role_ids)
            }
            Self::Public => true,
            Self::Custom { required_role_ids } => actor.holds_any_role(required_role_ids),
        }
    }
}

/// Tenant override of one operation's authorization policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationPermissionConfig {
    /// Owning tenant.
    pub tenant_id: TenantId,
    /// Protected operation.
    pub operation: OperationName,
    /// Level switch and its level-specific fields.
    pub policy: PermissionPolicy,
    /// Actors always allowed unless denied.
    pub allowed_user_ids: BTreeSet<ActorId>,
    /// Actors always denied; evaluated before the allow list.
    pub denied_user_ids: BTreeSet<ActorId>,
    /// Whether tenants may change this override.
    pub is_configurable: bool,
    /// Actor that first stored the override.
    pub created_by: ActorId,
    /// First write timestamp.
    pub created_at: DateTime<Utc>,
    /// Actor of the latest write.
    pub updated_by: ActorId,
    /// Latest write timestamp.
    pub updated_at: DateTime<Utc>,
}

impl OperationPermissionConfig {
    /// Returns whether the actor is explicitly denied.
    #[must_use]
    pub fn denies(&self, actor_id: ActorId) -> bool {
        self.denied_user_ids.contains(&actor_id)
    }

    /// Returns whether the actor is explicitly allowed.
    #[must_use]
    pub fn allows(&self, actor_id: ActorId) -> bool {
        self.allowed_user_ids.contains(&actor_id)
    }
}
