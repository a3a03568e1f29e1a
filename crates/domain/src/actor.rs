use std::collections::BTreeSet;

use gatehouse_core::{ActorId, RoleId, TenantId};
use serde::{Deserialize, Serialize};

use crate::Capabilities;

/// Actor attempting an operation, as resolved by the command dispatcher.
///
/// Capabilities and native role memberships come from the interaction
/// payload; the engine never fetches them itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActorContext {
    /// Acting user.
    pub actor_id: ActorId,
    /// Effective capability bits in the tenant.
    pub capabilities: Capabilities,
    /// Native roles held in the tenant.
    pub role_ids: BTreeSet<RoleId>,
}

impl ActorContext {
    /// Creates an actor context without native roles.
    #[must_use]
    pub fn new(actor_id: ActorId, capabilities: Capabilities) -> Self {
        Self {
            actor_id,
            capabilities,
            role_ids: BTreeSet::new(),
        }
    }

    /// Adds native role memberships.
    #[must_use]
    pub fn with_roles(mut self, role_ids: impl IntoIterator<Item = RoleId>) -> Self {
        self.role_ids.extend(role_ids);
        self
    }

    /// Returns whether the actor holds at least one of the roles.
    #[must_use]
    pub fn holds_any_role(&self, role_ids: &BTreeSet<RoleId>) -> bool {
        !self.role_ids.is_disjoint(role_ids)
    }
}

/// Tenant in which an operation is attempted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantContext {
    /// Tenant identifier.
    pub tenant_id: TenantId,
    /// Designated tenant owner.
    pub owner_id: ActorId,
}

impl TenantContext {
    /// Creates a tenant context.
    #[must_use]
    pub fn new(tenant_id: TenantId, owner_id: ActorId) -> Self {
        Self {
            tenant_id,
            owner_id,
        }
    }
}
