use std::collections::BTreeSet;

use gatehouse_core::{ActorId, AppError, AppResult, RoleId, TenantId};
use gatehouse_domain::{
    ActorContext, Bypass, Capabilities, Decision, DenyReason, OperationName, PermissionGrant,
    TenantContext,
};
use serde::{Deserialize, Serialize};

/// Permission check as forwarded by the command dispatcher.
#[derive(Debug, Deserialize)]
pub struct CheckPermissionRequest {
    pub operation: String,
    pub actor_id: String,
    pub owner_id: String,
    /// Capability bitfield encoded as a decimal string.
    #[serde(default)]
    pub capabilities: String,
    #[serde(default)]
    pub role_ids: Vec<String>,
}

impl CheckPermissionRequest {
    pub fn into_contexts(
        self,
        tenant_id: TenantId,
    ) -> AppResult<(ActorContext, OperationName, TenantContext)> {
        let operation = OperationName::new(self.operation)?;
        let role_ids = self
            .role_ids
            .iter()
            .map(|role_id| RoleId::parse(role_id))
            .collect::<AppResult<Vec<_>>>()?;
        let actor = ActorContext::new(
            ActorId::parse(&self.actor_id)?,
            parse_capability_bits(&self.capabilities)?,
        )
        .with_roles(role_ids);
        let tenant = TenantContext::new(tenant_id, ActorId::parse(&self.owner_id)?);

        Ok((actor, operation, tenant))
    }
}

fn parse_capability_bits(value: &str) -> AppResult<Capabilities> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(Capabilities::empty());
    }

    value
        .parse::<u64>()
        .map(Capabilities::from_bits_truncate)
        .map_err(|_| AppError::Validation(format!("invalid capabilities '{value}'")))
}

/// API representation of a permission decision.
#[derive(Debug, Serialize)]
pub struct PermissionDecisionResponse {
    pub allowed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<DenyReason>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bypassed_by: Option<Bypass>,
}

impl From<Decision> for PermissionDecisionResponse {
    fn from(value: Decision) -> Self {
        Self {
            allowed: value.allowed,
            reason: value.reason,
            message: value.reason.map(|reason| reason.as_str()),
            bypassed_by: value.bypassed_by,
        }
    }
}

/// Custom-role grants an actor holds in a tenant.
#[derive(Debug, Serialize)]
pub struct ActorGrantsResponse {
    pub actor_id: String,
    pub grants: Vec<String>,
}

impl ActorGrantsResponse {
    pub fn new(actor_id: ActorId, grants: &BTreeSet<PermissionGrant>) -> Self {
        Self {
            actor_id: actor_id.to_string(),
            grants: grants.iter().map(|grant| grant.as_str().to_owned()).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use gatehouse_core::{AppError, TenantId};
    use gatehouse_domain::Capabilities;

    use super::CheckPermissionRequest;

    fn request(capabilities: &str) -> CheckPermissionRequest {
        CheckPermissionRequest {
            operation: "ban".to_owned(),
            actor_id: "7".to_owned(),
            owner_id: "100".to_owned(),
            capabilities: capabilities.to_owned(),
            role_ids: vec!["41".to_owned()],
        }
    }

    #[test]
    fn capability_bitfield_is_read_from_decimal_string() {
        let contexts = request("6").into_contexts(TenantId::new(1));

        let Ok((actor, operation, tenant)) = contexts else {
            panic!("request should convert");
        };
        assert_eq!(
            actor.capabilities,
            Capabilities::KICK_MEMBERS | Capabilities::BAN_MEMBERS
        );
        assert_eq!(actor.role_ids.len(), 1);
        assert_eq!(operation.as_str(), "ban");
        assert_eq!(tenant.owner_id.get(), 100);
    }

    #[test]
    fn malformed_capabilities_are_rejected() {
        let contexts = request("-1").into_contexts(TenantId::new(1));
        assert!(matches!(contexts, Err(AppError::Validation(_))));
    }
}
