use serde::{Deserialize, Serialize};

mod audit;
mod maintenance;
mod operations;
mod permissions;

pub use audit::{AuditEntryResponse, AuditQueryParams};
pub use maintenance::{AllowMaintenanceActorRequest, EnableMaintenanceRequest, MaintenanceStatusResponse};
pub use operations::SetOperationConfigRequest;
pub use permissions::{ActorGrantsResponse, CheckPermissionRequest, PermissionDecisionResponse};

/// Health response payload.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub postgres: HealthDependencyStatus,
    pub redis: HealthDependencyStatus,
}

/// Reachability of one backing dependency.
#[derive(Debug, Serialize)]
pub struct HealthDependencyStatus {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// Payload of mutations that only carry the acting actor.
#[derive(Debug, Deserialize)]
pub struct ActorRequest {
    pub actor_id: String,
}

/// Result of a removal that is idempotent.
#[derive(Debug, Serialize)]
pub struct RemovalResponse {
    pub existed: bool,
}
