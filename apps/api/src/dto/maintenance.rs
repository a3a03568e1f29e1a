use gatehouse_domain::MaintenanceState;
use serde::{Deserialize, Serialize};

/// Incoming payload to lock a tenant down.
#[derive(Debug, Deserialize)]
pub struct EnableMaintenanceRequest {
    pub actor_id: String,
    #[serde(default)]
    pub reason: Option<String>,
}

/// Incoming payload to exempt an actor from an active lockdown.
#[derive(Debug, Deserialize)]
pub struct AllowMaintenanceActorRequest {
    pub actor_id: String,
    pub target_actor_id: String,
}

/// Current lockdown of a tenant.
#[derive(Debug, Serialize)]
pub struct MaintenanceStatusResponse {
    pub enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<MaintenanceState>,
}

impl From<Option<MaintenanceState>> for MaintenanceStatusResponse {
    fn from(value: Option<MaintenanceState>) -> Self {
        Self {
            enabled: value.as_ref().is_some_and(|state| state.enabled),
            state: value,
        }
    }
}
