use gatehouse_application::OperationConfigInput;
use gatehouse_core::{ActorId, AppResult};
use serde::Deserialize;

/// Incoming payload for an operation override.
#[derive(Debug, Deserialize)]
pub struct SetOperationConfigRequest {
    pub actor_id: String,
    pub level: String,
    #[serde(default)]
    pub required_capabilities: Vec<String>,
    #[serde(default)]
    pub required_role_ids: Vec<String>,
    #[serde(default)]
    pub allowed_user_ids: Vec<String>,
    #[serde(default)]
    pub denied_user_ids: Vec<String>,
}

impl SetOperationConfigRequest {
    pub fn into_input(self) -> AppResult<(ActorId, OperationConfigInput)> {
        let actor_id = ActorId::parse(&self.actor_id)?;
        let input = OperationConfigInput {
            level: self.level,
            required_capabilities: self.required_capabilities,
            required_role_ids: self.required_role_ids,
            allowed_user_ids: self.allowed_user_ids,
            denied_user_ids: self.denied_user_ids,
        };

        Ok((actor_id, input))
    }
}
