use chrono::{DateTime, Utc};
use gatehouse_domain::AuditEntry;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Query string of the audit listing.
#[derive(Debug, Default, Deserialize)]
pub struct AuditQueryParams {
    pub limit: Option<usize>,
    pub operation: Option<String>,
}

/// API representation of an audit entry.
#[derive(Debug, Serialize)]
pub struct AuditEntryResponse {
    pub entry_id: Uuid,
    pub tenant_id: String,
    pub operation: Option<String>,
    pub action: &'static str,
    pub old_value: Option<Value>,
    pub new_value: Option<Value>,
    pub actor_id: String,
    pub reason: Option<String>,
    pub recorded_at: DateTime<Utc>,
}

impl From<AuditEntry> for AuditEntryResponse {
    fn from(value: AuditEntry) -> Self {
        Self {
            entry_id: value.entry_id,
            tenant_id: value.tenant_id.to_string(),
            operation: value.operation.map(|operation| operation.as_str().to_owned()),
            action: value.action.as_str(),
            old_value: value.old_value,
            new_value: value.new_value,
            actor_id: value.actor_id.to_string(),
            reason: value.reason,
            recorded_at: value.recorded_at,
        }
    }
}
