use gatehouse_core::{ActorId, AppError, AppResult, TenantId};
use gatehouse_domain::OperationName;
use regex::Regex;

/// Namespace shared by every policy cache key.
pub const POLICY_KEY_NAMESPACE: &str = "permissions";

pub(crate) fn config_key(tenant_id: TenantId, operation: &OperationName) -> String {
    format!("{POLICY_KEY_NAMESPACE}:config:{tenant_id}:{operation}")
}

pub(crate) fn maintenance_key(tenant_id: TenantId) -> String {
    format!("{POLICY_KEY_NAMESPACE}:maintenance:{tenant_id}")
}

pub(crate) fn roles_key(tenant_id: TenantId, actor_id: ActorId) -> String {
    format!("{POLICY_KEY_NAMESPACE}:roles:{tenant_id}:{actor_id}")
}

pub(crate) fn config_pattern(tenant_id: TenantId, operation: &OperationName) -> AppResult<Regex> {
    exact_pattern(&config_key(tenant_id, operation))
}

pub(crate) fn tenant_pattern(tenant_id: TenantId) -> AppResult<Regex> {
    anchored(&format!(
        "{POLICY_KEY_NAMESPACE}:[a-z]+:{tenant_id}(:.*)?"
    ))
}

pub(crate) fn actor_roles_pattern(tenant_id: TenantId, actor_id: ActorId) -> AppResult<Regex> {
    exact_pattern(&roles_key(tenant_id, actor_id))
}

pub(crate) fn exact_pattern(key: &str) -> AppResult<Regex> {
    anchored(&regex::escape(key))
}

fn anchored(expression: &str) -> AppResult<Regex> {
    Regex::new(&format!("^{expression}$")).map_err(|error| {
        AppError::Internal(format!("invalid policy cache key pattern: {error}"))
    })
}
