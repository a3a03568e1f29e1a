use gatehouse_application::AuthorizationEngine;
use gatehouse_infrastructure::{PostgresAuthorizationStore, RedisPolicyCache};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub engine: AuthorizationEngine,
    pub postgres_store: Option<PostgresAuthorizationStore>,
    pub redis_cache: Option<RedisPolicyCache>,
}
