use std::sync::Arc;

use gatehouse_application::{
    AuditLog, AuthorizationEngine, AuthorizationPorts, ConfigStore, DistributedCache,
    MaintenanceStore, RoleStore, SystemClock,
};
use gatehouse_core::AppError;
use gatehouse_infrastructure::{
    InMemoryAuthorizationStore, InMemoryPolicyCache, PostgresAuthorizationStore, RedisPolicyCache,
};
use tracing::info;

use crate::api_config::{ApiConfig, PolicyCacheBackend, StoreBackend};
use crate::state::AppState;

use super::database::connect_and_migrate;
use super::redis::build_redis_client;

pub async fn build_app_state(config: &ApiConfig) -> Result<AppState, AppError> {
    let settings = config.authorization_settings()?;

    let (distributed_cache, redis_cache) = build_distributed_cache(&config.policy_cache_backend)?;

    let (ports, postgres_store) = match &config.store_backend {
        StoreBackend::Memory => {
            info!("using in-memory authorization store");
            let store = Arc::new(InMemoryAuthorizationStore::new());
            (store_ports(store, distributed_cache), None)
        }
        StoreBackend::Postgres { database_url } => {
            let pool = connect_and_migrate(database_url).await?;
            let store = PostgresAuthorizationStore::new(pool);
            (
                store_ports(Arc::new(store.clone()), distributed_cache),
                Some(store),
            )
        }
    };

    info!(
        developers = settings.developer_allowlist.len(),
        cache_ttl_seconds = settings.cache_ttl.as_secs(),
        "authorization engine configured"
    );

    Ok(AppState {
        engine: AuthorizationEngine::new(ports, settings),
        postgres_store,
        redis_cache,
    })
}

fn build_distributed_cache(
    backend: &PolicyCacheBackend,
) -> Result<(Option<Arc<dyn DistributedCache>>, Option<RedisPolicyCache>), AppError> {
    match backend {
        PolicyCacheBackend::Disabled => Ok((None, None)),
        PolicyCacheBackend::Memory => Ok((Some(Arc::new(InMemoryPolicyCache::new())), None)),
        PolicyCacheBackend::Redis {
            redis_url,
            key_prefix,
        } => {
            let cache = RedisPolicyCache::new(build_redis_client(redis_url)?, key_prefix.clone());
            Ok((Some(Arc::new(cache.clone())), Some(cache)))
        }
    }
}

fn store_ports<S>(
    store: Arc<S>,
    distributed_cache: Option<Arc<dyn DistributedCache>>,
) -> AuthorizationPorts
where
    S: ConfigStore + RoleStore + MaintenanceStore + AuditLog + 'static,
{
    AuthorizationPorts {
        config_store: store.clone(),
        role_store: store.clone(),
        maintenance_store: store.clone(),
        audit_log: store,
        distributed_cache,
        clock: Arc::new(SystemClock),
    }
}
