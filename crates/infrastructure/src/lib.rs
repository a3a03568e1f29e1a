//! Infrastructure adapters.

#![forbid(unsafe_code)]

mod in_memory_authorization_store;
mod in_memory_policy_cache;
mod postgres_authorization_store;
mod redis_policy_cache;

pub use in_memory_authorization_store::InMemoryAuthorizationStore;
pub use in_memory_policy_cache::InMemoryPolicyCache;
pub use postgres_authorization_store::PostgresAuthorizationStore;
pub use redis_policy_cache::RedisPolicyCache;
