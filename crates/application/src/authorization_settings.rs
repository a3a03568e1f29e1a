use std::collections::BTreeSet;
use std::time::Duration;

use gatehouse_core::{ActorId, AppResult};
use gatehouse_domain::OperationCatalog;

/// Default lifetime of policy cache entries.
pub const DEFAULT_POLICY_CACHE_TTL: Duration = Duration::from_secs(300);

/// Default bound on a single store or distributed cache call.
pub const DEFAULT_STORE_TIMEOUT: Duration = Duration::from_millis(250);

/// Process-wide set of actors that bypass tenant policies.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeveloperAllowlist(BTreeSet<ActorId>);

impl DeveloperAllowlist {
    /// Creates an allowlist from actor identifiers.
    #[must_use]
    pub fn new(actor_ids: impl IntoIterator<Item = ActorId>) -> Self {
        Self(actor_ids.into_iter().collect())
    }

    /// Parses a comma-separated list of snowflakes. Blank entries are skipped.
    pub fn from_csv(value: &str) -> AppResult<Self> {
        value
            .split(',')
            .map(str::trim)
            .filter(|entry| !entry.is_empty())
            .map(ActorId::parse)
            .collect::<AppResult<BTreeSet<_>>>()
            .map(Self)
    }

    /// Returns whether the actor is a developer.
    #[must_use]
    pub fn contains(&self, actor_id: ActorId) -> bool {
        self.0.contains(&actor_id)
    }

    /// Returns the number of developers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns whether no developer is configured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Process-wide authorization settings shared by every service.
#[derive(Debug, Clone)]
pub struct AuthorizationSettings {
    /// Global developer bypass list.
    pub developer_allowlist: DeveloperAllowlist,
    /// Operation to category mapping supplying default policies.
    pub catalog: OperationCatalog,
    /// Policy cache entry lifetime. Zero disables caching.
    pub cache_ttl: Duration,
    /// Bound on each store and distributed cache call.
    pub store_timeout: Duration,
    /// Bound on each audit write or query.
    pub audit_timeout: Duration,
}

impl Default for AuthorizationSettings {
    fn default() -> Self {
        Self {
            developer_allowlist: DeveloperAllowlist::default(),
            catalog: OperationCatalog::bot_defaults(),
            cache_ttl: DEFAULT_POLICY_CACHE_TTL,
            store_timeout: DEFAULT_STORE_TIMEOUT,
            audit_timeout: DEFAULT_STORE_TIMEOUT,
        }
    }
}
