use std::env;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use gatehouse_application::{AuthorizationSettings, DeveloperAllowlist};
use gatehouse_core::AppError;
use gatehouse_domain::OperationCatalog;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreBackend {
    Memory,
    Postgres { database_url: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PolicyCacheBackend {
    Disabled,
    Memory,
    Redis {
        redis_url: String,
        key_prefix: String,
    },
}

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub migrate_only: bool,
    pub api_host: String,
    pub api_port: u16,
    pub store_backend: StoreBackend,
    pub policy_cache_backend: PolicyCacheBackend,
    pub developer_allowlist: DeveloperAllowlist,
    pub operation_category_overrides: Option<String>,
    pub policy_cache_ttl: Duration,
    pub store_timeout: Duration,
    pub audit_timeout: Duration,
}

impl ApiConfig {
    pub fn load() -> Result<Self, AppError> {
        Self::from_lookup(|name| env::var(name).ok(), env::args().nth(1).as_deref())
    }

    fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
        command: Option<&str>,
    ) -> Result<Self, AppError> {
        let migrate_only = command == Some("migrate");

        let api_host = lookup("API_HOST").unwrap_or_else(|| "127.0.0.1".to_owned());
        let api_port = lookup("API_PORT")
            .and_then(|value| value.parse::<u16>().ok())
            .unwrap_or(3002);

        let store_backend = match lookup("STORE_BACKEND")
            .unwrap_or_else(|| "memory".to_owned())
            .as_str()
        {
            "memory" => StoreBackend::Memory,
            "postgres" => StoreBackend::Postgres {
                database_url: required_non_empty(&lookup, "DATABASE_URL")?,
            },
            other => {
                return Err(AppError::Validation(format!(
                    "STORE_BACKEND must be either 'memory' or 'postgres', got '{other}'"
                )));
            }
        };

        let policy_cache_backend = match lookup("POLICY_CACHE_BACKEND")
            .unwrap_or_else(|| "none".to_owned())
            .as_str()
        {
            "none" => PolicyCacheBackend::Disabled,
            "memory" => PolicyCacheBackend::Memory,
            "redis" => PolicyCacheBackend::Redis {
                redis_url: required_non_empty(&lookup, "REDIS_URL")?,
                key_prefix: lookup("REDIS_KEY_PREFIX")
                    .filter(|value| !value.trim().is_empty())
                    .unwrap_or_else(|| "gatehouse".to_owned()),
            },
            other => {
                return Err(AppError::Validation(format!(
                    "POLICY_CACHE_BACKEND must be one of 'none', 'memory' or 'redis', got '{other}'"
                )));
            }
        };

        if migrate_only && store_backend == StoreBackend::Memory {
            return Err(AppError::Validation(
                "migrate requires STORE_BACKEND=postgres".to_owned(),
            ));
        }

        let developer_allowlist =
            DeveloperAllowlist::from_csv(lookup("DEVELOPER_IDS").unwrap_or_default().as_str())
                .map_err(|error| AppError::Validation(format!("invalid DEVELOPER_IDS: {error}")))?;

        let operation_category_overrides =
            lookup("OPERATION_CATEGORIES").filter(|value| !value.trim().is_empty());

        Ok(Self {
            migrate_only,
            api_host,
            api_port,
            store_backend,
            policy_cache_backend,
            developer_allowlist,
            operation_category_overrides,
            policy_cache_ttl: Duration::from_secs(parse_number(
                &lookup,
                "POLICY_CACHE_TTL_SECONDS",
                300,
            )?),
            store_timeout: Duration::from_millis(parse_number(&lookup, "STORE_TIMEOUT_MS", 250)?),
            audit_timeout: Duration::from_millis(parse_number(&lookup, "AUDIT_TIMEOUT_MS", 250)?),
        })
    }

    pub fn authorization_settings(&self) -> Result<AuthorizationSettings, AppError> {
        let mut catalog = OperationCatalog::bot_defaults();
        if let Some(overrides) = &self.operation_category_overrides {
            catalog = catalog.with_overrides(overrides)?;
        }

        Ok(AuthorizationSettings {
            developer_allowlist: self.developer_allowlist.clone(),
            catalog,
            cache_ttl: self.policy_cache_ttl,
            store_timeout: self.store_timeout,
            audit_timeout: self.audit_timeout,
        })
    }

    pub fn socket_address(&self) -> Result<SocketAddr, AppError> {
        let host = IpAddr::from_str(&self.api_host).map_err(|error| {
            AppError::Internal(format!("invalid API_HOST '{}': {error}", self.api_host))
        })?;
        Ok(SocketAddr::from((host, self.api_port)))
    }
}

pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}

fn required_non_empty(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &str,
) -> Result<String, AppError> {
    let value = lookup(name).ok_or_else(|| AppError::Validation(format!("{name} is required")))?;
    if value.trim().is_empty() {
        return Err(AppError::Validation(format!("{name} must not be empty")));
    }

    Ok(value)
}

fn parse_number(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &str,
    default: u64,
) -> Result<u64, AppError> {
    match lookup(name).filter(|value| !value.trim().is_empty()) {
        Some(value) => value
            .trim()
            .parse::<u64>()
            .map_err(|error| AppError::Validation(format!("invalid {name}: {error}"))),
        None => Ok(default),
    }
}
