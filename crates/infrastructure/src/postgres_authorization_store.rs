//! PostgreSQL adapters for every authorization persistence port.

mod audit;
mod configs;
mod maintenance;
mod roles;


use std::collections::BTreeSet;

use gatehouse_core::{AppError, AppResult};
use sqlx::PgPool;

/// PostgreSQL-backed authorization store.
#[derive(Clone)]
pub struct PostgresAuthorizationStore {
    pool: PgPool,
}

impl PostgresAuthorizationStore {
    /// Creates a store with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Runs a trivial query to verify connectivity.
    pub async fn ping(&self) -> AppResult<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map(|_| ())
            .map_err(|error| persistence_error("ping database", error))
    }
}

fn persistence_error(action: &str, error: sqlx::Error) -> AppError {
    AppError::Persistence(format!("failed to {action}: {error}"))
}

fn parse_stored_ids<T: Ord>(
    column: &str,
    values: Vec<String>,
    parse: impl Fn(&str) -> AppResult<T>,
) -> AppResult<BTreeSet<T>> {
    values
        .iter()
        .map(|value| {
            parse(value).map_err(|error| {
                AppError::Internal(format!("corrupt value in column {column}: {error}"))
            })
        })
        .collect()
}

fn stored_ids<T: ToString>(values: &BTreeSet<T>) -> Vec<String> {
    values.iter().map(ToString::to_string).collect()
}
