use std::future::Future;
use std::time::Duration;

use gatehouse_core::{AppError, AppResult};

/// Awaits a collaborator call, failing with `Timeout` once `limit` elapses.
pub(crate) async fn bounded<T, F>(limit: Duration, label: &'static str, call: F) -> AppResult<T>
where
    F: Future<Output = AppResult<T>>,
{
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result,
        Err(_) => Err(AppError::Timeout(format!(
            "{label} exceeded {}ms",
            limit.as_millis()
        ))),
    }
}
