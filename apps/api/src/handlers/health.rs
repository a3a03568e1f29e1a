use std::future::Future;

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use gatehouse_core::AppResult;

use crate::dto::{HealthDependencyStatus, HealthResponse};
use crate::state::AppState;

pub async fn health_handler(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let postgres = dependency_status(state.postgres_store.as_ref().map(|store| store.ping())).await;
    let redis = dependency_status(state.redis_cache.as_ref().map(|cache| cache.ping())).await;

    // The engine falls back to the store when redis is down, so only postgres gates readiness.
    let ready = postgres.status != "error";
    let status = if !ready {
        "unavailable"
    } else if redis.status == "error" {
        "degraded"
    } else {
        "ok"
    };
    let http_status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        http_status,
        Json(HealthResponse {
            status,
            postgres,
            redis,
        }),
    )
}

async fn dependency_status(check: Option<impl Future<Output = AppResult<()>>>) -> HealthDependencyStatus {
    let Some(check) = check else {
        return HealthDependencyStatus {
            status: "disabled",
            detail: None,
        };
    };

    match check.await {
        Ok(()) => HealthDependencyStatus {
            status: "ok",
            detail: None,
        },
        Err(error) => HealthDependencyStatus {
            status: "error",
            detail: Some(error.to_string()),
        },
    }
}
