use axum::Json;
use axum::extract::{Path, State};
use gatehouse_core::ActorId;
use gatehouse_domain::MaintenanceState;

use crate::dto::{
    ActorRequest, AllowMaintenanceActorRequest, EnableMaintenanceRequest,
    MaintenanceStatusResponse, RemovalResponse,
};
use crate::error::ApiResult;
use crate::state::AppState;

use super::tenant_path;

pub async fn maintenance_status_handler(
    State(state): State<AppState>,
    Path(tenant_id): Path<String>,
) -> ApiResult<Json<MaintenanceStatusResponse>> {
    let current = state
        .engine
        .maintenance_gate
        .current_state(tenant_path(&tenant_id)?)
        .await?;

    Ok(Json(MaintenanceStatusResponse::from(current)))
}

pub async fn enable_maintenance_handler(
    State(state): State<AppState>,
    Path(tenant_id): Path<String>,
    Json(payload): Json<EnableMaintenanceRequest>,
) -> ApiResult<Json<MaintenanceState>> {
    let tenant_id = tenant_path(&tenant_id)?;
    let actor_id = ActorId::parse(&payload.actor_id)?;

    let enabled = state
        .engine
        .maintenance_gate
        .enable(tenant_id, payload.reason.as_deref(), actor_id)
        .await?;

    Ok(Json(enabled))
}

pub async fn disable_maintenance_handler(
    State(state): State<AppState>,
    Path(tenant_id): Path<String>,
    Json(payload): Json<ActorRequest>,
) -> ApiResult<Json<RemovalResponse>> {
    let tenant_id = tenant_path(&tenant_id)?;
    let actor_id = ActorId::parse(&payload.actor_id)?;

    let existed = state
        .engine
        .maintenance_gate
        .disable(tenant_id, actor_id)
        .await?;

    Ok(Json(RemovalResponse { existed }))
}

pub async fn allow_maintenance_actor_handler(
    State(state): State<AppState>,
    Path(tenant_id): Path<String>,
    Json(payload): Json<AllowMaintenanceActorRequest>,
) -> ApiResult<Json<MaintenanceState>> {
    let tenant_id = tenant_path(&tenant_id)?;
    let actor_id = ActorId::parse(&payload.actor_id)?;
    let target_actor_id = ActorId::parse(&payload.target_actor_id)?;

    let updated = state
        .engine
        .maintenance_gate
        .allow_actor(tenant_id, target_actor_id, actor_id)
        .await?;

    Ok(Json(updated))
}
