use axum::Json;
use axum::extract::{Path, State};
use gatehouse_core::ActorId;

use crate::dto::{ActorGrantsResponse, CheckPermissionRequest, PermissionDecisionResponse};
use crate::error::ApiResult;
use crate::state::AppState;

use super::tenant_path;

pub async fn check_permission_handler(
    State(state): State<AppState>,
    Path(tenant_id): Path<String>,
    Json(payload): Json<CheckPermissionRequest>,
) -> ApiResult<Json<PermissionDecisionResponse>> {
    let (actor, operation, tenant) = payload.into_contexts(tenant_path(&tenant_id)?)?;

    let decision = state
        .engine
        .resolver
        .check_permission(&actor, &operation, &tenant)
        .await;

    Ok(Json(PermissionDecisionResponse::from(decision)))
}

pub async fn actor_grants_handler(
    State(state): State<AppState>,
    Path((tenant_id, actor_id)): Path<(String, String)>,
) -> ApiResult<Json<ActorGrantsResponse>> {
    let tenant_id = tenant_path(&tenant_id)?;
    let actor_id = ActorId::parse(&actor_id)?;

    let grants = state
        .engine
        .role_resolver
        .resolve_grants(tenant_id, actor_id)
        .await?;

    Ok(Json(ActorGrantsResponse::new(actor_id, &grants)))
}
