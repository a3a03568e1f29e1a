use axum::Json;
use axum::extract::{Path, State};
use gatehouse_application::OperationPolicyView;
use gatehouse_core::ActorId;
use gatehouse_domain::OperationPermissionConfig;

use crate::dto::{ActorRequest, RemovalResponse, SetOperationConfigRequest};
use crate::error::ApiResult;
use crate::state::AppState;

use super::{operation_path, tenant_path};

pub async fn describe_operation_handler(
    State(state): State<AppState>,
    Path((tenant_id, operation)): Path<(String, String)>,
) -> ApiResult<Json<OperationPolicyView>> {
    let view = state
        .engine
        .config_mutator
        .describe_operation(tenant_path(&tenant_id)?, &operation_path(operation)?)
        .await?;

    Ok(Json(view))
}

pub async fn set_operation_config_handler(
    State(state): State<AppState>,
    Path((tenant_id, operation)): Path<(String, String)>,
    Json(payload): Json<SetOperationConfigRequest>,
) -> ApiResult<Json<OperationPermissionConfig>> {
    let tenant_id = tenant_path(&tenant_id)?;
    let operation = operation_path(operation)?;
    let (actor_id, input) = payload.into_input()?;

    let config = state
        .engine
        .config_mutator
        .set_operation_config(tenant_id, &operation, input, actor_id)
        .await?;

    Ok(Json(config))
}

pub async fn reset_operation_config_handler(
    State(state): State<AppState>,
    Path((tenant_id, operation)): Path<(String, String)>,
    Json(payload): Json<ActorRequest>,
) -> ApiResult<Json<RemovalResponse>> {
    let tenant_id = tenant_path(&tenant_id)?;
    let operation = operation_path(operation)?;
    let actor_id = ActorId::parse(&payload.actor_id)?;

    let existed = state
        .engine
        .config_mutator
        .reset_operation_config(tenant_id, &operation, actor_id)
        .await?;

    Ok(Json(RemovalResponse { existed }))
}
