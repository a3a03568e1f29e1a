use axum::Json;
use axum::extract::{Path, Query, State};
use gatehouse_application::AUDIT_QUERY_MAX_LIMIT;

use crate::dto::{AuditEntryResponse, AuditQueryParams};
use crate::error::ApiResult;
use crate::state::AppState;

use super::{operation_path, tenant_path};

const DEFAULT_AUDIT_PAGE: usize = 50;

pub async fn list_audit_entries_handler(
    State(state): State<AppState>,
    Path(tenant_id): Path<String>,
    Query(query): Query<AuditQueryParams>,
) -> ApiResult<Json<Vec<AuditEntryResponse>>> {
    let tenant_id = tenant_path(&tenant_id)?;
    let operation = query.operation.map(operation_path).transpose()?;
    let limit = query
        .limit
        .unwrap_or(DEFAULT_AUDIT_PAGE)
        .min(AUDIT_QUERY_MAX_LIMIT);

    let entries = state
        .engine
        .audit_recorder
        .query(tenant_id, limit, operation)
        .await?
        .into_iter()
        .map(AuditEntryResponse::from)
        .collect();

    Ok(Json(entries))
}
