use axum::Router;
use axum::routing::{get, post};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

pub fn build_router(app_state: AppState) -> Router {
    let tenant_routes = Router::new()
        .route(
            "/api/tenants/{tenant_id}/permissions/check",
            post(handlers::permissions::check_permission_handler),
        )
        .route(
            "/api/tenants/{tenant_id}/actors/{actor_id}/grants",
            get(handlers::permissions::actor_grants_handler),
        )
        .route(
            "/api/tenants/{tenant_id}/operations/{operation}",
            get(handlers::operations::describe_operation_handler)
                .put(handlers::operations::set_operation_config_handler)
                .delete(handlers::operations::reset_operation_config_handler),
        )
        .route(
            "/api/tenants/{tenant_id}/maintenance",
            get(handlers::maintenance::maintenance_status_handler)
                .post(handlers::maintenance::enable_maintenance_handler)
                .delete(handlers::maintenance::disable_maintenance_handler),
        )
        .route(
            "/api/tenants/{tenant_id}/maintenance/allowlist",
            post(handlers::maintenance::allow_maintenance_actor_handler),
        )
        .route(
            "/api/tenants/{tenant_id}/audit",
            get(handlers::audit::list_audit_entries_handler),
        );

    Router::new()
        .route("/health", get(handlers::health::health_handler))
        .merge(tenant_routes)
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}
