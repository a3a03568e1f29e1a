use gatehouse_core::TenantId;
use gatehouse_domain::OperationName;

use crate::error::ApiResult;

pub mod audit;
pub mod health;
pub mod maintenance;
pub mod operations;
pub mod permissions;


fn tenant_path(tenant_id: &str) -> ApiResult<TenantId> {
    Ok(TenantId::parse(tenant_id)?)
}

fn operation_path(operation: String) -> ApiResult<OperationName> {
    Ok(OperationName::new(operation)?)
}
