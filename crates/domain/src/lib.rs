//! Domain entities and invariants.

#![forbid(unsafe_code)]

mod actor;
mod audit;
mod capability;
mod decision;
mod maintenance;
mod operation;
mod policy;
mod role;

pub use actor::{ActorContext, TenantContext};
pub use audit::{AuditAction, AuditEntry, NewAuditEntry};
pub use capability::Capabilities;
pub use decision::{Bypass, Decision, DenyReason};
pub use maintenance::{
    MAINTENANCE_REASON_MAX_LENGTH, MaintenanceState, normalize_maintenance_reason,
};
pub use operation::{
    OPERATION_NAME_MAX_LENGTH, OperationCatalog, OperationCategory, OperationName,
};
pub use policy::{OperationPermissionConfig, PermissionLevel, PermissionPolicy};
pub use role::{CustomRole, CustomRoleId, PermissionGrant, RoleAssignment};
