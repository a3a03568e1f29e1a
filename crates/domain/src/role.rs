use std::collections::BTreeSet;
use std::fmt::{Display, Formatter};

use gatehouse_core::{ActorId, AppError, TenantId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::OperationName;

const GRANT_PREFIX: &str = "operation.";
const WILDCARD_SUFFIX: &str = ".*";

/// Identifier of a tenant-defined custom role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CustomRoleId(Uuid);

impl CustomRoleId {
    /// Creates a random custom role identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates an identifier from an existing UUID value.
    #[must_use]
    pub fn from_uuid(value: Uuid) -> Self {
        Self(value)
    }

    /// Returns the underlying UUID value.
    #[must_use]
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for CustomRoleId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for CustomRoleId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// RBAC grant string held by a custom role.
///
/// Accepted forms are `operation.<name>`, `operation.*` and
/// `operation.<prefix>.*`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PermissionGrant(String);

impl PermissionGrant {
    /// Parses and validates a grant string.
    pub fn parse(value: &str) -> Result<Self, AppError> {
        let invalid = || AppError::Validation(format!("invalid permission grant '{value}'"));
        let target = value.strip_prefix(GRANT_PREFIX).ok_or_else(invalid)?;

        if target == "*" {
            return Ok(Self(value.to_owned()));
        }

        let name = target.strip_suffix(WILDCARD_SUFFIX).unwrap_or(target);
        OperationName::new(name).map_err(|_| invalid())?;

        Ok(Self(value.to_owned()))
    }

    /// Grant string matching every operation.
    #[must_use]
    pub fn all_operations() -> Self {
        Self(format!("{GRANT_PREFIX}*"))
    }

    /// Grant string matching exactly one operation.
    #[must_use]
    pub fn for_operation(operation: &OperationName) -> Self {
        Self(format!("{GRANT_PREFIX}{operation}"))
    }

    /// Returns the grant string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Returns whether this grant covers the operation.
    #[must_use]
    pub fn matches(&self, operation: &OperationName) -> bool {
        let Some(target) = self.0.strip_prefix(GRANT_PREFIX) else {
            return false;
        };

        if target == "*" {
            return true;
        }

        match target.strip_suffix(WILDCARD_SUFFIX) {
            Some(prefix) => operation
                .as_str()
                .strip_prefix(prefix)
                .is_some_and(|rest| rest.starts_with('.')),
            None => target == operation.as_str(),
        }
    }
}

impl TryFrom<String> for PermissionGrant {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value.as_str())
    }
}

impl From<PermissionGrant> for String {
    fn from(value: PermissionGrant) -> Self {
        value.0
    }
}

/// Tenant-defined role carrying RBAC grants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomRole {
    /// Stable role identifier.
    pub role_id: CustomRoleId,
    /// Owning tenant.
    pub tenant_id: TenantId,
    /// Unique role name in tenant scope.
    pub name: String,
    /// Grants attached to the role.
    pub permissions: BTreeSet<PermissionGrant>,
}

/// Assignment of a custom role to an actor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RoleAssignment {
    /// Assigned actor.
    pub actor_id: ActorId,
    /// Assigned role.
    pub role_id: CustomRoleId,
    /// Tenant scope of the assignment.
    pub tenant_id: TenantId,
}
