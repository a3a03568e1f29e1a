use serde::{Deserialize, Serialize};

/// Why a permission check denied an actor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DenyReason {
    /// The tenant is locked down and the actor is not exempt.
    Maintenance,
    /// The actor is on the operation's deny list.
    ExplicitDeny,
    /// No rule granted access.
    InsufficientPermissions,
    /// A collaborator failed or timed out before a decision was reached.
    CheckFailed,
}

impl DenyReason {
    /// Returns the human-readable reason shown to the actor.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Maintenance => "tenant in maintenance",
            Self::ExplicitDeny => "explicit deny",
            Self::InsufficientPermissions => "insufficient permissions",
            Self::CheckFailed => "permission check failed",
        }
    }
}

/// Rule that allowed an actor ahead of the regular policy chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Bypass {
    /// Process-wide developer allowlist.
    Developer,
    /// Operation allow list.
    ExplicitAllow,
}

impl Bypass {
    /// Returns a stable label for this bypass.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Developer => "developer",
            Self::ExplicitAllow => "explicit-allow",
        }
    }
}

/// Outcome of one permission check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decision {
    /// Whether the operation may proceed.
    pub allowed: bool,
    /// Reason for a deny.
    pub reason: Option<DenyReason>,
    /// Bypass that produced an allow, when any.
    pub bypassed_by: Option<Bypass>,
}

impl Decision {
    /// Allows through the regular policy chain.
    #[must_use]
    pub fn allow() -> Self {
        Self {
            allowed: true,
            reason: None,
            bypassed_by: None,
        }
    }

    /// Allows through a bypass.
    #[must_use]
    pub fn bypass(bypass: Bypass) -> Self {
        Self {
            allowed: true,
            reason: None,
            bypassed_by: Some(bypass),
        }
    }

    /// Denies for a reason.
    #[must_use]
    pub fn deny(reason: DenyReason) -> Self {
        Self {
            allowed: false,
            reason: Some(reason),
            bypassed_by: None,
        }
    }
}
