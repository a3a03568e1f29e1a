//! Shared primitives for all Rust crates in Gatehouse.

#![forbid(unsafe_code)]

/// Discord snowflake identifiers shared across services.
pub mod ids;

use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use ids::{ActorId, RoleId, TenantId};

/// Result type used across Gatehouse crates.
pub type AppResult<T> = Result<T, AppError>;

/// One rejected input field with a human-readable explanation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    /// Input field name.
    pub field: String,
    /// Why the value was rejected.
    pub message: String,
}

impl FieldError {
    /// Creates a field error.
    #[must_use]
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl Display for FieldError {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}: {}", self.field, self.message)
    }
}

/// Common application error categories.
#[derive(Debug, Error)]
pub enum AppError {
    /// Invalid input or violated invariant.
    #[error("validation error: {0}")]
    Validation(String),

    /// Mutation input rejected with per-field detail.
    #[error("invalid fields: {}", format_field_errors(.0))]
    InvalidFields(Vec<FieldError>),

    /// A backing store could not serve the request.
    #[error("persistence error: {0}")]
    Persistence(String),

    /// A collaborator call exceeded its time budget.
    #[error("timeout: {0}")]
    Timeout(String),

    /// An optional dependency such as the distributed cache is unreachable.
    #[error("unavailable: {0}")]
    Unavailable(String),

    /// Internal unexpected error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Returns the field errors carried by an input rejection.
    #[must_use]
    pub fn field_errors(&self) -> &[FieldError] {
        match self {
            Self::InvalidFields(errors) => errors.as_slice(),
            _ => &[],
        }
    }
}

fn format_field_errors(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::{AppError, FieldError};

    #[test]
    fn invalid_fields_lists_every_field_in_message() {
        let error = AppError::InvalidFields(vec![
            FieldError::new("level", "must not be empty"),
            FieldError::new("allowed_user_ids[0]", "is not a valid snowflake"),
        ]);

        assert_eq!(
            error.to_string(),
            "invalid fields: level: must not be empty; allowed_user_ids[0]: is not a valid snowflake"
        );
        assert_eq!(error.field_errors().len(), 2);
    }
}
