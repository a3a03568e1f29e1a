use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::AppError;

/// Snowflakes are at most 20 decimal digits (`u64::MAX`).
const MAX_SNOWFLAKE_DIGITS: usize = 20;

macro_rules! snowflake_id {
    ($(#[$meta:meta])* $name:ident, $label:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(u64);

        impl $name {
            /// Creates an identifier from a raw snowflake value.
            #[must_use]
            pub const fn new(value: u64) -> Self {
                Self(value)
            }

            /// Parses a decimal snowflake string.
            pub fn parse(value: &str) -> Result<Self, AppError> {
                parse_snowflake(value)
                    .map(Self)
                    .ok_or_else(|| AppError::Validation(format!("invalid {} '{value}'", $label)))
            }

            /// Returns the raw snowflake value.
            #[must_use]
            pub const fn get(self) -> u64 {
                self.0
            }
        }

        impl Display for $name {
            fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
                write!(formatter, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = AppError;

            fn from_str(value: &str) -> Result<Self, Self::Err> {
                Self::parse(value)
            }
        }

        impl TryFrom<String> for $name {
            type Error = AppError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::parse(value.as_str())
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.to_string()
            }
        }
    };
}

snowflake_id!(
    /// Tenant identifier: the Discord guild that owns every configuration row.
    TenantId,
    "tenant id"
);

snowflake_id!(
    /// Identity of the user attempting an operation.
    ActorId,
    "actor id"
);

snowflake_id!(
    /// Platform-native role identifier managed by Discord.
    RoleId,
    "role id"
);

/// Parses a non-zero decimal snowflake without sign or whitespace.
fn parse_snowflake(value: &str) -> Option<u64> {
    if value.is_empty()
        || value.len() > MAX_SNOWFLAKE_DIGITS
        || !value.bytes().all(|byte| byte.is_ascii_digit())
    {
        return None;
    }

    value.parse::<u64>().ok().filter(|parsed| *parsed != 0)
}
