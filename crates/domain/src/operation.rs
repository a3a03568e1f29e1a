use std::collections::HashMap;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

use gatehouse_core::AppError;
use serde::{Deserialize, Serialize};

use crate::{Capabilities, PermissionPolicy};

/// Maximum operation name length accepted by the engine.
pub const OPERATION_NAME_MAX_LENGTH: usize = 64;

/// Name of a protected action, usually a slash command.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct OperationName(String);

impl OperationName {
    /// Validates an operation name.
    pub fn new(value: impl Into<String>) -> Result<Self, AppError> {
        let value = value.into();
        if value.is_empty() {
            return Err(AppError::Validation(
                "operation name must not be empty".to_owned(),
            ));
        }

        if value.len() > OPERATION_NAME_MAX_LENGTH {
            return Err(AppError::Validation(format!(
                "operation name must be at most {OPERATION_NAME_MAX_LENGTH} characters"
            )));
        }

        let valid = value.bytes().all(|byte| {
            byte.is_ascii_lowercase()
                || byte.is_ascii_digit()
                || byte == b'_'
                || byte == b'-'
                || byte == b'.'
        });
        if !valid {
            return Err(AppError::Validation(format!(
                "operation name '{value}' may only contain lowercase letters, digits, '_', '-' and '.'"
            )));
        }

        Ok(Self(value))
    }

    /// Returns the operation name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl Display for OperationName {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.0.as_str())
    }
}

impl TryFrom<String> for OperationName {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<OperationName> for String {
    fn from(value: OperationName) -> Self {
        value.0
    }
}

/// Static category of an operation, selecting its built-in policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationCategory {
    /// Bot maintenance commands reserved for developers.
    Developer,
    /// Tenant configuration commands.
    Administration,
    /// Member moderation commands.
    Moderation,
    /// Commands open to every member.
    General,
}

impl OperationCategory {
    /// Returns a stable storage value for this category.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Developer => "developer",
            Self::Administration => "administration",
            Self::Moderation => "moderation",
            Self::General => "general",
        }
    }

    /// Returns the policy used when a tenant stores no override.
    #[must_use]
    pub fn default_policy(&self) -> PermissionPolicy {
        match self {
            Self::Developer => PermissionPolicy::Developer,
            Self::Administration => PermissionPolicy::Admin,
            Self::Moderation => PermissionPolicy::Moderator {
                required_capabilities: Capabilities::MODERATION_DEFAULT,
                required_role_ids: Default::default(),
            },
            Self::General => PermissionPolicy::Public,
        }
    }

    /// Returns whether tenants may override the default policy.
    #[must_use]
    pub fn is_configurable(&self) -> bool {
        !matches!(self, Self::Developer)
    }
}

impl FromStr for OperationCategory {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "developer" => Ok(Self::Developer),
            "administration" => Ok(Self::Administration),
            "moderation" => Ok(Self::Moderation),
            "general" => Ok(Self::General),
            _ => Err(AppError::Validation(format!(
                "unknown operation category '{value}'"
            ))),
        }
    }
}

/// Process-wide mapping from operation names to their static category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationCatalog {
    categories: HashMap<OperationName, OperationCategory>,
    fallback: OperationCategory,
}

impl OperationCatalog {
    /// Creates an empty catalog that classifies everything as `fallback`.
    #[must_use]
    pub fn new(fallback: OperationCategory) -> Self {
        Self {
            categories: HashMap::new(),
            fallback,
        }
    }

    /// Registers the category of one operation.
    #[must_use]
    pub fn with(mut self, operation: OperationName, category: OperationCategory) -> Self {
        self.categories.insert(operation, category);
        self
    }

    /// Parses `name=category` pairs separated by commas.
    pub fn with_overrides(mut self, value: &str) -> Result<Self, AppError> {
        for pair in value.split(',').map(str::trim).filter(|pair| !pair.is_empty()) {
            let Some((name, category)) = pair.split_once('=') else {
                return Err(AppError::Validation(format!(
                    "operation category override '{pair}' must look like 'name=category'"
                )));
            };

            let operation = OperationName::new(name.trim())?;
            let category = OperationCategory::from_str(category.trim())?;
            self.categories.insert(operation, category);
        }

        Ok(self)
    }

    /// Built-in categories for the bot's command set.
    #[must_use]
    pub fn bot_defaults() -> Self {
        const ENTRIES: &[(&str, OperationCategory)] = &[
            ("eval", OperationCategory::Developer),
            ("reload", OperationCategory::Developer),
            ("shutdown", OperationCategory::Developer),
            ("blacklist", OperationCategory::Developer),
            ("config", OperationCategory::Administration),
            ("permissions", OperationCategory::Administration),
            ("maintenance", OperationCategory::Administration),
            ("setup", OperationCategory::Administration),
            ("economy.admin", OperationCategory::Administration),
            ("ban", OperationCategory::Moderation),
            ("kick", OperationCategory::Moderation),
            ("timeout", OperationCategory::Moderation),
            ("warn", OperationCategory::Moderation),
            ("purge", OperationCategory::Moderation),
            ("ticket.close", OperationCategory::Moderation),
            ("giveaway.start", OperationCategory::Moderation),
            ("help", OperationCategory::General),
            ("ping", OperationCategory::General),
            ("balance", OperationCategory::General),
            ("daily", OperationCategory::General),
            ("poll", OperationCategory::General),
            ("ticket.open", OperationCategory::General),
            ("giveaway.enter", OperationCategory::General),
        ];

        let categories = ENTRIES
            .iter()
            .filter_map(|(name, category)| {
                OperationName::new(*name)
                    .ok()
                    .map(|operation| (operation, *category))
            })
            .collect();

        Self {
            categories,
            fallback: OperationCategory::Administration,
        }
    }

    /// Returns the category of an operation, falling back for unknown names.
    #[must_use]
    pub fn category_of(&self, operation: &OperationName) -> OperationCategory {
        self.categories
            .get(operation)
            .copied()
            .unwrap_or(self.fallback)
    }

    /// Returns the built-in policy of an operation.
    #[must_use]
    pub fn default_policy(&self, operation: &OperationName) -> PermissionPolicy {
        self.category_of(operation).default_policy()
    }
}

impl Default for OperationCatalog {
    fn default() -> Self {
        Self::bot_defaults()
    }
}
