use std::collections::BTreeSet;
use std::str::FromStr;

use gatehouse_core::{ActorId, AppError, AppResult, FieldError, RoleId};
use gatehouse_domain::{Capabilities, PermissionLevel, PermissionPolicy};

/// Maximum entries accepted in any list of an override.
pub const OPERATION_CONFIG_MAX_LIST_LENGTH: usize = 100;

/// Untrusted override payload as received from an administrator.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OperationConfigInput {
    /// Permission level name such as `MODERATOR`.
    pub level: String,
    /// Capability names used by `MODERATOR`.
    pub required_capabilities: Vec<String>,
    /// Native role snowflakes used by `MODERATOR` and `CUSTOM`.
    pub required_role_ids: Vec<String>,
    /// Actor snowflakes always allowed unless denied.
    pub allowed_user_ids: Vec<String>,
    /// Actor snowflakes always denied.
    pub denied_user_ids: Vec<String>,
}

pub(crate) struct ValidatedOperationConfig {
    pub(crate) policy: PermissionPolicy,
    pub(crate) allowed_user_ids: BTreeSet<ActorId>,
    pub(crate) denied_user_ids: BTreeSet<ActorId>,
}

impl OperationConfigInput {
    /// Checks every field and reports all problems at once.
    pub(crate) fn validate(&self) -> AppResult<ValidatedOperationConfig> {
        let mut errors = Vec::new();

        let level = if self.level.trim().is_empty() {
            errors.push(FieldError::new("level", "must not be empty"));
            None
        } else {
            match PermissionLevel::from_str(&self.level) {
                Ok(level) => Some(level),
                Err(_) => {
                    errors.push(FieldError::new(
                        "level",
                        format!("unknown permission level '{}'", self.level),
                    ));
                    None
                }
            }
        };

        let capabilities = parse_list(
            "required_capabilities",
            &self.required_capabilities,
            &mut errors,
            |value| Capabilities::from_transport(value).ok(),
            "is not a known capability",
        )
        .into_iter()
        .fold(Capabilities::empty(), |all, capability| all | capability);
        let role_ids: BTreeSet<RoleId> = parse_list(
            "required_role_ids",
            &self.required_role_ids,
            &mut errors,
            |value| RoleId::parse(value).ok(),
            "is not a valid snowflake",
        )
        .into_iter()
        .collect();
        let allowed_user_ids: BTreeSet<ActorId> = parse_list(
            "allowed_user_ids",
            &self.allowed_user_ids,
            &mut errors,
            |value| ActorId::parse(value).ok(),
            "is not a valid snowflake",
        )
        .into_iter()
        .collect();
        let denied_user_ids: BTreeSet<ActorId> = parse_list(
            "denied_user_ids",
            &self.denied_user_ids,
            &mut errors,
            |value| ActorId::parse(value).ok(),
            "is not a valid snowflake",
        )
        .into_iter()
        .collect();

        let policy = level.and_then(|level| {
            build_policy(
                level,
                capabilities,
                role_ids,
                !self.required_capabilities.is_empty(),
                !self.required_role_ids.is_empty(),
                &mut errors,
            )
        });

        match policy {
            Some(policy) if errors.is_empty() => Ok(ValidatedOperationConfig {
                policy,
                allowed_user_ids,
                denied_user_ids,
            }),
            _ => Err(AppError::InvalidFields(errors)),
        }
    }
}

fn parse_list<T>(
    field: &str,
    values: &[String],
    errors: &mut Vec<FieldError>,
    parse: impl Fn(&str) -> Option<T>,
    problem: &str,
) -> Vec<T> {
    if values.len() > OPERATION_CONFIG_MAX_LIST_LENGTH {
        errors.push(FieldError::new(
            field,
            format!("must contain at most {OPERATION_CONFIG_MAX_LIST_LENGTH} entries"),
        ));
        return Vec::new();
    }

    let mut parsed = Vec::with_capacity(values.len());
    for (index, value) in values.iter().enumerate() {
        match parse(value.trim()) {
            Some(item) => parsed.push(item),
            None => errors.push(FieldError::new(
                format!("{field}[{index}]"),
                format!("'{value}' {problem}"),
            )),
        }
    }

    parsed
}

fn build_policy(
    level: PermissionLevel,
    capabilities: Capabilities,
    role_ids: BTreeSet<RoleId>,
    has_capabilities: bool,
    has_role_ids: bool,
    errors: &mut Vec<FieldError>,
) -> Option<PermissionPolicy> {
    let unused = |field: &str| {
        FieldError::new(field, format!("is not used by level {}", level.as_str()))
    };

    let uses_capabilities = matches!(level, PermissionLevel::Moderator);
    let uses_role_ids = matches!(level, PermissionLevel::Moderator | PermissionLevel::Custom);
    if has_capabilities && !uses_capabilities {
        errors.push(unused("required_capabilities"));
    }
    if has_role_ids && !uses_role_ids {
        errors.push(unused("required_role_ids"));
    }

    match level {
        PermissionLevel::Developer => Some(PermissionPolicy::Developer),
        PermissionLevel::Owner => Some(PermissionPolicy::Owner),
        PermissionLevel::Admin => Some(PermissionPolicy::Admin),
        PermissionLevel::Public => Some(PermissionPolicy::Public),
        PermissionLevel::Moderator => {
            if !has_capabilities && !has_role_ids {
                errors.push(FieldError::new(
                    "required_capabilities",
                    "MODERATOR requires at least one capability or role",
                ));
                return None;
            }
            Some(PermissionPolicy::Moderator {
                required_capabilities: capabilities,
                required_role_ids: role_ids,
            })
        }
        PermissionLevel::Custom => {
            if !has_role_ids {
                errors.push(FieldError::new(
                    "required_role_ids",
                    "must not be empty for level CUSTOM",
                ));
                return None;
            }
            Some(PermissionPolicy::Custom {
                required_role_ids: role_ids,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use gatehouse_core::AppError;
    use gatehouse_domain::{Capabilities, PermissionPolicy};

    use super::OperationConfigInput;

    fn input(level: &str) -> OperationConfigInput {
        OperationConfigInput {
            level: level.to_owned(),
            ..OperationConfigInput::default()
        }
    }

    fn invalid_fields(input: &OperationConfigInput) -> Vec<String> {
        match input.validate() {
            Err(AppError::InvalidFields(errors)) => {
                errors.into_iter().map(|error| error.field).collect()
            }
            Err(error) => panic!("unexpected error: {error}"),
            Ok(_) => panic!("input unexpectedly valid"),
        }
    }

    #[test]
    fn moderator_input_builds_tagged_policy() {
        let validated = OperationConfigInput {
            required_capabilities: vec!["BAN_MEMBERS".to_owned(), "KICK_MEMBERS".to_owned()],
            required_role_ids: vec!["123".to_owned()],
            allowed_user_ids: vec!["5".to_owned(), "5".to_owned()],
            ..input("moderator")
        }
        .validate();

        let Ok(validated) = validated else {
            panic!("moderator input rejected");
        };
        assert!(matches!(
            validated.policy,
            PermissionPolicy::Moderator { required_capabilities, ref required_role_ids }
                if required_capabilities == Capabilities::BAN_MEMBERS | Capabilities::KICK_MEMBERS
                    && required_role_ids.len() == 1
        ));
        assert_eq!(validated.allowed_user_ids.len(), 1);
    }

    #[test]
    fn every_bad_field_is_reported() {
        let fields = invalid_fields(&OperationConfigInput {
            required_capabilities: vec!["FLY".to_owned()],
            allowed_user_ids: vec!["alice".to_owned()],
            denied_user_ids: vec!["7".to_owned(), "-1".to_owned()],
            ..input("ADMIN")
        });

        assert_eq!(
            fields,
            vec![
                "required_capabilities[0]".to_owned(),
                "allowed_user_ids[0]".to_owned(),
                "denied_user_ids[1]".to_owned(),
                "required_capabilities".to_owned(),
            ]
        );
    }

    #[test]
    fn empty_or_unknown_level_is_rejected() {
        assert_eq!(invalid_fields(&input("  ")), vec!["level".to_owned()]);
        assert_eq!(invalid_fields(&input("root")), vec!["level".to_owned()]);
    }

    #[test]
    fn custom_level_requires_roles() {
        assert_eq!(
            invalid_fields(&input("CUSTOM")),
            vec!["required_role_ids".to_owned()]
        );
    }

    #[test]
    fn oversized_lists_are_rejected() {
        let fields = invalid_fields(&OperationConfigInput {
            denied_user_ids: (1..=101).map(|id| id.to_string()).collect(),
            ..input("PUBLIC")
        });
        assert_eq!(fields, vec!["denied_user_ids".to_owned()]);
    }
}
