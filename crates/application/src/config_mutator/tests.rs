use std::sync::atomic::Ordering;
use std::time::Duration;

use gatehouse_core::{ActorId, AppError, TenantId};
use gatehouse_domain::{
    ActorContext, AuditAction, Capabilities, Decision, DenyReason, PermissionPolicy,
    TenantContext,
};

use super::OperationConfigInput;
use crate::test_support::{Harness, operation, override_config};

const ADMIN: ActorId = ActorId::new(50);

fn public_input() -> OperationConfigInput {
    OperationConfigInput {
        level: "PUBLIC".to_owned(),
        ..OperationConfigInput::default()
    }
}

#[tokio::test]
async fn set_stores_config_and_audits_update() {
    let harness = Harness::new();
    let ban = operation("ban");

    let config = harness
        .engine
        .config_mutator
        .set_operation_config(TenantId::new(1), &ban, public_input(), ADMIN)
        .await;

    assert!(matches!(&config, Ok(config) if config.policy == PermissionPolicy::Public));
    assert_eq!(harness.configs.configs.lock().await.len(), 1);

    let entries = harness.audit_entries().await;
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].action, AuditAction::Update);
    assert_eq!(entries[0].operation.as_ref(), Some(&ban));
    assert!(entries[0].old_value.is_none());
    assert!(entries[0].new_value.is_some());
}

#[tokio::test]
async fn invalid_input_touches_neither_store_nor_audit() {
    let harness = Harness::new();
    let input = OperationConfigInput {
        level: String::new(),
        denied_user_ids: vec!["nobody".to_owned()],
        ..OperationConfigInput::default()
    };

    let result = harness
        .engine
        .config_mutator
        .set_operation_config(TenantId::new(1), &operation("ban"), input, ADMIN)
        .await;

    match result {
        Err(AppError::InvalidFields(errors)) => assert_eq!(errors.len(), 2),
        other => panic!("expected invalid fields, got {other:?}"),
    }
    assert_eq!(harness.configs.write_calls.load(Ordering::SeqCst), 0);
    assert!(harness.audit_entries().await.is_empty());
}

#[tokio::test]
async fn repeated_identical_set_is_idempotent_but_audited_each_time() {
    let harness = Harness::new();
    let ban = operation("ban");
    let mutator = &harness.engine.config_mutator;

    let first = mutator
        .set_operation_config(TenantId::new(1), &ban, public_input(), ADMIN)
        .await;
    let second = mutator
        .set_operation_config(TenantId::new(1), &ban, public_input(), ADMIN)
        .await;

    assert!(matches!((first, second), (Ok(first), Ok(second)) if first == second));
    assert_eq!(harness.audit_entries().await.len(), 2);
}

#[tokio::test]
async fn update_preserves_creation_metadata() {
    let harness = Harness::new();
    let ban = operation("ban");
    let mutator = &harness.engine.config_mutator;

    let _ = mutator
        .set_operation_config(TenantId::new(1), &ban, public_input(), ADMIN)
        .await;
    harness.clock.advance(Duration::from_secs(60));
    let updated = mutator
        .set_operation_config(
            TenantId::new(1),
            &ban,
            OperationConfigInput {
                level: "ADMIN".to_owned(),
                ..OperationConfigInput::default()
            },
            ActorId::new(51),
        )
        .await;

    let Ok(updated) = updated else {
        panic!("update rejected");
    };
    assert_eq!(updated.created_by, ADMIN);
    assert_eq!(updated.updated_by, ActorId::new(51));
    assert!(updated.updated_at > updated.created_at);
}

#[tokio::test]
async fn reset_invalidates_cached_override_immediately() {
    let harness = Harness::new();
    let help = operation("help");
    let tenant = TenantContext::new(TenantId::new(1), ActorId::new(100));
    let member = ActorContext::new(ActorId::new(7), Capabilities::SEND_MESSAGES);
    let mutator = &harness.engine.config_mutator;
    let resolver = &harness.engine.resolver;

    let locked = mutator
        .set_operation_config(
            TenantId::new(1),
            &help,
            OperationConfigInput {
                level: "OWNER".to_owned(),
                ..OperationConfigInput::default()
            },
            ADMIN,
        )
        .await;
    assert!(locked.is_ok());
    assert_eq!(
        resolver.check_permission(&member, &help, &tenant).await,
        Decision::deny(DenyReason::InsufficientPermissions)
    );

    let reset = mutator
        .reset_operation_config(TenantId::new(1), &help, ADMIN)
        .await;
    assert!(matches!(reset, Ok(true)));
    assert_eq!(
        resolver.check_permission(&member, &help, &tenant).await,
        Decision::allow()
    );
}

#[tokio::test]
async fn reset_without_override_is_still_audited() {
    let harness = Harness::new();

    let reset = harness
        .engine
        .config_mutator
        .reset_operation_config(TenantId::new(1), &operation("ban"), ADMIN)
        .await;

    assert!(matches!(reset, Ok(false)));
    let entries = harness.audit_entries().await;
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].action, AuditAction::Delete);
}

#[tokio::test]
async fn developer_operations_cannot_be_configured() {
    let harness = Harness::new();

    let result = harness
        .engine
        .config_mutator
        .set_operation_config(TenantId::new(1), &operation("eval"), public_input(), ADMIN)
        .await;

    assert!(matches!(result, Err(AppError::InvalidFields(_))));
    assert_eq!(harness.configs.write_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn locked_override_rejects_changes() {
    let harness = Harness::new();
    let ban = operation("ban");
    let mut locked = override_config(TenantId::new(1), &ban, PermissionPolicy::Admin);
    locked.is_configurable = false;
    harness.configs.seed(locked).await;

    let set = harness
        .engine
        .config_mutator
        .set_operation_config(TenantId::new(1), &ban, public_input(), ADMIN)
        .await;
    let reset = harness
        .engine
        .config_mutator
        .reset_operation_config(TenantId::new(1), &ban, ADMIN)
        .await;

    assert!(matches!(set, Err(AppError::InvalidFields(_))));
    assert!(matches!(reset, Err(AppError::InvalidFields(_))));
}

#[tokio::test]
async fn describe_reports_default_and_override() {
    let harness = Harness::new();
    let kick = operation("kick");
    let mutator = &harness.engine.config_mutator;

    let before = mutator.describe_operation(TenantId::new(1), &kick).await;
    let Ok(before) = before else {
        panic!("describe failed");
    };
    assert!(before.override_config.is_none());
    assert_eq!(before.effective_policy, before.default_policy);
    assert!(before.is_configurable);

    let _ = mutator
        .set_operation_config(TenantId::new(1), &kick, public_input(), ADMIN)
        .await;
    let after = mutator.describe_operation(TenantId::new(1), &kick).await;
    assert!(matches!(after, Ok(view) if view.effective_policy == PermissionPolicy::Public));

    let eval = mutator
        .describe_operation(TenantId::new(1), &operation("eval"))
        .await;
    assert!(eval.is_ok_and(|view| !view.is_configurable));
}
