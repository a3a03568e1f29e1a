use std::collections::BTreeSet;
use std::sync::Arc;

use gatehouse_application::{
    AuthorizationEngine, AuthorizationPorts, AuthorizationSettings, SystemClock,
};
use gatehouse_core::{ActorId, AppError, TenantId};
use gatehouse_domain::{
    ActorContext, Capabilities, CustomRole, CustomRoleId, Decision, OperationName,
    PermissionGrant, RoleAssignment, TenantContext,
};

use super::InMemoryAuthorizationStore;
use crate::InMemoryPolicyCache;

fn grant(value: &str) -> PermissionGrant {
    match PermissionGrant::parse(value) {
        Ok(grant) => grant,
        Err(error) => panic!("invalid grant in test: {error}"),
    }
}

fn role(tenant_id: TenantId, name: &str, grants: &[&str]) -> CustomRole {
    CustomRole {
        role_id: CustomRoleId::new(),
        tenant_id,
        name: name.to_owned(),
        permissions: grants.iter().map(|value| grant(value)).collect::<BTreeSet<_>>(),
    }
}

fn engine(store: Arc<InMemoryAuthorizationStore>) -> AuthorizationEngine {
    AuthorizationEngine::new(
        AuthorizationPorts {
            config_store: store.clone(),
            role_store: store.clone(),
            maintenance_store: store.clone(),
            audit_log: store,
            distributed_cache: Some(Arc::new(InMemoryPolicyCache::new())),
            clock: Arc::new(SystemClock),
        },
        AuthorizationSettings::default(),
    )
}

#[tokio::test]
async fn support_role_with_global_wildcard_passes_any_operation() {
    let store = Arc::new(InMemoryAuthorizationStore::new());
    let tenant_id = TenantId::new(1);
    let support = role(tenant_id, "support", &["operation.*"]);
    let role_id = support.role_id;
    assert!(store.save_role(support).await.is_ok());
    assert!(
        store
            .assign_role(RoleAssignment {
                actor_id: ActorId::new(7),
                role_id,
                tenant_id,
            })
            .await
            .is_ok()
    );

    let engine = engine(store);
    let tenant = TenantContext::new(tenant_id, ActorId::new(100));
    let actor = ActorContext::new(ActorId::new(7), Capabilities::empty());

    for name in ["setup", "ban", "brand.new.command"] {
        let operation = match OperationName::new(name) {
            Ok(operation) => operation,
            Err(error) => panic!("invalid operation in test: {error}"),
        };
        assert_eq!(
            engine.resolver.check_permission(&actor, &operation, &tenant).await,
            Decision::allow()
        );
    }
}

#[tokio::test]
async fn role_names_are_unique_per_tenant() {
    let store = InMemoryAuthorizationStore::new();

    assert!(store.save_role(role(TenantId::new(1), "support", &[])).await.is_ok());
    assert!(store.save_role(role(TenantId::new(2), "support", &[])).await.is_ok());
    assert!(matches!(
        store.save_role(role(TenantId::new(1), "support", &[])).await,
        Err(AppError::Validation(_))
    ));
}

#[tokio::test]
async fn assignments_cannot_cross_tenants() {
    let store = InMemoryAuthorizationStore::new();
    let foreign = role(TenantId::new(2), "foreign", &["operation.ban"]);
    let role_id = foreign.role_id;
    assert!(store.save_role(foreign).await.is_ok());

    let result = store
        .assign_role(RoleAssignment {
            actor_id: ActorId::new(7),
            role_id,
            tenant_id: TenantId::new(1),
        })
        .await;

    assert!(matches!(result, Err(AppError::Validation(_))));
}

#[tokio::test]
async fn maintenance_round_trip_through_engine() {
    let store = Arc::new(InMemoryAuthorizationStore::new());
    let engine = engine(store);
    let tenant_id = TenantId::new(3);

    let enabled = engine
        .maintenance_gate
        .enable(tenant_id, Some("upgrade"), ActorId::new(5))
        .await;
    assert!(enabled.is_ok());
    assert!(
        !engine
            .maintenance_gate
            .admits(tenant_id, ActorId::new(6))
            .await
            .unwrap_or(true)
    );

    engine.audit_recorder.flush().await;
    let entries = engine
        .audit_recorder
        .query(tenant_id, 10, None)
        .await
        .unwrap_or_default();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].reason.as_deref(), Some("upgrade"));
}
