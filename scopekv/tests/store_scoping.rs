//! Store behaviour against the in-process backend.

use std::collections::BTreeSet;

use scopekv::{
    CheckConfig, Environment, KvBackend, MemoryBackend, Organization, Store, StoreError, TenancyContext,
};

const ROOT: &str = "/scopekv";

fn prod() -> TenancyContext {
    TenancyContext::new("acme", "prod")
}

fn disk_check() -> CheckConfig {
    CheckConfig::new("acme", "prod", "disk-check", "check-disk -w 80", 60).with_subscriptions(["linux"])
}

async fn store_with_scope(org: &str, env: &str) -> Store<MemoryBackend> {
    let store = Store::new(MemoryBackend::new(), ROOT);
    store.kind::<Organization>().create(&Organization::new(org)).await.unwrap();
    store.kind::<Environment>().create(&Environment::new(org, env)).await.unwrap();
    store
}

#[tokio::test]
async fn example_scenario_rejects_update_after_environment_removal() {
    let store = store_with_scope("acme", "prod").await;
    let checks = store.kind::<CheckConfig>();

    checks.create(&disk_check()).await.unwrap();
    assert_eq!(checks.get_by_name(&prod(), "disk-check").await.unwrap(), Some(disk_check()));

    store
        .kind::<Environment>()
        .delete(&TenancyContext::organization("acme"), "prod")
        .await
        .unwrap();

    let mut modified = disk_check();
    modified.interval = 30;
    let err = checks.update(&modified).await.unwrap_err();
    assert!(err.is_precondition_failed(), "unexpected error: {err:?}");
    assert!(err.to_string().contains("parent scope does not exist"));

    assert_eq!(checks.get_by_name(&prod(), "disk-check").await.unwrap(), Some(disk_check()));
}

#[tokio::test]
async fn guarded_write_follows_the_marker() {
    let store = Store::new(MemoryBackend::new(), ROOT);
    let checks = store.kind::<CheckConfig>();

    let err = checks.create(&disk_check()).await.unwrap_err();
    match err {
        StoreError::PreconditionFailed { kind, ref name, ref scope } => {
            assert_eq!(kind, "checks");
            assert_eq!(name, "disk-check");
            assert_eq!(scope, &prod());
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(checks.update(&disk_check()).await.unwrap_err().is_precondition_failed());
    assert!(store.backend().is_empty());

    // The marker is just a key; its payload does not matter to the guard.
    store.backend().put(format!("{ROOT}/environments/acme/prod"), "{}");
    checks.create(&disk_check()).await.unwrap();

    store.backend().delete(&format!("{ROOT}/environments/acme/prod")).await.unwrap();
    assert!(checks.update(&disk_check()).await.unwrap_err().is_precondition_failed());
}

#[tokio::test]
async fn environment_of_another_organization_does_not_satisfy_the_guard() {
    let store = store_with_scope("globex", "prod").await;
    let err = store.kind::<CheckConfig>().create(&disk_check()).await.unwrap_err();
    assert!(err.is_precondition_failed());
}

#[tokio::test]
async fn create_refuses_to_overwrite_but_update_replaces() {
    let store = store_with_scope("acme", "prod").await;
    let checks = store.kind::<CheckConfig>();
    checks.create(&disk_check()).await.unwrap();

    let err = checks.create(&disk_check()).await.unwrap_err();
    assert!(
        matches!(err, StoreError::AlreadyExists { ref key } if key == "/scopekv/checks/acme/prod/disk-check"),
        "unexpected error: {err:?}"
    );

    let mut replaced = disk_check();
    replaced.command = "check-disk -w 95".into();
    checks.update(&replaced).await.unwrap();
    let stored = checks.get_by_name(&prod(), "disk-check").await.unwrap().unwrap();
    assert_eq!(stored.command, "check-disk -w 95");
}

#[tokio::test]
async fn list_returns_exactly_the_scope() {
    let store = store_with_scope("acme", "prod").await;
    store.kind::<Environment>().create(&Environment::new("acme", "dev")).await.unwrap();
    let checks = store.kind::<CheckConfig>();

    let names = ["cpu", "disk", "disk-io", "memory", "ntp"];
    for name in names {
        checks
            .create(&CheckConfig::new("acme", "prod", name, "true", 10))
            .await
            .unwrap();
    }
    checks
        .create(&CheckConfig::new("acme", "dev", "cpu", "true", 10))
        .await
        .unwrap();

    let listed: BTreeSet<String> = checks.list(&prod()).await.unwrap().into_iter().map(|c| c.name).collect();
    assert_eq!(listed, names.iter().map(|n| n.to_string()).collect());

    checks.delete(&prod(), "disk").await.unwrap();
    let listed = checks.list(&prod()).await.unwrap();
    assert_eq!(listed.len(), names.len() - 1);
    assert!(listed.iter().all(|c| c.name != "disk"));

    assert_eq!(checks.list_all().await.unwrap().len(), names.len());
}

#[tokio::test]
async fn empty_scope_lists_as_empty_vec() {
    let store = store_with_scope("acme", "prod").await;
    let listed = store.kind::<CheckConfig>().list(&prod()).await.unwrap();
    assert!(listed.is_empty());

    let missing = store.kind::<CheckConfig>().get_by_name(&prod(), "nope").await.unwrap();
    assert!(missing.is_none());
}

#[tokio::test]
async fn delete_is_idempotent() {
    let store = store_with_scope("acme", "prod").await;
    let checks = store.kind::<CheckConfig>();

    checks.delete(&prod(), "disk-check").await.unwrap();
    checks.delete(&prod(), "disk-check").await.unwrap();
    assert!(!checks.exists(&prod(), "disk-check").await.unwrap());

    checks.create(&disk_check()).await.unwrap();
    checks.delete(&prod(), "disk-check").await.unwrap();
    checks.delete(&prod(), "disk-check").await.unwrap();
    assert!(!checks.exists(&prod(), "disk-check").await.unwrap());
}

#[tokio::test]
async fn every_persisted_field_round_trips() {
    let store = store_with_scope("acme", "prod").await;
    let checks = store.kind::<CheckConfig>();

    let mut check = disk_check().with_handlers(["slack", "pagerduty"]);
    check.runtime_assets = vec!["disk-plugin".into()];
    check.publish = false;
    check.timeout = 30;
    check.stdin = true;
    check.high_flap_threshold = Some(60);
    check.low_flap_threshold = Some(20);

    checks.create(&check).await.unwrap();
    assert_eq!(checks.get_by_name(&prod(), "disk-check").await.unwrap(), Some(check));
}

#[tokio::test]
async fn similar_environment_names_stay_isolated() {
    let store = store_with_scope("acme", "prod").await;
    store.kind::<Environment>().create(&Environment::new("acme", "prod.eu")).await.unwrap();
    let checks = store.kind::<CheckConfig>();

    checks
        .create(&CheckConfig::new("acme", "prod.eu", "cpu", "true", 10))
        .await
        .unwrap();
    assert!(checks.list(&prod()).await.unwrap().is_empty());
}

#[tokio::test]
async fn racing_creates_admit_exactly_one_winner() {
    let store = store_with_scope("acme", "prod").await;
    let checks = store.kind::<CheckConfig>();

    let first = disk_check();
    let mut second = disk_check();
    second.interval = 120;

    let (a, b) = tokio::join!(checks.create(&first), checks.create(&second));
    assert!(a.is_ok() ^ b.is_ok(), "exactly one create should win: {a:?} / {b:?}");
    let loser = a.err().or(b.err()).unwrap();
    assert!(matches!(loser, StoreError::AlreadyExists { .. }));
}

#[tokio::test]
async fn update_racing_scope_deletion_never_orphans() {
    let store = store_with_scope("acme", "prod").await;
    let checks = store.kind::<CheckConfig>();
    let environments = store.kind::<Environment>();
    let org = TenancyContext::organization("acme");

    let check = disk_check();
    let (write, delete) = tokio::join!(checks.update(&check), environments.delete(&org, "prod"));
    delete.unwrap();

    let env_gone = !environments.exists(&org, "prod").await.unwrap();
    assert!(env_gone);
    match write {
        Ok(()) => assert!(checks.exists(&prod(), "disk-check").await.unwrap()),
        Err(err) => {
            assert!(err.is_precondition_failed());
            assert!(!checks.exists(&prod(), "disk-check").await.unwrap());
        }
    }
    assert!(checks.update(&disk_check()).await.unwrap_err().is_precondition_failed());
}
