//! Provisioning scenarios against the in-memory platform.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use medallion_core::prelude::*;
use medallion_test_utils::{
    DEFAULT_NAMESPACES, assert_layout_provisioned, assert_namespaces, assert_no_schemas,
    default_layout, empty_platform, fmcg, init_test_logging, platform_with_empty_catalog,
    platform_with_unrelated_catalog, schema_ref,
};

#[tokio::test]
async fn empty_platform_gains_catalog_and_three_schemas() {
    init_test_logging();
    let platform = empty_platform();

    Provisioner::new(&platform, default_layout())
        .apply()
        .await
        .unwrap();

    let listing = platform.listing(&fmcg()).await.unwrap();
    assert_namespaces(&listing, &fmcg(), &DEFAULT_NAMESPACES);
    assert_eq!(platform.current_catalog().unwrap(), Some(fmcg()));
}

#[tokio::test]
async fn running_twice_matches_running_once() {
    let once = empty_platform();
    Provisioner::new(&once, default_layout()).apply().await.unwrap();

    let twice = empty_platform();
    let provisioner = Provisioner::new(&twice, default_layout());
    provisioner.apply().await.unwrap();
    let second = provisioner.apply().await.unwrap();
    assert_eq!(second.steps.len(), 5);

    let expected = once.listing(&fmcg()).await.unwrap();
    let actual = twice.listing(&fmcg()).await.unwrap();
    assert_eq!(expected.entries(), actual.entries());
}

#[tokio::test]
async fn existing_empty_catalog_gains_exactly_three_schemas() {
    let platform = platform_with_empty_catalog();

    Provisioner::new(&platform, default_layout())
        .apply()
        .await
        .unwrap();

    let listing = platform.listing(&fmcg()).await.unwrap();
    assert_eq!(listing.schemas_in(&fmcg()).len(), 3);
    assert_namespaces(&listing, &fmcg(), &DEFAULT_NAMESPACES);
}

#[tokio::test]
async fn unrelated_namespaces_are_left_alone() {
    let platform = platform_with_unrelated_catalog();

    Provisioner::new(&platform, default_layout())
        .apply()
        .await
        .unwrap();

    let main: CatalogName = "main".parse().unwrap();
    let listing = platform.listing(&main).await.unwrap();
    assert!(listing.contains_schema(&schema_ref("main.default")));
    assert!(listing.contains_catalog(&fmcg()));
    assert_layout_provisioned(&platform, &default_layout()).await;
}

#[tokio::test]
async fn missing_catalog_privilege_fails_before_any_schema() {
    let platform = platform_with_unrelated_catalog();
    platform.deny(Privilege::CreateCatalog).unwrap();

    let err = Provisioner::new(&platform, default_layout())
        .apply()
        .await
        .unwrap_err();

    assert_eq!(err.step, 1);
    assert!(err.completed.is_empty());
    assert_eq!(err.source.kind(), ErrorKind::PermissionDenied);
    assert!(platform.history().unwrap().is_empty());

    assert_no_schemas(&platform, &fmcg()).await;
    let main: CatalogName = "main".parse().unwrap();
    let listing = platform.listing(&main).await.unwrap();
    assert!(!listing.contains_catalog(&fmcg()));
    let entries: Vec<_> = listing.entries().into_iter().collect();
    assert_eq!(entries, ["main", "main.default"]);
}

#[tokio::test]
async fn existing_catalog_needs_no_create_privilege() {
    let platform = platform_with_empty_catalog();
    platform.deny(Privilege::CreateCatalog).unwrap();

    Provisioner::new(&platform, default_layout())
        .apply()
        .await
        .unwrap();

    assert_layout_provisioned(&platform, &default_layout()).await;
}

#[tokio::test]
async fn mid_run_failure_keeps_earlier_statements() {
    let platform = empty_platform();
    platform
        .inject_failure("fmcg.silver", "INTERNAL_ERROR", "metastore write failed")
        .unwrap();
    let provisioner = Provisioner::new(&platform, default_layout());

    let err = provisioner.apply().await.unwrap_err();
    assert_eq!(err.step, 4);
    assert_eq!(err.completed.len(), 3);
    assert_eq!(err.source.platform_code(), Some("INTERNAL_ERROR"));
    assert!(err.source.to_string().contains("metastore write failed"));

    let verification = provisioner.verify().await.unwrap();
    assert!(verification.catalog_present);
    let missing: Vec<_> = verification.missing.iter().map(ToString::to_string).collect();
    assert_eq!(missing, ["fmcg.silver", "fmcg.bronze"]);
}

#[tokio::test]
async fn name_taken_by_another_object_is_a_naming_conflict() {
    let platform = empty_platform();
    platform.reserve_name("fmcg", "FOREIGN_CATALOG").unwrap();

    let err = Provisioner::new(&platform, default_layout())
        .apply()
        .await
        .unwrap_err();

    assert_eq!(err.step, 1);
    assert_eq!(err.source.kind(), ErrorKind::NamingConflict);
    assert_eq!(err.source.platform_code(), Some("RESOURCE_ALREADY_EXISTS"));
}

#[tokio::test]
async fn unreachable_platform_is_a_connectivity_failure() {
    let platform = empty_platform();
    platform.set_reachable(false).unwrap();
    let provisioner = Provisioner::new(&platform, default_layout());

    let err = provisioner.apply().await.unwrap_err();
    assert_eq!(err.step, 1);
    assert_eq!(err.source.kind(), ErrorKind::Connectivity);

    let verify_err = provisioner.verify().await.unwrap_err();
    assert_eq!(verify_err.kind(), ErrorKind::Connectivity);

    platform.set_reachable(true).unwrap();
    provisioner.apply().await.unwrap();
    assert!(provisioner.verify().await.unwrap().is_complete());
}

#[tokio::test]
async fn custom_layout_provisions_in_declared_order() {
    let layout = NamespaceLayout::from_names("fmcg_dev", &["bronze", "silver"]).unwrap();
    let platform = empty_platform();

    let report = Provisioner::new(&platform, layout.clone())
        .apply()
        .await
        .unwrap();

    let sql: Vec<_> = report.steps.iter().map(|s| s.sql.as_str()).collect();
    assert_eq!(
        sql,
        [
            "CREATE CATALOG IF NOT EXISTS fmcg_dev;",
            "USE CATALOG fmcg_dev;",
            "CREATE SCHEMA IF NOT EXISTS fmcg_dev.bronze;",
            "CREATE SCHEMA IF NOT EXISTS fmcg_dev.silver;",
        ]
    );
    assert_layout_provisioned(&platform, &layout).await;
}

#[tokio::test]
async fn uppercase_layout_verifies_against_lowercase_metastore() {
    let platform = platform_with_empty_catalog();
    platform.seed_schema(schema_ref("fmcg.gold")).unwrap();
    let layout = NamespaceLayout::from_names("FMCG", &["GOLD", "SILVER", "BRONZE"]).unwrap();
    let provisioner = Provisioner::new(&platform, layout);

    let before = provisioner.verify().await.unwrap();
    assert!(before.catalog_present);
    let missing: Vec<_> = before.missing.iter().map(ToString::to_string).collect();
    assert_eq!(missing, ["fmcg.silver", "fmcg.bronze"]);

    let report = provisioner.apply().await.unwrap();
    assert_eq!(report.steps[2].sql, "CREATE SCHEMA IF NOT EXISTS fmcg.gold;");
    assert!(provisioner.verify().await.unwrap().is_complete());

    let listing = platform.listing(&fmcg()).await.unwrap();
    assert_namespaces(&listing, &fmcg(), &DEFAULT_NAMESPACES);
}

#[test]
fn schemas_differing_only_in_case_are_one_schema() {
    let err = NamespaceLayout::from_names("fmcg", &["gold", "GOLD"]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidLayout);
}
