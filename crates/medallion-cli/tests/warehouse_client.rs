//! End-to-end provisioning through the SQL statement client.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::time::Duration;

use medallion_cli::Config;
use medallion_cli::client::StatementClient;
use medallion_cli::commands::apply::{ApplyArgs, apply_on};
use medallion_cli::commands::verify::{VerifyArgs, check, verify_on};
use medallion_core::prelude::*;
use medallion_test_utils::{
    DEFAULT_NAMESPACES, FakeWarehouse, StatusCode, assert_namespaces, default_layout,
    empty_platform, fmcg, init_test_logging, platform_with_empty_catalog,
};

const WAREHOUSE_ID: &str = "wh-test";
const TOKEN: &str = "dapi-test-token";

fn config_for(warehouse: &FakeWarehouse) -> Config {
    Config {
        host: Some(warehouse.base_url().to_string()),
        token: Some(TOKEN.to_string()),
        warehouse_id: Some(WAREHOUSE_ID.to_string()),
        poll_interval: Duration::from_millis(5),
        max_polls: 10,
        ..Config::default()
    }
}

fn apply_args() -> ApplyArgs {
    ApplyArgs {
        dry_run: false,
        verify: false,
    }
}

#[tokio::test]
async fn apply_sends_setup_statements_in_order() {
    init_test_logging();
    let warehouse = FakeWarehouse::start(empty_platform()).await.unwrap();
    warehouse.require_token(TOKEN);
    let config = config_for(&warehouse);
    let client = StatementClient::new(&config).unwrap();

    let outcome = apply_on(&client, &apply_args(), &config).await.unwrap();
    assert!(outcome.failure.is_none());

    assert_eq!(
        warehouse.received_sql(),
        [
            "CREATE CATALOG IF NOT EXISTS fmcg;",
            "USE CATALOG fmcg;",
            "CREATE SCHEMA IF NOT EXISTS fmcg.gold;",
            "CREATE SCHEMA IF NOT EXISTS fmcg.silver;",
            "CREATE SCHEMA IF NOT EXISTS fmcg.bronze;",
        ]
    );

    let received = warehouse.received();
    assert!(received.iter().all(|r| r.warehouse_id == WAREHOUSE_ID));
    assert_eq!(received[0].catalog, None);
    assert_eq!(received[1].catalog, None);
    assert!(received[2..].iter().all(|r| r.catalog.as_deref() == Some("fmcg")));
    assert_eq!(client.session_catalog().unwrap(), Some(fmcg()));

    let listing = warehouse.platform().listing(&fmcg()).await.unwrap();
    assert_namespaces(&listing, &fmcg(), &DEFAULT_NAMESPACES);
}

#[tokio::test]
async fn rerun_is_idempotent() {
    let warehouse = FakeWarehouse::start(platform_with_empty_catalog())
        .await
        .unwrap();
    let config = config_for(&warehouse);

    for _ in 0..2 {
        let client = StatementClient::new(&config).unwrap();
        let outcome = apply_on(&client, &apply_args(), &config).await.unwrap();
        assert!(outcome.failure.is_none());
    }

    assert_eq!(warehouse.received_sql().len(), 10);
    let listing = warehouse.platform().listing(&fmcg()).await.unwrap();
    assert_namespaces(&listing, &fmcg(), &DEFAULT_NAMESPACES);
}

#[tokio::test]
async fn client_lists_namespaces_for_verification() {
    let warehouse = FakeWarehouse::start(empty_platform()).await.unwrap();
    let config = config_for(&warehouse);
    let client = StatementClient::new(&config).unwrap();

    let before = verify_on(&client, &config).await.unwrap();
    assert!(!before.catalog_present);
    assert!(check(&before, &VerifyArgs { strict: false }).is_err());

    let args = ApplyArgs {
        dry_run: false,
        verify: true,
    };
    let outcome = apply_on(&client, &args, &config).await.unwrap();
    assert!(outcome.verification.unwrap().is_complete());

    let after = verify_on(&client, &config).await.unwrap();
    assert!(check(&after, &VerifyArgs { strict: true }).is_ok());
    assert!(warehouse.received_sql().contains(&"SHOW SCHEMAS IN fmcg".to_string()));
}

#[tokio::test]
async fn invalid_token_is_permission_denied() {
    let warehouse = FakeWarehouse::start(empty_platform()).await.unwrap();
    warehouse.require_token("some-other-token");
    let config = config_for(&warehouse);
    let client = StatementClient::new(&config).unwrap();

    let outcome = apply_on(&client, &apply_args(), &config).await.unwrap();
    let failure = outcome.failure.unwrap();
    assert_eq!(failure.step, 1);
    assert_eq!(failure.source.kind(), ErrorKind::PermissionDenied);
    assert_eq!(failure.source.platform_code(), Some("PERMISSION_DENIED"));
    assert!(failure.source.to_string().contains("Invalid access token."));
    assert!(warehouse.received().is_empty());
}

#[tokio::test]
async fn denied_catalog_privilege_creates_no_schemas() {
    let platform = empty_platform();
    platform.deny(Privilege::CreateCatalog).unwrap();
    let warehouse = FakeWarehouse::start(platform).await.unwrap();
    let config = config_for(&warehouse);
    let client = StatementClient::new(&config).unwrap();

    let outcome = apply_on(&client, &apply_args(), &config).await.unwrap();
    let failure = outcome.failure.unwrap();
    assert_eq!(failure.step, 1);
    assert_eq!(failure.source.kind(), ErrorKind::PermissionDenied);
    assert!(outcome.output.contains("FAILED"));

    assert_eq!(warehouse.received_sql(), ["CREATE CATALOG IF NOT EXISTS fmcg;"]);
    assert!(warehouse.platform().history().unwrap().is_empty());
}

#[tokio::test]
async fn unavailable_warehouse_is_a_connectivity_failure() {
    let warehouse = FakeWarehouse::start(empty_platform()).await.unwrap();
    warehouse.fail_with_status(StatusCode::SERVICE_UNAVAILABLE);
    let config = config_for(&warehouse);
    let client = StatementClient::new(&config).unwrap();

    let outcome = apply_on(&client, &apply_args(), &config).await.unwrap();
    let failure = outcome.failure.unwrap();
    assert_eq!(failure.source.kind(), ErrorKind::Connectivity);
    assert_eq!(failure.source.platform_code(), Some("TEMPORARILY_UNAVAILABLE"));
    assert!(failure.source.to_string().contains("warehouse unavailable"));

    let err = verify_on(&client, &config).await.unwrap_err();
    let source = err.downcast_ref::<Error>().unwrap();
    assert_eq!(source.kind(), ErrorKind::Connectivity);
    assert_eq!(source.platform_code(), Some("TEMPORARILY_UNAVAILABLE"));
}

#[tokio::test]
async fn uppercase_names_provision_and_verify_as_lowercase() {
    let warehouse = FakeWarehouse::start(empty_platform()).await.unwrap();
    let config = Config {
        layout: NamespaceLayout::from_names("FMCG", &["GOLD", "Silver", "bronze"]).unwrap(),
        ..config_for(&warehouse)
    };
    let client = StatementClient::new(&config).unwrap();
    let args = ApplyArgs {
        dry_run: false,
        verify: true,
    };

    let outcome = apply_on(&client, &args, &config).await.unwrap();
    assert!(outcome.failure.is_none());
    assert!(outcome.verification.unwrap().is_complete());
    let received = warehouse.received_sql();
    assert_eq!(
        received[..5],
        [
            "CREATE CATALOG IF NOT EXISTS fmcg;",
            "USE CATALOG fmcg;",
            "CREATE SCHEMA IF NOT EXISTS fmcg.gold;",
            "CREATE SCHEMA IF NOT EXISTS fmcg.silver;",
            "CREATE SCHEMA IF NOT EXISTS fmcg.bronze;",
        ]
    );

    let verification = verify_on(&client, &config).await.unwrap();
    assert!(check(&verification, &VerifyArgs { strict: true }).is_ok());
}

#[tokio::test]
async fn unreachable_host_is_a_connectivity_failure() {
    let warehouse = FakeWarehouse::start(empty_platform()).await.unwrap();
    let config = config_for(&warehouse);
    drop(warehouse);
    tokio::time::sleep(Duration::from_millis(50)).await;

    let client = StatementClient::new(&config).unwrap();
    let err = client.run_sql("SHOW CATALOGS").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Connectivity);
}

#[tokio::test]
async fn long_running_statements_are_polled() {
    let warehouse = FakeWarehouse::start(empty_platform()).await.unwrap();
    warehouse.delay_results(3);
    let config = config_for(&warehouse);
    let client = StatementClient::new(&config).unwrap();

    let outcome = apply_on(&client, &apply_args(), &config).await.unwrap();
    assert!(outcome.failure.is_none());

    let listing = warehouse.platform().listing(&fmcg()).await.unwrap();
    assert_namespaces(&listing, &fmcg(), &DEFAULT_NAMESPACES);
}

#[tokio::test]
async fn polling_gives_up_after_max_polls() {
    let warehouse = FakeWarehouse::start(empty_platform()).await.unwrap();
    warehouse.delay_results(50);
    let config = Config {
        max_polls: 2,
        ..config_for(&warehouse)
    };
    let client = StatementClient::new(&config).unwrap();

    let err = client
        .run_sql("CREATE CATALOG IF NOT EXISTS fmcg;")
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Connectivity);
    assert!(err.to_string().contains("did not finish"));
}

#[tokio::test]
async fn custom_layout_uses_configured_names() {
    let warehouse = FakeWarehouse::start(empty_platform()).await.unwrap();
    let config = Config {
        layout: NamespaceLayout::from_names("fmcg_dev", &["bronze"]).unwrap(),
        ..config_for(&warehouse)
    };
    let client = StatementClient::new(&config).unwrap();

    apply_on(&client, &apply_args(), &config).await.unwrap();

    assert_eq!(
        warehouse.received_sql(),
        [
            "CREATE CATALOG IF NOT EXISTS fmcg_dev;",
            "USE CATALOG fmcg_dev;",
            "CREATE SCHEMA IF NOT EXISTS fmcg_dev.bronze;",
        ]
    );
    assert_ne!(config.layout, default_layout());
}
