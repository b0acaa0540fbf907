//! Custom assertion helpers for integration tests.

use medallion_core::{CatalogName, NamespaceLayout, NamespaceListing, Platform};

/// Asserts that the listing's namespaces under `catalog` are exactly `expected`.
///
/// `expected` holds the catalog name and `catalog.schema` entries.
///
/// # Panics
///
/// Panics if the namespace sets differ.
pub fn assert_namespaces(listing: &NamespaceListing, catalog: &CatalogName, expected: &[&str]) {
    let prefix = format!("{catalog}.");
    let actual: Vec<String> = listing
        .entries()
        .into_iter()
        .filter(|e| e == catalog.as_str() || e.starts_with(&prefix))
        .collect();
    let mut expected: Vec<String> = expected.iter().map(ToString::to_string).collect();
    expected.sort();
    assert_eq!(
        actual, expected,
        "namespace set under '{catalog}' does not match"
    );
}

/// Asserts that every namespace of `layout` exists on `platform`.
///
/// # Panics
///
/// Panics if listing fails or any namespace is missing.
pub async fn assert_layout_provisioned<P: Platform + ?Sized>(platform: &P, layout: &NamespaceLayout) {
    let listing = platform
        .listing(layout.catalog())
        .await
        .expect("listing succeeds");
    assert!(
        listing.contains_catalog(layout.catalog()),
        "catalog '{}' is missing",
        layout.catalog()
    );
    for schema in layout.schema_refs() {
        assert!(
            listing.contains_schema(&schema),
            "schema '{schema}' is missing"
        );
    }
}

/// Asserts that the platform has no schemas in `catalog` (or no such catalog).
///
/// # Panics
///
/// Panics if listing fails or any schema exists.
pub async fn assert_no_schemas<P: Platform + ?Sized>(platform: &P, catalog: &CatalogName) {
    let listing = platform.listing(catalog).await.expect("listing succeeds");
    assert!(
        listing.schemas_in(catalog).is_empty(),
        "expected no schemas in '{catalog}', found {:?}",
        listing.schemas_in(catalog)
    );
}
