//! Pre-built fixtures for common provisioning scenarios.

use medallion_core::{CatalogName, InMemoryPlatform, NamespaceLayout, SchemaRef};

/// The namespaces the default layout provisions.
pub const DEFAULT_NAMESPACES: [&str; 4] = ["fmcg", "fmcg.bronze", "fmcg.gold", "fmcg.silver"];

/// The default `fmcg` layout.
pub fn default_layout() -> NamespaceLayout {
    NamespaceLayout::default()
}

/// The `fmcg` catalog name.
pub fn fmcg() -> CatalogName {
    CatalogName::new("fmcg").expect("valid catalog name")
}

/// Parses a `catalog.schema` reference.
pub fn schema_ref(qualified: &str) -> SchemaRef {
    qualified.parse().expect("valid qualified schema")
}

/// A platform with no namespaces.
pub fn empty_platform() -> InMemoryPlatform {
    InMemoryPlatform::new()
}

/// A platform where `fmcg` already exists with no schemas.
pub fn platform_with_empty_catalog() -> InMemoryPlatform {
    let platform = InMemoryPlatform::new();
    platform.seed_catalog(fmcg()).expect("seed catalog");
    platform
}

/// A platform that already hosts an unrelated catalog.
pub fn platform_with_unrelated_catalog() -> InMemoryPlatform {
    let platform = InMemoryPlatform::new();
    platform
        .seed_schema(schema_ref("main.default"))
        .expect("seed schema");
    platform
}
