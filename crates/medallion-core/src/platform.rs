//! The SQL platform seam the provisioner runs against.

use std::collections::{BTreeMap, BTreeSet};

use async_trait::async_trait;
use serde::Serialize;

use crate::error::Result;
use crate::name::{CatalogName, SchemaName, SchemaRef};
use crate::statement::Statement;

/// A data platform that executes DDL and lists namespaces.
///
/// Implementations keep session state: after `USE CATALOG`, later statements
/// run with that catalog active.
#[async_trait]
pub trait Platform: Send + Sync {
    /// Executes one statement.
    ///
    /// # Errors
    ///
    /// Returns the platform's native error, classified.
    async fn execute(&self, statement: &Statement) -> Result<()>;

    /// Lists all catalogs visible to the session.
    ///
    /// # Errors
    ///
    /// Returns the platform's native error, classified.
    async fn list_catalogs(&self) -> Result<Vec<CatalogName>>;

    /// Lists schemas in a catalog.
    ///
    /// # Errors
    ///
    /// Returns the platform's native error, classified.
    async fn list_schemas(&self, catalog: &CatalogName) -> Result<Vec<SchemaName>>;

    /// Lists catalogs, plus the schemas of `catalog` when it exists.
    ///
    /// # Errors
    ///
    /// Returns the platform's native error, classified.
    async fn listing(&self, catalog: &CatalogName) -> Result<NamespaceListing> {
        let mut listing = NamespaceListing::default();
        let catalogs = self.list_catalogs().await?;
        let present = catalogs.contains(catalog);
        for c in catalogs {
            listing.add_catalog(c);
        }
        if present {
            for schema in self.list_schemas(catalog).await? {
                listing.add_schema(SchemaRef::new(catalog.clone(), schema));
            }
        }
        Ok(listing)
    }
}

/// A snapshot of catalogs and their schemas.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NamespaceListing {
    catalogs: BTreeMap<CatalogName, BTreeSet<SchemaName>>,
}

impl NamespaceListing {
    /// Records a catalog.
    pub fn add_catalog(&mut self, catalog: CatalogName) {
        self.catalogs.entry(catalog).or_default();
    }

    /// Records a schema and its parent catalog.
    pub fn add_schema(&mut self, schema: SchemaRef) {
        self.catalogs
            .entry(schema.catalog)
            .or_default()
            .insert(schema.schema);
    }

    /// Returns true if the catalog is present.
    #[must_use]
    pub fn contains_catalog(&self, catalog: &CatalogName) -> bool {
        self.catalogs.contains_key(catalog)
    }

    /// Returns true if the schema is present.
    #[must_use]
    pub fn contains_schema(&self, schema: &SchemaRef) -> bool {
        self.catalogs
            .get(&schema.catalog)
            .is_some_and(|schemas| schemas.contains(&schema.schema))
    }

    /// Catalog names, sorted.
    pub fn catalogs(&self) -> impl Iterator<Item = &CatalogName> {
        self.catalogs.keys()
    }

    /// Schemas in a catalog, sorted. Empty when the catalog is absent.
    #[must_use]
    pub fn schemas_in(&self, catalog: &CatalogName) -> Vec<&SchemaName> {
        self.catalogs
            .get(catalog)
            .map(|s| s.iter().collect())
            .unwrap_or_default()
    }

    /// Every namespace as a display string: catalogs, then `catalog.schema`.
    #[must_use]
    pub fn entries(&self) -> BTreeSet<String> {
        let mut out = BTreeSet::new();
        for (catalog, schemas) in &self.catalogs {
            out.insert(catalog.to_string());
            for schema in schemas {
                out.insert(format!("{catalog}.{schema}"));
            }
        }
        out
    }
}
