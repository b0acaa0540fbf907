//! DDL statements issued by the provisioner.
//!
//! Rendering is bit-exact: every statement ends with `;` and schemas are
//! always written fully qualified.

use std::fmt;

use serde::Serialize;

use crate::name::{CatalogName, SchemaRef};

/// A single idempotent DDL statement.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Statement {
    /// `CREATE CATALOG IF NOT EXISTS <catalog>;`
    CreateCatalog {
        /// Catalog to create.
        catalog: CatalogName,
    },
    /// `USE CATALOG <catalog>;`
    UseCatalog {
        /// Catalog to make active for the session.
        catalog: CatalogName,
    },
    /// `CREATE SCHEMA IF NOT EXISTS <catalog>.<schema>;`
    CreateSchema {
        /// Schema to create.
        schema: SchemaRef,
    },
}

impl Statement {
    /// Renders the statement as SQL text.
    #[must_use]
    pub fn sql(&self) -> String {
        self.to_string()
    }

    /// Short operation label used in logs and reports.
    #[must_use]
    pub fn operation(&self) -> &'static str {
        match self {
            Self::CreateCatalog { .. } => "create_catalog",
            Self::UseCatalog { .. } => "use_catalog",
            Self::CreateSchema { .. } => "create_schema",
        }
    }

    /// The namespace object the statement targets, as a display string.
    #[must_use]
    pub fn target(&self) -> String {
        match self {
            Self::CreateCatalog { catalog } | Self::UseCatalog { catalog } => catalog.to_string(),
            Self::CreateSchema { schema } => schema.to_string(),
        }
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CreateCatalog { catalog } => write!(f, "CREATE CATALOG IF NOT EXISTS {catalog};"),
            Self::UseCatalog { catalog } => write!(f, "USE CATALOG {catalog};"),
            Self::CreateSchema { schema } => write!(f, "CREATE SCHEMA IF NOT EXISTS {schema};"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::name::SchemaName;

    #[test]
    fn renders_exact_ddl() {
        let fmcg = CatalogName::new("fmcg").unwrap();
        let gold = SchemaRef::new(fmcg.clone(), SchemaName::new("gold").unwrap());

        assert_eq!(
            Statement::CreateCatalog { catalog: fmcg.clone() }.sql(),
            "CREATE CATALOG IF NOT EXISTS fmcg;"
        );
        assert_eq!(
            Statement::UseCatalog { catalog: fmcg }.sql(),
            "USE CATALOG fmcg;"
        );
        assert_eq!(
            Statement::CreateSchema { schema: gold }.sql(),
            "CREATE SCHEMA IF NOT EXISTS fmcg.gold;"
        );
    }

    #[test]
    fn serializes_with_kind_tag() {
        let stmt = Statement::UseCatalog {
            catalog: CatalogName::new("fmcg").unwrap(),
        };
        let json = serde_json::to_value(&stmt).unwrap();
        assert_eq!(json, serde_json::json!({"kind": "use_catalog", "catalog": "fmcg"}));
    }
}
