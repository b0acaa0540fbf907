//! Namespace layouts: the catalog and the ordered schemas to provision.
//!
//! The default layout is the `fmcg` catalog with `gold`, `silver` and `bronze`
//! schemas, in that order. Bronze and silver hold child-company data only;
//! gold may combine parent- and child-company data. The data scope is
//! descriptive and is not enforced by provisioning.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::name::{CatalogName, SchemaName, SchemaRef};

/// Default catalog name.
pub const DEFAULT_CATALOG: &str = "fmcg";

/// Default schema names, in provisioning order.
pub const DEFAULT_SCHEMAS: [&str; 3] = ["gold", "silver", "bronze"];

/// Medallion data-quality tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    /// Raw data as landed.
    Bronze,
    /// Cleaned data.
    Silver,
    /// Curated data.
    Gold,
}

impl Tier {
    /// Infers the tier from a conventional schema name.
    #[must_use]
    pub fn infer(schema: &SchemaName) -> Option<Self> {
        match schema.as_str().to_ascii_lowercase().as_str() {
            "bronze" => Some(Self::Bronze),
            "silver" => Some(Self::Silver),
            "gold" => Some(Self::Gold),
            _ => None,
        }
    }

    /// Whose data a schema of this tier is expected to hold.
    #[must_use]
    pub fn data_scope(self) -> DataScope {
        match self {
            Self::Bronze | Self::Silver => DataScope::ChildCompany,
            Self::Gold => DataScope::ParentAndChild,
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Bronze => "bronze",
            Self::Silver => "silver",
            Self::Gold => "gold",
        };
        write!(f, "{s}")
    }
}

/// Which company's data a tier holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataScope {
    /// Child company only.
    ChildCompany,
    /// Parent and child company combined.
    ParentAndChild,
}

impl fmt::Display for DataScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::ChildCompany => "child company",
            Self::ParentAndChild => "parent + child company",
        };
        write!(f, "{s}")
    }
}

/// A schema to provision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaSpec {
    /// Schema name.
    pub name: SchemaName,
    /// Medallion tier, if the schema has one. Inferred from the name when
    /// a layout document leaves it out.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tier: Option<Tier>,
}

impl SchemaSpec {
    /// Creates a schema spec, inferring the tier from the name.
    #[must_use]
    pub fn new(name: SchemaName) -> Self {
        let tier = Tier::infer(&name);
        Self { name, tier }
    }
}

#[derive(Deserialize)]
struct RawLayout {
    catalog: CatalogName,
    schemas: Vec<SchemaSpec>,
}

/// The catalog and ordered schemas to provision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawLayout")]
pub struct NamespaceLayout {
    catalog: CatalogName,
    schemas: Vec<SchemaSpec>,
}

impl NamespaceLayout {
    /// Creates a layout.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidLayout`] if a schema name appears twice.
    pub fn new(catalog: CatalogName, schemas: Vec<SchemaSpec>) -> Result<Self> {
        let mut seen = HashSet::new();
        for spec in &schemas {
            if !seen.insert(spec.name.as_str()) {
                return Err(Error::InvalidLayout {
                    message: format!("schema '{}' is listed more than once", spec.name),
                });
            }
        }
        Ok(Self { catalog, schemas })
    }

    /// Creates a layout from raw names, inferring tiers.
    ///
    /// # Errors
    ///
    /// Returns an error if any name is invalid or a schema is duplicated.
    pub fn from_names<S: AsRef<str>>(catalog: &str, schemas: &[S]) -> Result<Self> {
        let catalog = CatalogName::new(catalog)?;
        let schemas = schemas
            .iter()
            .map(|s| SchemaName::new(s.as_ref().trim()).map(SchemaSpec::new))
            .collect::<Result<Vec<_>>>()?;
        Self::new(catalog, schemas)
    }

    /// Parses a layout from JSON.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidLayout`] if the document is malformed or invalid.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::InvalidLayout {
            message: e.to_string(),
        })
    }

    /// Returns the catalog.
    #[must_use]
    pub fn catalog(&self) -> &CatalogName {
        &self.catalog
    }

    /// Returns the schemas in provisioning order.
    #[must_use]
    pub fn schemas(&self) -> &[SchemaSpec] {
        &self.schemas
    }

    /// Returns the fully qualified schema references in provisioning order.
    #[must_use]
    pub fn schema_refs(&self) -> Vec<SchemaRef> {
        self.schemas
            .iter()
            .map(|s| SchemaRef::new(self.catalog.clone(), s.name.clone()))
            .collect()
    }
}

impl TryFrom<RawLayout> for NamespaceLayout {
    type Error = Error;

    fn try_from(raw: RawLayout) -> Result<Self> {
        let schemas = raw
            .schemas
            .into_iter()
            .map(|spec| SchemaSpec {
                tier: spec.tier.or_else(|| Tier::infer(&spec.name)),
                name: spec.name,
            })
            .collect();
        Self::new(raw.catalog, schemas)
    }
}

impl Default for NamespaceLayout {
    fn default() -> Self {
        let catalog = CatalogName::new_unchecked(DEFAULT_CATALOG);
        let schemas = DEFAULT_SCHEMAS
            .iter()
            .map(|s| SchemaSpec::new(SchemaName::new_unchecked(*s)))
            .collect();
        Self { catalog, schemas }
    }
}
