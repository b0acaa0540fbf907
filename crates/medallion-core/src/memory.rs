//! In-memory platform with metastore semantics.
//!
//! Used for dry runs and tests. Behaves like a lakehouse metastore for the
//! statements the provisioner issues:
//! - `CREATE ... IF NOT EXISTS` is a no-op when the object exists
//! - `USE CATALOG` fails if the catalog is missing
//! - schemas require their parent catalog
//! - privileges can be revoked and the platform can be made unreachable

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::sync::{Arc, RwLock};

use async_trait::async_trait;

use crate::error::{Error, Result};
use crate::name::{CatalogName, SchemaName, SchemaRef};
use crate::platform::Platform;
use crate::statement::Statement;

/// Privileges checked by [`InMemoryPlatform`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Privilege {
    /// `CREATE CATALOG` on the metastore.
    CreateCatalog,
    /// `USE CATALOG` on a catalog.
    UseCatalog,
    /// `CREATE SCHEMA` on a catalog.
    CreateSchema,
}

impl Privilege {
    fn sql_name(self) -> &'static str {
        match self {
            Self::CreateCatalog => "CREATE CATALOG",
            Self::UseCatalog => "USE CATALOG",
            Self::CreateSchema => "CREATE SCHEMA",
        }
    }
}

#[derive(Debug, Default)]
struct State {
    catalogs: BTreeMap<CatalogName, BTreeSet<SchemaName>>,
    /// Catalog-level names held by objects that are not managed catalogs.
    reserved: BTreeMap<String, String>,
    current_catalog: Option<CatalogName>,
    denied: HashSet<Privilege>,
    unreachable: bool,
    injected: Vec<(String, String, String)>,
    history: Vec<Statement>,
}

/// An in-memory [`Platform`].
///
/// Cloning shares the underlying state.
#[derive(Debug, Clone, Default)]
pub struct InMemoryPlatform {
    state: Arc<RwLock<State>>,
}

impl InMemoryPlatform {
    /// Creates an empty platform with every privilege granted.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds an existing catalog.
    ///
    /// # Errors
    ///
    /// Returns an error if the internal lock is poisoned.
    pub fn seed_catalog(&self, catalog: CatalogName) -> Result<()> {
        self.write()?.catalogs.entry(catalog).or_default();
        Ok(())
    }

    /// Seeds an existing schema, creating its catalog if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the internal lock is poisoned.
    pub fn seed_schema(&self, schema: SchemaRef) -> Result<()> {
        self.write()?
            .catalogs
            .entry(schema.catalog)
            .or_default()
            .insert(schema.schema);
        Ok(())
    }

    /// Marks a catalog-level name as taken by another object type,
    /// e.g. a foreign or shared catalog.
    ///
    /// # Errors
    ///
    /// Returns an error if the internal lock is poisoned.
    pub fn reserve_name(&self, name: impl Into<String>, object_type: impl Into<String>) -> Result<()> {
        self.write()?
            .reserved
            .insert(name.into().to_ascii_lowercase(), object_type.into());
        Ok(())
    }

    /// Revokes a privilege from the session.
    ///
    /// # Errors
    ///
    /// Returns an error if the internal lock is poisoned.
    pub fn deny(&self, privilege: Privilege) -> Result<()> {
        self.write()?.denied.insert(privilege);
        Ok(())
    }

    /// Toggles reachability. While unreachable every call fails with a
    /// connectivity error.
    ///
    /// # Errors
    ///
    /// Returns an error if the internal lock is poisoned.
    pub fn set_reachable(&self, reachable: bool) -> Result<()> {
        self.write()?.unreachable = !reachable;
        Ok(())
    }

    /// Makes statements targeting `target` (e.g. `fmcg.silver`) fail with the
    /// given native error.
    ///
    /// # Errors
    ///
    /// Returns an error if the internal lock is poisoned.
    pub fn inject_failure(
        &self,
        target: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Result<()> {
        self.write()?
            .injected
            .push((target.into(), code.into(), message.into()));
        Ok(())
    }

    /// Statements that executed successfully, in order.
    ///
    /// # Errors
    ///
    /// Returns an error if the internal lock is poisoned.
    pub fn history(&self) -> Result<Vec<Statement>> {
        Ok(self.read()?.history.clone())
    }

    /// The catalog selected by the last `USE CATALOG`.
    ///
    /// # Errors
    ///
    /// Returns an error if the internal lock is poisoned.
    pub fn current_catalog(&self) -> Result<Option<CatalogName>> {
        Ok(self.read()?.current_catalog.clone())
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, State>> {
        self.state.read().map_err(|_| poisoned())
    }

    fn write(&self) -> Result<std::sync::RwLockWriteGuard<'_, State>> {
        self.state.write().map_err(|_| poisoned())
    }
}

fn poisoned() -> Error {
    Error::Platform {
        code: "INTERNAL_ERROR".to_string(),
        message: "in-memory platform lock poisoned".to_string(),
    }
}

fn unreachable_error() -> Error {
    Error::connectivity("in-memory platform is unreachable")
}

impl State {
    fn check(&self, privilege: Privilege, on: &str) -> Result<()> {
        if self.denied.contains(&privilege) {
            return Err(Error::PermissionDenied {
                code: "PERMISSION_DENIED".to_string(),
                message: format!("User does not have {} on {on}.", privilege.sql_name()),
            });
        }
        Ok(())
    }

    fn injected_for(&self, target: &str) -> Option<Error> {
        self.injected
            .iter()
            .find(|(t, _, _)| t == target)
            .map(|(_, code, message)| Error::from_platform(code.clone(), message.clone()))
    }

    fn apply(&mut self, statement: &Statement) -> Result<()> {
        if let Some(err) = self.injected_for(&statement.target()) {
            return Err(err);
        }

        match statement {
            Statement::CreateCatalog { catalog } => {
                if let Some(object_type) = self.reserved.get(catalog.as_str()) {
                    return Err(Error::NamingConflict {
                        code: "RESOURCE_ALREADY_EXISTS".to_string(),
                        message: format!("'{catalog}' already exists as a {object_type}."),
                    });
                }
                if self.catalogs.contains_key(catalog) {
                    return Ok(());
                }
                self.check(Privilege::CreateCatalog, "Metastore")?;
                self.catalogs.insert(catalog.clone(), BTreeSet::new());
            }
            Statement::UseCatalog { catalog } => {
                if !self.catalogs.contains_key(catalog) {
                    return Err(no_such_catalog(catalog));
                }
                self.check(Privilege::UseCatalog, &format!("Catalog '{catalog}'"))?;
                self.current_catalog = Some(catalog.clone());
            }
            Statement::CreateSchema { schema } => {
                let Some(schemas) = self.catalogs.get(&schema.catalog) else {
                    return Err(no_such_catalog(&schema.catalog));
                };
                if schemas.contains(&schema.schema) {
                    return Ok(());
                }
                self.check(
                    Privilege::CreateSchema,
                    &format!("Catalog '{}'", schema.catalog),
                )?;
                self.catalogs
                    .entry(schema.catalog.clone())
                    .or_default()
                    .insert(schema.schema.clone());
            }
        }
        Ok(())
    }
}

fn no_such_catalog(catalog: &CatalogName) -> Error {
    Error::NotFound {
        code: "NO_SUCH_CATALOG_EXCEPTION".to_string(),
        message: format!("Catalog '{catalog}' was not found."),
    }
}

#[async_trait]
impl Platform for InMemoryPlatform {
    async fn execute(&self, statement: &Statement) -> Result<()> {
        let mut state = self.write()?;
        if state.unreachable {
            return Err(unreachable_error());
        }
        state.apply(statement)?;
        state.history.push(statement.clone());
        Ok(())
    }

    async fn list_catalogs(&self) -> Result<Vec<CatalogName>> {
        let state = self.read()?;
        if state.unreachable {
            return Err(unreachable_error());
        }
        Ok(state.catalogs.keys().cloned().collect())
    }

    async fn list_schemas(&self, catalog: &CatalogName) -> Result<Vec<SchemaName>> {
        let state = self.read()?;
        if state.unreachable {
            return Err(unreachable_error());
        }
        state
            .catalogs
            .get(catalog)
            .map(|s| s.iter().cloned().collect())
            .ok_or_else(|| no_such_catalog(catalog))
    }
}
