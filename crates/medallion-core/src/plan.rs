//! Ordered provisioning plans.
//!
//! A plan is derived deterministically from a [`NamespaceLayout`]:
//! create the catalog, select it, then create each schema in layout order.
//! Selecting the catalog must precede the schema statements.

use std::fmt;

use serde::Serialize;

use crate::layout::NamespaceLayout;
use crate::statement::Statement;

/// The ordered statements that provision a layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProvisionPlan {
    statements: Vec<Statement>,
}

impl ProvisionPlan {
    /// Builds the plan for a layout.
    #[must_use]
    pub fn from_layout(layout: &NamespaceLayout) -> Self {
        let catalog = layout.catalog().clone();
        let mut statements = Vec::with_capacity(layout.schemas().len() + 2);
        statements.push(Statement::CreateCatalog {
            catalog: catalog.clone(),
        });
        statements.push(Statement::UseCatalog { catalog });
        statements.extend(
            layout
                .schema_refs()
                .into_iter()
                .map(|schema| Statement::CreateSchema { schema }),
        );
        Self { statements }
    }

    /// Returns the statements in execution order.
    #[must_use]
    pub fn statements(&self) -> &[Statement] {
        &self.statements
    }

    /// Number of statements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.statements.len()
    }

    /// Returns true when the plan has no statements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }

    /// Renders the plan as a SQL script, one statement per line.
    #[must_use]
    pub fn to_script(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for ProvisionPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for statement in &self.statements {
            writeln!(f, "{statement}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_plan_matches_setup_script() {
        let plan = ProvisionPlan::from_layout(&NamespaceLayout::default());
        assert_eq!(
            plan.to_script(),
            "CREATE CATALOG IF NOT EXISTS fmcg;\n\
             USE CATALOG fmcg;\n\
             CREATE SCHEMA IF NOT EXISTS fmcg.gold;\n\
             CREATE SCHEMA IF NOT EXISTS fmcg.silver;\n\
             CREATE SCHEMA IF NOT EXISTS fmcg.bronze;\n"
        );
        assert_eq!(plan.len(), 5);
    }

    #[test]
    fn catalog_only_layout_still_selects_catalog() {
        let layout = NamespaceLayout::from_names::<&str>("fmcg_dev", &[]).unwrap();
        let plan = ProvisionPlan::from_layout(&layout);
        let ops: Vec<_> = plan.statements().iter().map(Statement::operation).collect();
        assert_eq!(ops, ["create_catalog", "use_catalog"]);
    }
}
