//! The namespace provisioner.
//!
//! Executes a [`ProvisionPlan`] strictly in order against a [`Platform`].
//! The first failing statement aborts the run; statements that already
//! succeeded stay in effect. Every statement is idempotent, so a failed run
//! can simply be repeated.

use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::Instrument;

use crate::error::{Error, Result};
use crate::layout::NamespaceLayout;
use crate::name::{CatalogName, SchemaRef};
use crate::observability::provision_span;
use crate::plan::ProvisionPlan;
use crate::platform::Platform;
use crate::statement::Statement;

/// Outcome of one executed statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepOutcome {
    /// 1-based position in the plan.
    pub step: usize,
    /// The statement that ran.
    pub statement: Statement,
    /// Rendered SQL.
    pub sql: String,
    /// Wall-clock duration in milliseconds.
    pub elapsed_ms: u64,
}

/// Report of a successful run.
#[derive(Debug, Clone, Serialize)]
pub struct ProvisionReport {
    /// Provisioned catalog.
    pub catalog: CatalogName,
    /// Executed statements, in order.
    pub steps: Vec<StepOutcome>,
    /// Run start time.
    pub started_at: DateTime<Utc>,
    /// Run end time.
    pub finished_at: DateTime<Utc>,
}

/// A run that stopped at a failing statement.
#[derive(Debug, thiserror::Error)]
#[error("step {step} `{sql}` failed: {source}")]
pub struct ProvisionError {
    /// 1-based position of the failing statement.
    pub step: usize,
    /// The failing statement.
    pub statement: Statement,
    /// Rendered SQL of the failing statement.
    pub sql: String,
    /// Statements that succeeded before the failure.
    pub completed: Vec<StepOutcome>,
    /// The platform error.
    pub source: Error,
}

/// Comparison of a layout against the platform's namespaces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Verification {
    /// Expected catalog.
    pub catalog: CatalogName,
    /// Whether the catalog exists.
    pub catalog_present: bool,
    /// Expected schemas that exist.
    pub present: Vec<SchemaRef>,
    /// Expected schemas that are missing.
    pub missing: Vec<SchemaRef>,
    /// Schemas in the catalog that the layout does not name.
    pub extra: Vec<SchemaRef>,
}

impl Verification {
    /// True when the catalog and every expected schema exist.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.catalog_present && self.missing.is_empty()
    }
}

/// Ensures a [`NamespaceLayout`] exists on a platform.
pub struct Provisioner<'a, P: Platform + ?Sized> {
    platform: &'a P,
    layout: NamespaceLayout,
    plan: ProvisionPlan,
}

impl<'a, P: Platform + ?Sized> Provisioner<'a, P> {
    /// Creates a provisioner for `layout`.
    #[must_use]
    pub fn new(platform: &'a P, layout: NamespaceLayout) -> Self {
        let plan = ProvisionPlan::from_layout(&layout);
        Self {
            platform,
            layout,
            plan,
        }
    }

    /// Returns the plan this provisioner executes.
    #[must_use]
    pub fn plan(&self) -> &ProvisionPlan {
        &self.plan
    }

    /// Returns the layout.
    #[must_use]
    pub fn layout(&self) -> &NamespaceLayout {
        &self.layout
    }

    /// Executes the plan.
    ///
    /// # Errors
    ///
    /// Returns [`ProvisionError`] for the first statement the platform rejects.
    pub async fn apply(&self) -> std::result::Result<ProvisionReport, ProvisionError> {
        let span = provision_span("apply", self.layout.catalog().as_str());
        self.apply_inner().instrument(span).await
    }

    async fn apply_inner(&self) -> std::result::Result<ProvisionReport, ProvisionError> {
        let started_at = Utc::now();
        let mut steps = Vec::with_capacity(self.plan.len());

        for (idx, statement) in self.plan.statements().iter().enumerate() {
            let step = idx + 1;
            let sql = statement.sql();
            let start = Instant::now();
            tracing::debug!(step, op = statement.operation(), %sql, "executing statement");

            if let Err(source) = self.platform.execute(statement).await {
                tracing::error!(
                    step,
                    op = statement.operation(),
                    %sql,
                    kind = %source.kind(),
                    error = %source,
                    "statement failed; aborting"
                );
                return Err(ProvisionError {
                    step,
                    statement: statement.clone(),
                    sql,
                    completed: steps,
                    source,
                });
            }

            let elapsed_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
            tracing::info!(step, op = statement.operation(), target = %statement.target(), elapsed_ms, "statement succeeded");
            steps.push(StepOutcome {
                step,
                statement: statement.clone(),
                sql,
                elapsed_ms,
            });
        }

        Ok(ProvisionReport {
            catalog: self.layout.catalog().clone(),
            steps,
            started_at,
            finished_at: Utc::now(),
        })
    }

    /// Checks which namespaces of the layout exist on the platform.
    ///
    /// # Errors
    ///
    /// Returns the platform error if listing fails.
    pub async fn verify(&self) -> Result<Verification> {
        let catalog = self.layout.catalog().clone();
        let span = provision_span("verify", catalog.as_str());

        async move {
            let listing = self.platform.listing(&catalog).await?;
            let catalog_present = listing.contains_catalog(&catalog);
            let expected = self.layout.schema_refs();

            let (present, missing): (Vec<_>, Vec<_>) = expected
                .iter()
                .cloned()
                .partition(|schema| listing.contains_schema(schema));

            let extra = listing
                .schemas_in(&catalog)
                .into_iter()
                .map(|schema| SchemaRef::new(catalog.clone(), schema.clone()))
                .filter(|schema| !expected.contains(schema))
                .collect();

            tracing::info!(
                catalog_present,
                present = present.len(),
                missing = missing.len(),
                "verified namespaces"
            );

            Ok::<_, Error>(Verification {
                catalog,
                catalog_present,
                present,
                missing,
                extra,
            })
        }
        .instrument(span)
        .await
    }
}
