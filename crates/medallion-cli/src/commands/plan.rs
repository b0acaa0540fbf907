//! Plan command - print the DDL script without connecting.

use anyhow::{Context, Result};
use clap::Args;
use medallion_core::{ProvisionPlan, Statement};

use crate::{Config, OutputFormat};

/// Arguments for the plan command.
#[derive(Debug, Args)]
pub struct PlanArgs {
    /// Annotate schemas with their medallion tier (text output only).
    #[arg(long)]
    pub annotate: bool,
}

/// Execute the plan command.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn execute(args: &PlanArgs, config: &Config) -> Result<()> {
    print!("{}", render(args, config)?);
    Ok(())
}

/// Renders the plan in the configured output format.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn render(args: &PlanArgs, config: &Config) -> Result<String> {
    let plan = ProvisionPlan::from_layout(&config.layout);

    let out = match config.format {
        OutputFormat::Json => {
            let statements: Vec<_> = plan.statements().iter().map(Statement::sql).collect();
            let mut out = serde_json::to_string_pretty(&serde_json::json!({
                "catalog": config.layout.catalog(),
                "schemas": config.layout.schemas(),
                "statements": statements,
            }))
            .context("Failed to serialize plan")?;
            out.push('\n');
            out
        }
        OutputFormat::Text if args.annotate => {
            let mut out = String::new();
            for statement in plan.statements() {
                out.push_str(&statement.sql());
                if let Statement::CreateSchema { schema } = statement {
                    let tier = config
                        .layout
                        .schemas()
                        .iter()
                        .find(|s| s.name == schema.schema)
                        .and_then(|s| s.tier);
                    if let Some(tier) = tier {
                        out.push_str(&format!(" -- {tier}: {}", tier.data_scope()));
                    }
                }
                out.push('\n');
            }
            out
        }
        OutputFormat::Text => plan.to_script(),
        OutputFormat::Table => {
            use tabled::{Table, Tabled};

            #[derive(Tabled)]
            struct Row {
                #[tabled(rename = "Step")]
                step: usize,
                #[tabled(rename = "Operation")]
                operation: &'static str,
                #[tabled(rename = "Target")]
                target: String,
                #[tabled(rename = "SQL")]
                sql: String,
            }

            let rows: Vec<_> = plan
                .statements()
                .iter()
                .enumerate()
                .map(|(idx, s)| Row {
                    step: idx + 1,
                    operation: s.operation(),
                    target: s.target(),
                    sql: s.sql(),
                })
                .collect();
            format!("{}\n", Table::new(rows))
        }
    };

    Ok(out)
}
