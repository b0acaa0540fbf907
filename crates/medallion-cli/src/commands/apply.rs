//! Apply command - create the catalog and schemas.

use anyhow::{Context, Result};
use clap::Args;
use medallion_core::provisioner::StepOutcome;
use medallion_core::{
    InMemoryPlatform, Platform, ProvisionError, ProvisionReport, Provisioner, Verification,
};
use owo_colors::OwoColorize;

use crate::client::StatementClient;
use crate::commands::verify::render_verification;
use crate::{Config, OutputFormat};

/// Arguments for the apply command.
#[derive(Debug, Args)]
pub struct ApplyArgs {
    /// Run against an in-memory platform instead of the warehouse.
    #[arg(long)]
    pub dry_run: bool,

    /// Verify the namespaces after applying.
    #[arg(long)]
    pub verify: bool,
}

/// Result of running the apply command against a platform.
#[derive(Debug)]
pub struct ApplyOutcome {
    /// Rendered output.
    pub output: String,
    /// The provisioning failure, if a statement was rejected.
    pub failure: Option<ProvisionError>,
    /// Post-apply verification, when requested and provisioning succeeded.
    pub verification: Option<Verification>,
}

/// Execute the apply command.
///
/// # Errors
///
/// Returns an error if the connection settings are missing, a statement
/// fails, or post-apply verification finds missing namespaces.
pub async fn execute(args: ApplyArgs, config: &Config) -> Result<()> {
    let outcome = if args.dry_run {
        tracing::info!("dry run: executing against an in-memory platform");
        let platform = InMemoryPlatform::new();
        apply_on(&platform, &args, config).await?
    } else {
        let client = StatementClient::new(config)?;
        apply_on(&client, &args, config).await?
    };

    print!("{}", outcome.output);

    if let Some(failure) = outcome.failure {
        return Err(anyhow::Error::new(failure).context(
            "Provisioning aborted; statements before the failing step remain applied",
        ));
    }
    if let Some(verification) = outcome.verification {
        if !verification.is_complete() {
            anyhow::bail!("Verification failed after apply: namespaces are missing");
        }
    }
    Ok(())
}

/// Provisions `config.layout` on `platform` and renders the result.
///
/// # Errors
///
/// Returns an error only for local failures (rendering, or listing during
/// verification). Statement failures are reported in [`ApplyOutcome::failure`].
pub async fn apply_on<P: Platform + ?Sized>(
    platform: &P,
    args: &ApplyArgs,
    config: &Config,
) -> Result<ApplyOutcome> {
    let provisioner = Provisioner::new(platform, config.layout.clone());

    match provisioner.apply().await {
        Ok(report) => {
            let mut output = render_report(&report, config)?;
            let verification = if args.verify {
                let verification = provisioner
                    .verify()
                    .await
                    .context("Failed to list namespaces for verification")?;
                output.push_str(&render_verification(&verification, config)?);
                Some(verification)
            } else {
                None
            };
            Ok(ApplyOutcome {
                output,
                failure: None,
                verification,
            })
        }
        Err(failure) => Ok(ApplyOutcome {
            output: render_failure(&failure, config)?,
            failure: Some(failure),
            verification: None,
        }),
    }
}

fn step_line(step: &StepOutcome) -> String {
    format!(
        "  [{}] {}  {}  ({} ms)\n",
        step.step,
        "OK".green(),
        step.sql,
        step.elapsed_ms
    )
}

/// Renders a successful run.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn render_report(report: &ProvisionReport, config: &Config) -> Result<String> {
    match config.format {
        OutputFormat::Json => {
            let mut out = serde_json::to_string_pretty(&serde_json::json!({
                "status": "applied",
                "report": report,
            }))
            .context("Failed to serialize report")?;
            out.push('\n');
            Ok(out)
        }
        OutputFormat::Text => {
            let mut out = format!("Provisioned catalog {}\n\n", report.catalog);
            for step in &report.steps {
                out.push_str(&step_line(step));
            }
            let elapsed = report.finished_at - report.started_at;
            out.push_str(&format!(
                "\n{} statements applied in {} ms\n",
                report.steps.len(),
                elapsed.num_milliseconds()
            ));
            Ok(out)
        }
        OutputFormat::Table => {
            use tabled::{Table, Tabled};

            #[derive(Tabled)]
            struct Row {
                #[tabled(rename = "Step")]
                step: usize,
                #[tabled(rename = "SQL")]
                sql: String,
                #[tabled(rename = "Status")]
                status: &'static str,
                #[tabled(rename = "Elapsed (ms)")]
                elapsed_ms: u64,
            }

            let rows: Vec<_> = report
                .steps
                .iter()
                .map(|s| Row {
                    step: s.step,
                    sql: s.sql.clone(),
                    status: "OK",
                    elapsed_ms: s.elapsed_ms,
                })
                .collect();
            Ok(format!("{}\n", Table::new(rows)))
        }
    }
}

/// Renders a run that stopped at a failing statement.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn render_failure(failure: &ProvisionError, config: &Config) -> Result<String> {
    match config.format {
        OutputFormat::Json => {
            let mut out = serde_json::to_string_pretty(&serde_json::json!({
                "status": "failed",
                "failed_step": failure.step,
                "failed_sql": failure.sql,
                "error": {
                    "kind": failure.source.kind().to_string(),
                    "code": failure.source.platform_code(),
                    "message": failure.source.to_string(),
                },
                "completed": failure.completed,
            }))
            .context("Failed to serialize failure")?;
            out.push('\n');
            Ok(out)
        }
        OutputFormat::Text | OutputFormat::Table => {
            let mut out = String::new();
            for step in &failure.completed {
                out.push_str(&step_line(step));
            }
            out.push_str(&format!(
                "  [{}] {}  {}\n\n",
                failure.step,
                "FAILED".red(),
                failure.sql
            ));
            out.push_str(&format!("Error: {}\n", failure.source));
            Ok(out)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use medallion_core::memory::Privilege;

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        args: ApplyArgs,
    }

    #[test]
    fn test_apply_args_parsing() {
        let cli = TestCli::parse_from(["test", "--dry-run", "--verify"]);
        assert!(cli.args.dry_run);
        assert!(cli.args.verify);

        let cli = TestCli::parse_from(["test"]);
        assert!(!cli.args.dry_run);
    }

    #[tokio::test]
    async fn test_apply_on_memory_platform_with_verify() {
        let platform = InMemoryPlatform::new();
        let args = ApplyArgs {
            dry_run: false,
            verify: true,
        };
        let outcome = apply_on(&platform, &args, &Config::default()).await.unwrap();
        assert!(outcome.failure.is_none());
        assert!(outcome.verification.unwrap().is_complete());
        assert!(outcome.output.contains("CREATE SCHEMA IF NOT EXISTS fmcg.bronze;"));
    }

    #[tokio::test]
    async fn test_apply_failure_is_rendered_as_json() {
        let platform = InMemoryPlatform::new();
        platform.deny(Privilege::CreateCatalog).unwrap();
        let config = Config {
            format: OutputFormat::Json,
            ..Config::default()
        };
        let args = ApplyArgs {
            dry_run: false,
            verify: true,
        };

        let outcome = apply_on(&platform, &args, &config).await.unwrap();
        assert!(outcome.verification.is_none());
        let failure = outcome.failure.unwrap();
        assert_eq!(failure.step, 1);

        let value: serde_json::Value = serde_json::from_str(&outcome.output).unwrap();
        assert_eq!(value["status"], "failed");
        assert_eq!(value["failed_sql"], "CREATE CATALOG IF NOT EXISTS fmcg;");
        assert_eq!(value["error"]["kind"], "permission_denied");
        assert_eq!(value["error"]["code"], "PERMISSION_DENIED");
        assert_eq!(value["completed"].as_array().unwrap().len(), 0);
    }
}
