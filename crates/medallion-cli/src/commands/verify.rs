//! Verify command - check that the catalog and schemas exist.

use anyhow::{Context, Result};
use clap::Args;
use medallion_core::{Platform, Provisioner, Verification};
use owo_colors::OwoColorize;

use crate::client::StatementClient;
use crate::{Config, OutputFormat};

/// Arguments for the verify command.
#[derive(Debug, Args)]
pub struct VerifyArgs {
    /// Treat schemas the layout does not name as a failure.
    #[arg(long)]
    pub strict: bool,
}

/// Execute the verify command.
///
/// # Errors
///
/// Returns an error if listing fails or any expected namespace is missing.
pub async fn execute(args: VerifyArgs, config: &Config) -> Result<()> {
    let client = StatementClient::new(config)?;
    let verification = verify_on(&client, config).await?;

    print!("{}", render_verification(&verification, config)?);

    check(&verification, &args)
}

/// Lists namespaces on `platform` and compares them with `config.layout`.
///
/// # Errors
///
/// Returns an error if the platform cannot be listed.
pub async fn verify_on<P: Platform + ?Sized>(platform: &P, config: &Config) -> Result<Verification> {
    Provisioner::new(platform, config.layout.clone())
        .verify()
        .await
        .with_context(|| format!("Failed to list namespaces of {}", config.layout.catalog()))
}

/// Turns an incomplete verification into an error.
///
/// # Errors
///
/// Returns an error if the catalog or an expected schema is missing, or if
/// `--strict` is set and unexpected schemas exist.
pub fn check(verification: &Verification, args: &VerifyArgs) -> Result<()> {
    if !verification.catalog_present {
        anyhow::bail!("Catalog {} does not exist", verification.catalog);
    }
    if !verification.missing.is_empty() {
        let missing: Vec<_> = verification.missing.iter().map(ToString::to_string).collect();
        anyhow::bail!("Missing schemas: {}", missing.join(", "));
    }
    if args.strict && !verification.extra.is_empty() {
        let extra: Vec<_> = verification.extra.iter().map(ToString::to_string).collect();
        anyhow::bail!("Unexpected schemas: {}", extra.join(", "));
    }
    Ok(())
}

/// Renders a verification in the configured output format.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn render_verification(verification: &Verification, config: &Config) -> Result<String> {
    match config.format {
        OutputFormat::Json => {
            let mut out = serde_json::to_string_pretty(&serde_json::json!({
                "complete": verification.is_complete(),
                "verification": verification,
            }))
            .context("Failed to serialize verification")?;
            out.push('\n');
            Ok(out)
        }
        OutputFormat::Text => {
            let mut out = format!(
                "\nCatalog {}: {}\n",
                verification.catalog,
                format_presence(verification.catalog_present)
            );
            for schema in &verification.present {
                out.push_str(&format!("  {schema}: {}\n", format_presence(true)));
            }
            for schema in &verification.missing {
                out.push_str(&format!("  {schema}: {}\n", format_presence(false)));
            }
            for schema in &verification.extra {
                out.push_str(&format!("  {schema}: {}\n", "unmanaged".dimmed()));
            }
            Ok(out)
        }
        OutputFormat::Table => {
            use tabled::{Table, Tabled};

            #[derive(Tabled)]
            struct Row {
                #[tabled(rename = "Namespace")]
                namespace: String,
                #[tabled(rename = "Status")]
                status: &'static str,
            }

            let mut rows = vec![Row {
                namespace: verification.catalog.to_string(),
                status: presence_label(verification.catalog_present),
            }];
            rows.extend(verification.present.iter().map(|s| Row {
                namespace: s.to_string(),
                status: presence_label(true),
            }));
            rows.extend(verification.missing.iter().map(|s| Row {
                namespace: s.to_string(),
                status: presence_label(false),
            }));
            rows.extend(verification.extra.iter().map(|s| Row {
                namespace: s.to_string(),
                status: "unmanaged",
            }));
            Ok(format!("{}\n", Table::new(rows)))
        }
    }
}

fn presence_label(present: bool) -> &'static str {
    if present { "present" } else { "missing" }
}

fn format_presence(present: bool) -> String {
    if present {
        presence_label(true).green().to_string()
    } else {
        presence_label(false).red().to_string()
    }
}
