//! # medallion-cli
//!
//! Command-line provisioner for a lakehouse catalog and its medallion schemas.
//!
//! ## Commands
//!
//! - `medallion plan` - Print the DDL script
//! - `medallion apply` - Create the catalog and schemas (idempotent)
//! - `medallion verify` - Check that every namespace exists
//!
//! ## Configuration
//!
//! Settings come from command-line flags or environment variables:
//!
//! - `DATABRICKS_HOST` - Workspace URL
//! - `DATABRICKS_TOKEN` - Personal access token
//! - `DATABRICKS_WAREHOUSE_ID` - SQL warehouse that runs the statements
//! - `MEDALLION_CATALOG` - Catalog name (default: `fmcg`)
//! - `MEDALLION_SCHEMAS` - Comma-separated schema names (default: `gold,silver,bronze`)
//! - `MEDALLION_LAYOUT_FILE` - JSON layout file, overrides the two above

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(rust_2018_idioms)]
#![warn(clippy::pedantic)]
// CLI uses print! macros intentionally
#![allow(clippy::print_stdout)]
#![allow(clippy::print_stderr)]

pub mod client;
pub mod commands;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use medallion_core::layout::{DEFAULT_CATALOG, DEFAULT_SCHEMAS};
use medallion_core::{LogFormat, NamespaceLayout};

/// Medallion CLI - lakehouse namespace provisioning.
#[derive(Debug, Parser)]
#[command(name = "medallion")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Workspace URL of the data platform.
    #[arg(long, env = "DATABRICKS_HOST")]
    pub host: Option<String>,

    /// API authentication token.
    #[arg(long, env = "DATABRICKS_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// SQL warehouse ID that executes statements.
    #[arg(long, env = "DATABRICKS_WAREHOUSE_ID")]
    pub warehouse_id: Option<String>,

    /// Catalog to provision.
    #[arg(long, env = "MEDALLION_CATALOG", default_value = DEFAULT_CATALOG)]
    pub catalog: String,

    /// Schemas to provision, in order.
    #[arg(
        long,
        env = "MEDALLION_SCHEMAS",
        value_delimiter = ',',
        default_values = DEFAULT_SCHEMAS
    )]
    pub schemas: Vec<String>,

    /// JSON layout file; overrides `--catalog` and `--schemas`.
    #[arg(long, env = "MEDALLION_LAYOUT_FILE")]
    pub layout_file: Option<PathBuf>,

    /// Interval between status polls for long-running statements, in milliseconds.
    #[arg(long, default_value = "500")]
    pub poll_interval_ms: u64,

    /// Maximum number of status polls per statement.
    #[arg(long, default_value = "120")]
    pub max_polls: u32,

    /// Output format.
    #[arg(long, default_value = "text")]
    pub format: OutputFormat,

    /// Log output format (logs go to stderr).
    #[arg(long, env = "MEDALLION_LOG_FORMAT", default_value = "pretty")]
    pub log_format: LogFormatArg,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Get the effective configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the layout file cannot be read or the layout is invalid.
    pub fn config(&self) -> Result<Config> {
        let layout = match &self.layout_file {
            Some(path) => {
                let content = std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read layout file: {path:?}"))?;
                NamespaceLayout::from_json(&content)
                    .with_context(|| format!("Invalid layout file: {path:?}"))?
            }
            None => NamespaceLayout::from_names(&self.catalog, &self.schemas)
                .context("Invalid --catalog/--schemas")?,
        };

        Ok(Config {
            host: self.host.clone(),
            token: self.token.clone(),
            warehouse_id: self.warehouse_id.clone(),
            layout,
            format: self.format.clone(),
            poll_interval: Duration::from_millis(self.poll_interval_ms),
            max_polls: self.max_polls,
        })
    }
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Print the DDL statements that provision the layout.
    Plan(commands::plan::PlanArgs),
    /// Create the catalog and schemas if they do not exist.
    Apply(commands::apply::ApplyArgs),
    /// Check that the catalog and schemas exist.
    Verify(commands::verify::VerifyArgs),
}

/// Output format.
#[derive(Debug, Clone, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output.
    #[default]
    Text,
    /// JSON output.
    Json,
    /// Table output.
    Table,
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, clap::ValueEnum)]
pub enum LogFormatArg {
    /// Human-readable logs.
    #[default]
    Pretty,
    /// JSON logs.
    Json,
}

impl From<LogFormatArg> for LogFormat {
    fn from(value: LogFormatArg) -> Self {
        match value {
            LogFormatArg::Pretty => Self::Pretty,
            LogFormatArg::Json => Self::Json,
        }
    }
}

/// CLI configuration.
#[derive(Clone)]
pub struct Config {
    /// Workspace URL.
    pub host: Option<String>,
    /// API authentication token.
    pub token: Option<String>,
    /// SQL warehouse ID.
    pub warehouse_id: Option<String>,
    /// Namespaces to provision.
    pub layout: NamespaceLayout,
    /// Output format.
    pub format: OutputFormat,
    /// Interval between status polls.
    pub poll_interval: Duration,
    /// Maximum status polls per statement.
    pub max_polls: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: None,
            token: None,
            warehouse_id: None,
            layout: NamespaceLayout::default(),
            format: OutputFormat::default(),
            poll_interval: Duration::from_millis(500),
            max_polls: 120,
        }
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("host", &self.host)
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .field("warehouse_id", &self.warehouse_id)
            .field("layout", &self.layout)
            .field("format", &self.format)
            .field("poll_interval", &self.poll_interval)
            .field("max_polls", &self.max_polls)
            .finish()
    }
}
