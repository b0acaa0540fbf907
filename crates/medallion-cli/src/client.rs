//! HTTP client for the SQL Statement Execution API.
//!
//! Each statement is submitted on its own request, so the client carries the
//! session catalog itself: after `USE CATALOG` succeeds, later statements are
//! submitted with that catalog as their context.

use std::sync::Mutex;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use medallion_core::{CatalogName, Error, Platform, SchemaName, Statement};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

use crate::Config;

const STATEMENTS_PATH: &str = "/api/2.0/sql/statements";

/// Statement execution client bound to one SQL warehouse.
pub struct StatementClient {
    client: Client,
    base_url: String,
    token: Option<String>,
    warehouse_id: String,
    poll_interval: Duration,
    max_polls: u32,
    session_catalog: Mutex<Option<CatalogName>>,
}

impl std::fmt::Debug for StatementClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StatementClient")
            .field("base_url", &self.base_url)
            .field("warehouse_id", &self.warehouse_id)
            .finish_non_exhaustive()
    }
}

impl StatementClient {
    /// Creates a new client from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the host or warehouse ID is missing, or the HTTP
    /// client cannot be constructed.
    pub fn new(config: &Config) -> Result<Self> {
        let host = config
            .host
            .as_deref()
            .context("Host is required. Set DATABRICKS_HOST or use --host")?;
        let warehouse_id = config
            .warehouse_id
            .clone()
            .context("Warehouse ID is required. Set DATABRICKS_WAREHOUSE_ID or use --warehouse-id")?;

        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: normalize_host(host),
            token: config.token.clone(),
            warehouse_id,
            poll_interval: config.poll_interval,
            max_polls: config.max_polls,
            session_catalog: Mutex::new(None),
        })
    }

    /// Returns the catalog selected by the last successful `USE CATALOG`.
    ///
    /// # Errors
    ///
    /// Returns an error if the session lock is poisoned.
    pub fn session_catalog(&self) -> medallion_core::Result<Option<CatalogName>> {
        self.session_catalog
            .lock()
            .map(|c| c.clone())
            .map_err(|_| poisoned())
    }

    /// Runs one SQL statement to completion and returns its result rows.
    ///
    /// # Errors
    ///
    /// Returns a classified platform error; the native error code and message
    /// are preserved.
    pub async fn run_sql(&self, sql: &str) -> medallion_core::Result<Vec<Vec<Option<String>>>> {
        let catalog = self.session_catalog()?;
        let request = ExecuteStatementRequest {
            statement: sql,
            warehouse_id: &self.warehouse_id,
            catalog: catalog.as_ref().map(CatalogName::as_str),
            wait_timeout: "30s",
            on_wait_timeout: "CONTINUE",
        };

        let url = format!("{}{STATEMENTS_PATH}", self.base_url);
        tracing::debug!(%sql, catalog = ?request.catalog, "submitting statement");
        let mut req = self.client.post(&url).json(&request);
        if let Some(token) = &self.token {
            req = req.bearer_auth(token);
        }
        let mut response = self.send(req).await?;

        let mut polls = 0;
        while response.status.state.is_running() {
            if polls >= self.max_polls {
                return Err(Error::connectivity(format!(
                    "statement {} did not finish after {polls} status polls",
                    response.statement_id
                )));
            }
            polls += 1;
            tokio::time::sleep(self.poll_interval).await;
            tracing::debug!(statement_id = %response.statement_id, polls, "polling statement status");

            let url = format!("{}{STATEMENTS_PATH}/{}", self.base_url, response.statement_id);
            let mut req = self.client.get(&url);
            if let Some(token) = &self.token {
                req = req.bearer_auth(token);
            }
            response = self.send(req).await?;
        }

        match response.status.state {
            StatementState::Succeeded => Ok(response
                .result
                .map(|r| r.data_array)
                .unwrap_or_default()),
            StatementState::Failed => {
                let error = response.status.error.unwrap_or_default();
                Err(Error::from_platform(
                    error.error_code.unwrap_or_else(|| "UNKNOWN".to_string()),
                    error.message.unwrap_or_default(),
                ))
            }
            state => Err(Error::Platform {
                code: state.to_string(),
                message: format!("statement {} ended in state {state}", response.statement_id),
            }),
        }
    }

    async fn send(&self, req: reqwest::RequestBuilder) -> medallion_core::Result<StatementResponse> {
        let response = req.send().await.map_err(|e| {
            Error::connectivity_with_source(format!("failed to reach {}", self.base_url), e)
        })?;

        let status = response.status();
        if status.is_success() {
            return response.json().await.map_err(|e| Error::Platform {
                code: "INVALID_RESPONSE".to_string(),
                message: format!("failed to parse statement response: {e}"),
            });
        }

        let body = response.text().await.unwrap_or_default();
        Err(http_error(status, &body))
    }
}

/// Maps a non-success HTTP response to a classified error.
fn http_error(status: StatusCode, body: &str) -> Error {
    let parsed: ServiceError = serde_json::from_str(body).unwrap_or_default();
    let message = parsed.message.unwrap_or_else(|| body.to_string());

    if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
        return match parsed.error_code {
            Some(code) => Error::connectivity_with_code(code, format!("HTTP {status}: {message}")),
            None => Error::connectivity(format!("HTTP {status}: {message}")),
        };
    }
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        let code = parsed.error_code.unwrap_or_else(|| {
            if status == StatusCode::UNAUTHORIZED {
                "UNAUTHENTICATED".to_string()
            } else {
                "PERMISSION_DENIED".to_string()
            }
        });
        return Error::PermissionDenied { code, message };
    }
    let code = parsed
        .error_code
        .unwrap_or_else(|| format!("HTTP_{}", status.as_u16()));
    Error::from_platform(code, message)
}

fn poisoned() -> Error {
    Error::Platform {
        code: "INTERNAL_ERROR".to_string(),
        message: "statement client session lock poisoned".to_string(),
    }
}

fn normalize_host(host: &str) -> String {
    let host = host.trim().trim_end_matches('/');
    if host.starts_with("http://") || host.starts_with("https://") {
        host.to_string()
    } else {
        format!("https://{host}")
    }
}

fn first_column(rows: Vec<Vec<Option<String>>>) -> Vec<String> {
    rows.into_iter()
        .filter_map(|row| row.into_iter().next().flatten())
        .collect()
}

#[async_trait]
impl Platform for StatementClient {
    async fn execute(&self, statement: &Statement) -> medallion_core::Result<()> {
        self.run_sql(&statement.sql()).await?;
        if let Statement::UseCatalog { catalog } = statement {
            *self.session_catalog.lock().map_err(|_| poisoned())? = Some(catalog.clone());
        }
        Ok(())
    }

    async fn list_catalogs(&self) -> medallion_core::Result<Vec<CatalogName>> {
        let rows = self.run_sql("SHOW CATALOGS").await?;
        Ok(first_column(rows)
            .into_iter()
            .map(CatalogName::new_unchecked)
            .collect())
    }

    async fn list_schemas(&self, catalog: &CatalogName) -> medallion_core::Result<Vec<SchemaName>> {
        let rows = self.run_sql(&format!("SHOW SCHEMAS IN {catalog}")).await?;
        Ok(first_column(rows)
            .into_iter()
            .map(SchemaName::new_unchecked)
            .collect())
    }
}

// ============================================================================
// API Types
// ============================================================================

/// Request to execute a statement.
#[derive(Debug, Serialize)]
struct ExecuteStatementRequest<'a> {
    statement: &'a str,
    warehouse_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    catalog: Option<&'a str>,
    wait_timeout: &'static str,
    on_wait_timeout: &'static str,
}

/// Statement execution response.
#[derive(Debug, Deserialize)]
pub struct StatementResponse {
    /// Statement ID.
    pub statement_id: String,
    /// Execution status.
    pub status: StatementStatus,
    /// Result rows, when the statement produced any.
    #[serde(default)]
    pub result: Option<ResultData>,
}

/// Statement execution status.
#[derive(Debug, Deserialize)]
pub struct StatementStatus {
    /// Current state.
    pub state: StatementState,
    /// Error details for failed statements.
    #[serde(default)]
    pub error: Option<ServiceError>,
}

/// Statement state values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StatementState {
    /// Queued for execution.
    Pending,
    /// Executing.
    Running,
    /// Completed successfully.
    Succeeded,
    /// Failed.
    Failed,
    /// Cancelled.
    Canceled,
    /// Result expired or closed.
    Closed,
}

impl StatementState {
    /// True while the statement has not reached a terminal state.
    #[must_use]
    pub fn is_running(self) -> bool {
        matches!(self, Self::Pending | Self::Running)
    }
}

impl std::fmt::Display for StatementState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Pending => "PENDING",
            Self::Running => "RUNNING",
            Self::Succeeded => "SUCCEEDED",
            Self::Failed => "FAILED",
            Self::Canceled => "CANCELED",
            Self::Closed => "CLOSED",
        };
        write!(f, "{s}")
    }
}

/// Native error payload.
#[derive(Debug, Default, Deserialize)]
pub struct ServiceError {
    /// Platform error code.
    #[serde(default)]
    pub error_code: Option<String>,
    /// Platform error message.
    #[serde(default)]
    pub message: Option<String>,
}

/// Inline result rows.
#[derive(Debug, Default, Deserialize)]
pub struct ResultData {
    /// Rows as arrays of nullable strings.
    #[serde(default)]
    pub data_array: Vec<Vec<Option<String>>>,
}
