//! Fake SQL warehouse for HTTP client tests.
//!
//! Serves the subset of the SQL Statement Execution API the CLI uses:
//! - `POST /api/2.0/sql/statements`
//! - `GET /api/2.0/sql/statements/:statement_id`
//!
//! Statements are parsed and executed against an [`InMemoryPlatform`], so
//! privilege denial, reachability and naming conflicts configured on the
//! platform surface as native error payloads.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use medallion_core::{
    CatalogName, Error, InMemoryPlatform, Platform, SchemaName, SchemaRef, Statement,
};
use serde::Deserialize;
use serde_json::{Value, json};
use tokio::sync::oneshot;

pub use axum::http::StatusCode;

/// A statement request as received by the warehouse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceivedStatement {
    /// SQL text.
    pub statement: String,
    /// Catalog context sent with the request.
    pub catalog: Option<String>,
    /// Warehouse the request targeted.
    pub warehouse_id: String,
}

#[derive(Debug, Deserialize)]
struct StatementRequest {
    statement: String,
    warehouse_id: String,
    #[serde(default)]
    catalog: Option<String>,
}

#[derive(Debug, Default)]
struct Behaviour {
    token: Option<String>,
    pending_polls: u32,
    http_failure: Option<StatusCode>,
}

#[derive(Clone)]
struct ServerState {
    platform: InMemoryPlatform,
    behaviour: Arc<Mutex<Behaviour>>,
    received: Arc<Mutex<Vec<ReceivedStatement>>>,
    /// Finished responses for statements still reported as running.
    pending: Arc<Mutex<HashMap<String, (u32, Value)>>>,
}

/// An HTTP SQL warehouse on `127.0.0.1:0`.
pub struct FakeWarehouse {
    state: ServerState,
    base_url: String,
    shutdown_tx: Option<oneshot::Sender<()>>,
    _task: tokio::task::JoinHandle<()>,
}

impl std::fmt::Debug for FakeWarehouse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FakeWarehouse")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl FakeWarehouse {
    /// Starts a warehouse backed by `platform`.
    ///
    /// # Errors
    ///
    /// Returns an error if the listener cannot be bound.
    pub async fn start(platform: InMemoryPlatform) -> std::io::Result<Self> {
        let state = ServerState {
            platform,
            behaviour: Arc::default(),
            received: Arc::default(),
            pending: Arc::default(),
        };

        let app = Router::new()
            .route("/api/2.0/sql/statements", post(submit_statement))
            .route("/api/2.0/sql/statements/:statement_id", get(get_statement))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr: SocketAddr = listener.local_addr()?;
        let base_url = format!("http://{addr}");
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

        let task = tokio::spawn(async move {
            let server = axum::serve(listener, app).with_graceful_shutdown(async move {
                let _ = shutdown_rx.await;
            });
            let _ = server.await;
        });

        Ok(Self {
            state,
            base_url,
            shutdown_tx: Some(shutdown_tx),
            _task: task,
        })
    }

    /// Returns the server base URL (e.g., `http://127.0.0.1:12345`).
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Returns the backing platform.
    #[must_use]
    pub fn platform(&self) -> &InMemoryPlatform {
        &self.state.platform
    }

    /// Requires `Authorization: Bearer <token>` on every request.
    pub fn require_token(&self, token: impl Into<String>) {
        self.state.behaviour.lock().expect("lock").token = Some(token.into());
    }

    /// Reports each statement as `RUNNING` for `polls` status requests
    /// before returning its result.
    pub fn delay_results(&self, polls: u32) {
        self.state.behaviour.lock().expect("lock").pending_polls = polls;
    }

    /// Answers every request with the given HTTP status.
    pub fn fail_with_status(&self, status: StatusCode) {
        self.state.behaviour.lock().expect("lock").http_failure = Some(status);
    }

    /// Returns every statement request received, in order.
    #[must_use]
    pub fn received(&self) -> Vec<ReceivedStatement> {
        self.state.received.lock().expect("lock").clone()
    }

    /// Returns the SQL text of every statement received, in order.
    #[must_use]
    pub fn received_sql(&self) -> Vec<String> {
        self.received().into_iter().map(|r| r.statement).collect()
    }
}

impl Drop for FakeWarehouse {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

fn check_request(state: &ServerState, headers: &HeaderMap) -> Option<Response> {
    let behaviour = state.behaviour.lock().expect("lock");
    if let Some(status) = behaviour.http_failure {
        return Some(
            (
                status,
                Json(json!({"error_code": "TEMPORARILY_UNAVAILABLE", "message": "warehouse unavailable"})),
            )
                .into_response(),
        );
    }
    if let Some(token) = &behaviour.token {
        let expected = format!("Bearer {token}");
        let provided = headers
            .get("authorization")
            .and_then(|v| v.to_str().ok());
        if provided != Some(expected.as_str()) {
            return Some(
                (
                    StatusCode::FORBIDDEN,
                    Json(json!({"error_code": "PERMISSION_DENIED", "message": "Invalid access token."})),
                )
                    .into_response(),
            );
        }
    }
    None
}

async fn submit_statement(
    State(state): State<ServerState>,
    headers: HeaderMap,
    Json(request): Json<StatementRequest>,
) -> Response {
    if let Some(rejection) = check_request(&state, &headers) {
        return rejection;
    }

    state.received.lock().expect("lock").push(ReceivedStatement {
        statement: request.statement.clone(),
        catalog: request.catalog.clone(),
        warehouse_id: request.warehouse_id.clone(),
    });

    let statement_id = uuid::Uuid::new_v4().to_string();
    tracing::debug!(%statement_id, statement = %request.statement, catalog = ?request.catalog, "fake warehouse received statement");
    let result = run_sql(&state.platform, &request.statement, request.catalog.as_deref()).await;
    let body = match result {
        Ok(rows) => json!({
            "statement_id": statement_id,
            "status": {"state": "SUCCEEDED"},
            "result": {"data_array": rows},
        }),
        Err(err) => json!({
            "statement_id": statement_id,
            "status": {
                "state": "FAILED",
                "error": {"error_code": native_code(&err), "message": native_message(&err)},
            },
        }),
    };

    let polls = state.behaviour.lock().expect("lock").pending_polls;
    if polls == 0 {
        return Json(body).into_response();
    }
    state
        .pending
        .lock()
        .expect("lock")
        .insert(statement_id.clone(), (polls, body));
    Json(json!({"statement_id": statement_id, "status": {"state": "PENDING"}})).into_response()
}

async fn get_statement(
    State(state): State<ServerState>,
    headers: HeaderMap,
    Path(statement_id): Path<String>,
) -> Response {
    if let Some(rejection) = check_request(&state, &headers) {
        return rejection;
    }

    let mut pending = state.pending.lock().expect("lock");
    let Some((remaining, body)) = pending.get_mut(&statement_id) else {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({"error_code": "NOT_FOUND", "message": format!("statement {statement_id} not found")})),
        )
            .into_response();
    };

    *remaining = remaining.saturating_sub(1);
    if *remaining > 0 {
        return Json(json!({"statement_id": statement_id, "status": {"state": "RUNNING"}}))
            .into_response();
    }
    let body = body.clone();
    pending.remove(&statement_id);
    Json(body).into_response()
}

fn native_code(err: &Error) -> String {
    err.platform_code().unwrap_or("TEMPORARILY_UNAVAILABLE").to_string()
}

fn native_message(err: &Error) -> String {
    match err {
        Error::PermissionDenied { message, .. }
        | Error::NamingConflict { message, .. }
        | Error::NotFound { message, .. }
        | Error::Platform { message, .. }
        | Error::Connectivity { message, .. }
        | Error::InvalidName { message }
        | Error::InvalidLayout { message } => message.clone(),
    }
}

fn syntax_error(sql: &str) -> Error {
    Error::Platform {
        code: "PARSE_SYNTAX_ERROR".to_string(),
        message: format!("[PARSE_SYNTAX_ERROR] Syntax error in statement: {sql}"),
    }
}

/// Executes one SQL statement; returns result rows for `SHOW` statements.
async fn run_sql(
    platform: &InMemoryPlatform,
    sql: &str,
    catalog_context: Option<&str>,
) -> medallion_core::Result<Vec<Vec<String>>> {
    let trimmed = sql.trim().trim_end_matches(';').trim();
    let words: Vec<&str> = trimmed.split_whitespace().collect();
    let upper: Vec<String> = words.iter().map(|w| w.to_ascii_uppercase()).collect();
    let upper: Vec<&str> = upper.iter().map(String::as_str).collect();

    let statement = match upper.as_slice() {
        ["SHOW", "CATALOGS"] => {
            let catalogs = platform.list_catalogs().await?;
            return Ok(catalogs.into_iter().map(|c| vec![c.to_string()]).collect());
        }
        ["SHOW", "SCHEMAS", "IN", _] => {
            let catalog = CatalogName::new(words[3]).map_err(|_| syntax_error(sql))?;
            let schemas = platform.list_schemas(&catalog).await?;
            return Ok(schemas.into_iter().map(|s| vec![s.to_string()]).collect());
        }
        ["CREATE", "CATALOG", "IF", "NOT", "EXISTS", _] => Statement::CreateCatalog {
            catalog: CatalogName::new(words[5]).map_err(|_| syntax_error(sql))?,
        },
        ["USE", "CATALOG", _] => Statement::UseCatalog {
            catalog: CatalogName::new(words[2]).map_err(|_| syntax_error(sql))?,
        },
        ["CREATE", "SCHEMA", "IF", "NOT", "EXISTS", _] => {
            let name = words[5];
            let schema = if name.contains('.') {
                name.parse::<SchemaRef>().map_err(|_| syntax_error(sql))?
            } else {
                let Some(catalog) = catalog_context else {
                    return Err(Error::NotFound {
                        code: "NO_SUCH_CATALOG_EXCEPTION".to_string(),
                        message: "No catalog selected for unqualified schema name.".to_string(),
                    });
                };
                SchemaRef::new(
                    CatalogName::new(catalog).map_err(|_| syntax_error(sql))?,
                    SchemaName::new(name).map_err(|_| syntax_error(sql))?,
                )
            };
            Statement::CreateSchema { schema }
        }
        _ => return Err(syntax_error(sql)),
    };

    platform.execute(&statement).await?;
    Ok(Vec::new())
}
