//! HTTP transport implementation.
//!
//! REST catalog API under `/mcp`. Discovery routes answer
//! `{"success": true, "data": ...}` or
//! `{"success": false, "error": {"code", "message"}}` with a matching status.
//! The run route always answers 200 with an execution envelope, so callers
//! handle "tool not found" and "tool failed" the same way.

use axum::{
    Json, Router,
    body::Bytes,
    extract::{Path, Query, State, rejection::QueryRejection},
    http::{Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::io;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, instrument, warn};

use super::service::shutdown_signal;
use super::{TransportError, TransportResult, config::HttpConfig};
use crate::core::McpServer;
use crate::domains::registry::{
    RegistryDocument, ServerManifest,
    search::{list_servers, search_tools, stats},
};
use crate::domains::tools::{ExecutionEnvelope, ExecutionMetadata, HistoryQuery, ToolError};

pub struct HttpTransport {
    config: HttpConfig,
}

/// Successful discovery response body.
#[derive(Debug, Serialize)]
pub struct ApiSuccess<T> {
    success: bool,
    data: T,
}

/// Failed discovery response.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    code: &'static str,
    message: String,
}

impl ApiError {
    fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
        }
    }

    fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, "NOT_FOUND", message)
    }

    fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "INVALID_ARGUMENTS", message)
    }

    fn bad_query(rejection: QueryRejection) -> Self {
        Self::bad_request(format!("Invalid query string: {}", rejection.body_text()))
    }

    fn registry_unavailable() -> Self {
        Self::new(
            StatusCode::SERVICE_UNAVAILABLE,
            "REGISTRY_UNAVAILABLE",
            "The tool registry is not loaded; run `generate-registry` or POST /mcp/reload",
        )
    }

    fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            warn!("{} {}: {}", self.status, self.code, self.message);
        }
        let body = json!({
            "success": false,
            "error": { "code": self.code, "message": self.message },
        });
        (self.status, Json(body)).into_response()
    }
}

type ApiResult<T> = Result<Json<ApiSuccess<T>>, ApiError>;

fn ok<T: Serialize>(data: T) -> ApiResult<T> {
    Ok(Json(ApiSuccess {
        success: true,
        data,
    }))
}

impl HttpTransport {
    pub fn new(config: HttpConfig) -> Self {
        Self { config }
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.config.host, self.config.port)
    }

    /// The full route table over `server`.
    pub fn router(server: McpServer, enable_cors: bool) -> Router {
        let mut app = Router::new()
            .route("/", get(root_handler))
            .route("/mcp/health", get(health_check))
            .route("/mcp/stats", get(get_stats))
            .route("/mcp/servers", get(get_servers))
            .route("/mcp/servers/{server}", get(get_server))
            .route("/mcp/servers/{server}/docs", get(get_server_docs))
            .route("/mcp/servers/{server}/tools", get(get_server_tools))
            .route("/mcp/servers/{server}/tools/{tool}", get(get_tool))
            .route("/mcp/servers/{server}/tools/{tool}/run", post(run_tool))
            .route("/mcp/tools/search", get(search))
            .route("/mcp/history", get(get_history))
            .route("/mcp/reload", post(reload))
            .fallback(route_not_found)
            .method_not_allowed_fallback(method_not_allowed)
            .with_state(server)
            .layer(TraceLayer::new_for_http());

        if enable_cors {
            let cors = CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any);
            app = app.layer(cors);
        }

        app
    }

    /// Bind and serve until a shutdown signal arrives.
    pub async fn run(self, server: McpServer) -> TransportResult<()> {
        let addr = self.address();
        let app = Self::router(server, self.config.enable_cors);

        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .map_err(|e| TransportError::bind(&addr, e))?;

        let cors_status = if self.config.enable_cors {
            "enabled"
        } else {
            "disabled"
        };
        info!("Ready - listening on http://{} (CORS {})", addr, cors_status);
        info!("  → Catalog:  GET  /mcp/servers, /mcp/tools/search?q=");
        info!("  → Execute:  POST /mcp/servers/{{server}}/tools/{{tool}}/run");
        info!("  → Health:   GET  /mcp/health");

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| TransportError::serve(&addr, e))?;

        info!("HTTP transport stopped");
        Ok(())
    }
}

fn snapshot(server: &McpServer) -> Result<Arc<RegistryDocument>, ApiError> {
    server
        .registry_snapshot()
        .ok_or_else(ApiError::registry_unavailable)
}

fn find_server<'a>(doc: &'a RegistryDocument, name: &str) -> Result<&'a ServerManifest, ApiError> {
    doc.server(name)
        .ok_or_else(|| ApiError::not_found(format!("Server '{}' not found", name)))
}

async fn route_not_found(method: Method, uri: Uri) -> ApiError {
    ApiError::not_found(format!("No route for {} {}", method, uri.path()))
}

async fn method_not_allowed(method: Method, uri: Uri) -> ApiError {
    ApiError::new(
        StatusCode::METHOD_NOT_ALLOWED,
        "METHOD_NOT_ALLOWED",
        format!("{} is not allowed on {}", method, uri.path()),
    )
}

async fn root_handler(State(server): State<McpServer>) -> impl IntoResponse {
    Json(json!({
        "name": server.name(),
        "version": server.version(),
        "transport": "HTTP",
        "endpoints": {
            "servers": "GET /mcp/servers",
            "server": "GET /mcp/servers/{server}",
            "docs": "GET /mcp/servers/{server}/docs",
            "tools": "GET /mcp/servers/{server}/tools",
            "tool": "GET /mcp/servers/{server}/tools/{tool}",
            "run": "POST /mcp/servers/{server}/tools/{tool}/run",
            "search": "GET /mcp/tools/search?q=",
            "stats": "GET /mcp/stats",
            "history": "GET /mcp/history",
            "reload": "POST /mcp/reload",
            "health": "GET /mcp/health"
        }
    }))
}

async fn health_check(State(server): State<McpServer>) -> impl IntoResponse {
    Json(server.health())
}

async fn get_stats(State(server): State<McpServer>) -> ApiResult<Value> {
    let doc = snapshot(&server)?;
    ok(json!({
        "registry": stats(&doc),
        "executions": server.history().len(),
        "uptimeSecs": server.uptime().as_secs(),
    }))
}

async fn get_servers(State(server): State<McpServer>) -> ApiResult<Value> {
    let doc = snapshot(&server)?;
    let servers = list_servers(&doc);
    ok(json!({ "count": servers.len(), "servers": servers }))
}

async fn get_server(
    State(server): State<McpServer>,
    Path(name): Path<String>,
) -> ApiResult<ServerManifest> {
    let doc = snapshot(&server)?;
    ok(find_server(&doc, &name)?.clone())
}

async fn get_server_tools(
    State(server): State<McpServer>,
    Path(name): Path<String>,
) -> ApiResult<Value> {
    let doc = snapshot(&server)?;
    let manifest = find_server(&doc, &name)?;
    ok(json!({
        "server": manifest.name,
        "count": manifest.tools.len(),
        "tools": manifest.tools,
    }))
}

async fn get_tool(
    State(server): State<McpServer>,
    Path((name, tool)): Path<(String, String)>,
) -> ApiResult<Value> {
    let doc = snapshot(&server)?;
    let manifest = find_server(&doc, &name)?;
    let descriptor = manifest.tool(&tool).ok_or_else(|| {
        ApiError::not_found(format!("Tool '{}' not found on server '{}'", tool, name))
    })?;
    ok(json!({ "server": manifest.name, "tool": descriptor }))
}

async fn get_server_docs(
    State(server): State<McpServer>,
    Path(name): Path<String>,
) -> ApiResult<Value> {
    let doc = snapshot(&server)?;
    let manifest = find_server(&doc, &name)?;

    match server.sources().read(&manifest.documentation) {
        Ok(content) => ok(json!({
            "server": manifest.name,
            "path": manifest.documentation,
            "content": content.as_str(),
        })),
        Err(e) if matches!(e.kind(), io::ErrorKind::NotFound | io::ErrorKind::InvalidInput) => {
            Err(ApiError::not_found(format!(
                "No documentation at '{}' for server '{}'",
                manifest.documentation, name
            )))
        }
        Err(e) => Err(ApiError::internal(format!(
            "Cannot read documentation for '{}': {}",
            name, e
        ))),
    }
}

#[derive(Debug, Deserialize)]
struct SearchParams {
    #[serde(default)]
    q: Option<String>,
}

async fn search(
    State(server): State<McpServer>,
    params: Result<Query<SearchParams>, QueryRejection>,
) -> ApiResult<Value> {
    let Query(params) = params.map_err(ApiError::bad_query)?;
    let query = params.q.unwrap_or_default();
    if query.trim().is_empty() {
        return Err(ApiError::bad_request("Query parameter 'q' must not be blank"));
    }

    let doc = snapshot(&server)?;
    let results = search_tools(&doc, &query);
    ok(json!({
        "query": query.trim(),
        "count": results.len(),
        "results": results,
    }))
}

async fn get_history(
    State(server): State<McpServer>,
    query: Result<Query<HistoryQuery>, QueryRejection>,
) -> ApiResult<Value> {
    let Query(query) = query.map_err(ApiError::bad_query)?;
    let records = server.history().list(&query);
    ok(json!({ "count": records.len(), "records": records }))
}

async fn reload(State(server): State<McpServer>) -> ApiResult<Value> {
    let doc = server.reload().ok_or_else(ApiError::registry_unavailable)?;
    ok(json!({ "reloaded": true, "registry": stats(&doc) }))
}

/// Execute a tool. Always 200; the envelope carries success or failure.
#[instrument(skip(server, body))]
async fn run_tool(
    State(server): State<McpServer>,
    Path((name, tool)): Path<(String, String)>,
    body: Bytes,
) -> Json<ExecutionEnvelope> {
    let arguments = if body.iter().all(u8::is_ascii_whitespace) {
        Value::Null
    } else {
        match serde_json::from_slice::<Value>(&body) {
            Ok(value) => value,
            Err(e) => {
                warn!("Malformed request body for {}/{}: {}", name, tool, e);
                let envelope = ExecutionEnvelope::from_error(
                    &ToolError::invalid_arguments(format!("Request body is not valid JSON: {}", e)),
                    ExecutionMetadata::new(&name, &tool, None),
                );
                server.history().record(&envelope);
                return Json(envelope);
            }
        }
    };

    Json(server.run_tool(&name, &tool, arguments).await)
}
