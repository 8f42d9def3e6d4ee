//! Dispatch router - maps `(server, tool)` to a handler and wraps the result.
//!
//! The dispatcher never interprets arguments and never fails: unknown
//! routes, handler errors and handler panics all come back as ordinary
//! [`ExecutionEnvelope`]s.
//!
//! This module also builds the rmcp `ToolRouter` used by the STDIO
//! transport, exposing every handler as an MCP tool named `{server}_{tool}`.

use futures::FutureExt;
use rmcp::{
    ErrorData as McpError,
    handler::server::tool::{ToolCallContext, ToolRoute, ToolRouter},
    model::{CallToolResult, Content, Tool},
};
use serde_json::Value;
use std::collections::{BTreeSet, HashMap};
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, instrument, warn};

use super::envelope::{ExecutionEnvelope, ExecutionMetadata};
use super::error::ToolError;
use super::handlers::{ServerDefinition, ToolHandler};
use super::history::ExecutionHistory;
use crate::domains::registry::ExecutionType;

struct Route {
    handler: Arc<dyn ToolHandler>,
    execution_type: ExecutionType,
}

/// Handler table keyed by `(server, tool)`.
pub struct Dispatcher {
    routes: HashMap<(String, String), Route>,
}

impl Dispatcher {
    pub fn new(servers: &[ServerDefinition]) -> Self {
        let mut routes = HashMap::new();
        for server in servers {
            for handler in &server.tools {
                let descriptor = handler.descriptor();
                let key = (server.name().to_string(), descriptor.name.clone());
                if routes.contains_key(&key) {
                    warn!(
                        "Duplicate tool {}/{} ignored; the first registration wins",
                        key.0, key.1
                    );
                    continue;
                }
                routes.insert(
                    key,
                    Route {
                        handler: handler.clone(),
                        execution_type: descriptor.execution_type,
                    },
                );
            }
        }
        info!("Dispatcher ready with {} routes", routes.len());
        Self { routes }
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    pub fn contains(&self, server: &str, tool: &str) -> bool {
        self.routes
            .contains_key(&(server.to_string(), tool.to_string()))
    }

    /// Every routable `(server, tool)` pair.
    pub fn tool_pairs(&self) -> BTreeSet<(String, String)> {
        self.routes.keys().cloned().collect()
    }

    /// Invoke a tool and wrap whatever happens in an envelope.
    #[instrument(skip(self, arguments), fields(server = %server, tool = %tool))]
    pub async fn dispatch(&self, server: &str, tool: &str, arguments: Value) -> ExecutionEnvelope {
        let started = Instant::now();

        let Some(route) = self.routes.get(&(server.to_string(), tool.to_string())) else {
            warn!("Unknown tool requested: {}/{}", server, tool);
            let metadata = ExecutionMetadata::new(server, tool, None);
            return ExecutionEnvelope::from_error(
                &ToolError::not_found(format!("{}/{}", server, tool)),
                metadata,
            );
        };

        let mut metadata = ExecutionMetadata::new(server, tool, Some(route.execution_type));
        let outcome = AssertUnwindSafe(route.handler.execute(arguments))
            .catch_unwind()
            .await;
        metadata.execution_time_ms = started.elapsed().as_millis() as u64;

        match outcome {
            Ok(Ok(output)) => {
                info!("Tool {}/{} succeeded in {}ms", server, tool, metadata.execution_time_ms);
                metadata.warnings = output.warnings;
                ExecutionEnvelope::success(output.data, metadata)
            }
            Ok(Err(e)) => {
                warn!("Tool {}/{} failed: {}", server, tool, e);
                ExecutionEnvelope::from_error(&e, metadata)
            }
            Err(panic) => {
                let reason = panic
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| panic.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());
                error!("Tool {}/{} panicked: {}", server, tool, reason);
                ExecutionEnvelope::from_error(
                    &ToolError::internal(format!("tool panicked: {}", reason)),
                    metadata,
                )
            }
        }
    }
}

/// MCP tool name for a catalog tool.
pub fn mcp_tool_name(server: &str, tool: &str) -> String {
    format!("{}_{}", server, tool)
}

/// Build the rmcp tool router over every catalog tool.
pub fn build_tool_router<S>(
    servers: &[ServerDefinition],
    dispatcher: Arc<Dispatcher>,
    history: Arc<ExecutionHistory>,
) -> ToolRouter<S>
where
    S: Send + Sync + 'static,
{
    let mut router = ToolRouter::new();
    for server in servers {
        for handler in &server.tools {
            router = router.with_route(create_route(
                server.name(),
                handler.as_ref(),
                dispatcher.clone(),
                history.clone(),
            ));
        }
    }
    router
}

fn create_route<S>(
    server: &str,
    handler: &dyn ToolHandler,
    dispatcher: Arc<Dispatcher>,
    history: Arc<ExecutionHistory>,
) -> ToolRoute<S>
where
    S: Send + Sync + 'static,
{
    let descriptor = handler.descriptor();
    let tool = Tool {
        name: mcp_tool_name(server, &descriptor.name).into(),
        description: Some(descriptor.description.clone().into()),
        input_schema: handler.input_schema(),
        annotations: None,
        output_schema: None,
        icons: None,
        meta: None,
        title: Some(descriptor.alias.clone()),
    };

    let server = server.to_string();
    let tool_name = descriptor.name;
    ToolRoute::new_dyn(tool, move |ctx: ToolCallContext<'_, S>| {
        let args = ctx.arguments.clone().unwrap_or_default();
        let dispatcher = dispatcher.clone();
        let history = history.clone();
        let server = server.clone();
        let tool_name = tool_name.clone();
        async move {
            let envelope = dispatcher
                .dispatch(&server, &tool_name, Value::Object(args))
                .await;
            history.record(&envelope);
            envelope_to_result(&envelope)
        }
        .boxed()
    })
}

fn envelope_to_result(envelope: &ExecutionEnvelope) -> Result<CallToolResult, McpError> {
    let text = serde_json::to_string_pretty(envelope)
        .map_err(|e| McpError::internal_error(e.to_string(), None))?;
    if envelope.is_success() {
        Ok(CallToolResult::success(vec![Content::text(text)]))
    } else {
        Ok(CallToolResult::error(vec![Content::text(text)]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::registry::ToolDescriptor;
    use crate::domains::tools::handlers::{ServerInfo, ToolOutput, parse_arguments};
    use rmcp::handler::server::tool::cached_schema_for_type;
    use rmcp::model::JsonObject;
    use schemars::JsonSchema;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Deserialize, JsonSchema)]
    struct ModeParams {
        mode: String,
    }

    struct ModeTool;

    #[async_trait::async_trait]
    impl ToolHandler for ModeTool {
        fn descriptor(&self) -> ToolDescriptor {
            ToolDescriptor::new("toolA", "Behaves as told", ExecutionType::Cli)
        }

        fn input_schema(&self) -> Arc<JsonObject> {
            cached_schema_for_type::<ModeParams>()
        }

        async fn execute(&self, arguments: Value) -> Result<ToolOutput, ToolError> {
            let params: ModeParams = parse_arguments(arguments)?;
            match params.mode.as_str() {
                "ok" => Ok(ToolOutput::new(json!({ "done": true })).with_warning("slow upstream")),
                "fail" => Err(ToolError::upstream(Some(502), None, "bad gateway")),
                "panic" => panic!("handler exploded"),
                other => Err(ToolError::invalid_arguments(format!("unknown mode {}", other))),
            }
        }
    }

    fn servers() -> Vec<ServerDefinition> {
        vec![
            ServerDefinition::new(ServerInfo {
                name: "alpha",
                description: "Alpha",
                version: "1.0.0",
                cli_prefix: Some("alpha"),
                api_base_url: None,
                documentation: "alpha/README.md",
            })
            .with_tool(ModeTool),
        ]
    }

    #[tokio::test]
    async fn test_dispatch_success_carries_metadata() {
        let dispatcher = Dispatcher::new(&servers());
        let envelope = dispatcher.dispatch("alpha", "toolA", json!({ "mode": "ok" })).await;

        assert!(envelope.is_success());
        assert_eq!(envelope.data().unwrap()["done"], true);
        assert!(envelope.error().is_none());
        let meta = envelope.metadata();
        assert_eq!(meta.server, "alpha");
        assert_eq!(meta.tool, "toolA");
        assert_eq!(meta.execution_type, Some(ExecutionType::Cli));
        assert_eq!(meta.warnings, vec!["slow upstream".to_string()]);
    }

    #[tokio::test]
    async fn test_dispatch_unknown_tool_is_not_found() {
        let dispatcher = Dispatcher::new(&servers());

        let envelope = dispatcher.dispatch("alpha", "toolB", json!({})).await;
        assert!(!envelope.is_success());
        assert_eq!(envelope.error_code(), Some("NOT_FOUND"));

        let envelope = dispatcher.dispatch("omega", "toolA", json!({})).await;
        assert_eq!(envelope.error_code(), Some("NOT_FOUND"));
        assert!(envelope.data().is_none());
    }

    #[tokio::test]
    async fn test_dispatch_handler_error_is_captured() {
        let dispatcher = Dispatcher::new(&servers());
        let envelope = dispatcher.dispatch("alpha", "toolA", json!({ "mode": "fail" })).await;

        assert!(!envelope.is_success());
        let error = envelope.error().unwrap();
        assert_eq!(error.code, "UPSTREAM_ERROR");
        assert_eq!(error.details.as_ref().unwrap()["status"], 502);
    }

    #[tokio::test]
    async fn test_dispatch_survives_panicking_handler() {
        let dispatcher = Dispatcher::new(&servers());

        let envelope = dispatcher.dispatch("alpha", "toolA", json!({ "mode": "panic" })).await;
        assert_eq!(envelope.error_code(), Some("INTERNAL_ERROR"));
        assert!(envelope.error().unwrap().message.contains("handler exploded"));

        let envelope = dispatcher.dispatch("alpha", "toolA", json!({ "mode": "ok" })).await;
        assert!(envelope.is_success());
    }

    #[tokio::test]
    async fn test_dispatch_leaves_validation_to_handler() {
        let dispatcher = Dispatcher::new(&servers());
        let envelope = dispatcher.dispatch("alpha", "toolA", json!({ "wrong": 1 })).await;
        assert_eq!(envelope.error_code(), Some("INVALID_ARGUMENTS"));
    }

    #[test]
    fn test_tool_pairs() {
        let dispatcher = Dispatcher::new(&servers());
        assert_eq!(dispatcher.len(), 1);
        assert!(dispatcher.contains("alpha", "toolA"));
        assert!(
            dispatcher
                .tool_pairs()
                .contains(&("alpha".to_string(), "toolA".to_string()))
        );
    }

    #[test]
    fn test_build_router_names() {
        struct TestServer {}

        let servers = servers();
        let dispatcher = Arc::new(Dispatcher::new(&servers));
        let history = Arc::new(ExecutionHistory::new(10));
        let router: ToolRouter<TestServer> = build_tool_router(&servers, dispatcher, history);
        let tools = router.list_all();
        assert_eq!(tools.len(), 1);
        assert_eq!(tools[0].name.as_ref(), "alpha_toolA");
    }
}
