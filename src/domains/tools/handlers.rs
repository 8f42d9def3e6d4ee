//! Tool handler contract.
//!
//! Every adapter in `definitions/` implements [`ToolHandler`]. A handler
//! owns its input contract completely: it parses and validates its own
//! arguments, and the dispatcher never looks inside them.

use rmcp::model::JsonObject;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

use super::error::ToolError;
use crate::domains::registry::{InputContract, ServerManifest, ToolDescriptor};

/// Output from a successful tool execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolOutput {
    /// The result data from the tool.
    pub data: Value,

    /// Non-fatal notes surfaced in the envelope metadata.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl ToolOutput {
    pub fn new(data: Value) -> Self {
        Self {
            data,
            warnings: Vec::new(),
        }
    }

    pub fn with_warning(mut self, warning: impl Into<String>) -> Self {
        self.warnings.push(warning.into());
        self
    }
}

/// Trait implemented by every callable tool.
#[async_trait::async_trait]
pub trait ToolHandler: Send + Sync {
    /// Static metadata; the input contract is filled in from `input_schema`.
    fn descriptor(&self) -> ToolDescriptor;

    /// JSON Schema of the arguments this tool accepts.
    fn input_schema(&self) -> Arc<JsonObject>;

    /// Execute the tool with the given arguments.
    async fn execute(&self, arguments: Value) -> Result<ToolOutput, ToolError>;

    /// Tool name, unique within its server.
    fn name(&self) -> String {
        self.descriptor().name
    }

    /// The descriptor as published in the registry.
    fn published_descriptor(&self) -> ToolDescriptor {
        self.descriptor()
            .input_contract(InputContract::from_schema(&self.input_schema()))
    }
}

/// Parse handler arguments into a typed params struct.
///
/// A missing body (`null`) is treated as an empty object so tools whose
/// fields are all optional can be called without arguments.
pub fn parse_arguments<T: serde::de::DeserializeOwned>(arguments: Value) -> Result<T, ToolError> {
    let arguments = match arguments {
        Value::Null => Value::Object(Default::default()),
        other => other,
    };
    serde_json::from_value(arguments).map_err(ToolError::from)
}

/// Manifest header for one integrated external system.
#[derive(Debug, Clone)]
pub struct ServerInfo {
    pub name: &'static str,
    pub description: &'static str,
    pub version: &'static str,
    pub cli_prefix: Option<&'static str>,
    pub api_base_url: Option<String>,
    pub documentation: &'static str,
}

/// A server header together with its ordered tool handlers.
#[derive(Clone)]
pub struct ServerDefinition {
    pub info: ServerInfo,
    pub tools: Vec<Arc<dyn ToolHandler>>,
}

impl ServerDefinition {
    pub fn new(info: ServerInfo) -> Self {
        Self {
            info,
            tools: Vec::new(),
        }
    }

    pub fn with_tool<H: ToolHandler + 'static>(mut self, handler: H) -> Self {
        self.tools.push(Arc::new(handler));
        self
    }

    pub fn name(&self) -> &str {
        self.info.name
    }

    /// The manifest this definition publishes in the registry.
    pub fn manifest(&self) -> ServerManifest {
        ServerManifest {
            name: self.info.name.to_string(),
            description: self.info.description.to_string(),
            version: self.info.version.to_string(),
            cli_prefix: self.info.cli_prefix.map(str::to_string),
            api_base_url: self.info.api_base_url.clone(),
            tools: self
                .tools
                .iter()
                .map(|tool| tool.published_descriptor())
                .collect(),
            documentation: self.info.documentation.to_string(),
        }
    }
}

impl std::fmt::Debug for ServerDefinition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerDefinition")
            .field("info", &self.info)
            .field(
                "tools",
                &self.tools.iter().map(|t| t.name()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::registry::ExecutionType;
    use rmcp::handler::server::tool::cached_schema_for_type;
    use schemars::JsonSchema;
    use serde_json::json;

    #[derive(Debug, Deserialize, JsonSchema)]
    struct EchoParams {
        /// Text to echo back.
        text: String,
        #[serde(default)]
        #[allow(dead_code)]
        upper: bool,
    }

    struct EchoTool;

    #[async_trait::async_trait]
    impl ToolHandler for EchoTool {
        fn descriptor(&self) -> ToolDescriptor {
            ToolDescriptor::new("echo", "Echo text", ExecutionType::Api)
        }

        fn input_schema(&self) -> Arc<JsonObject> {
            cached_schema_for_type::<EchoParams>()
        }

        async fn execute(&self, arguments: Value) -> Result<ToolOutput, ToolError> {
            let params: EchoParams = parse_arguments(arguments)?;
            Ok(ToolOutput::new(json!({ "text": params.text })))
        }
    }

    fn definition() -> ServerDefinition {
        ServerDefinition::new(ServerInfo {
            name: "demo",
            description: "Demo server",
            version: "0.1.0",
            cli_prefix: None,
            api_base_url: Some("https://demo.example.com".to_string()),
            documentation: "demo/README.md",
        })
        .with_tool(EchoTool)
    }

    #[test]
    fn test_manifest_includes_input_contract() {
        let manifest = definition().manifest();
        assert_eq!(manifest.name, "demo");
        let echo = manifest.tool("echo").unwrap();
        let text = echo.input_contract.field("text").unwrap();
        assert!(text.required);
        assert_eq!(text.kind, "string");
        assert!(!echo.input_contract.field("upper").unwrap().required);
    }

    #[tokio::test]
    async fn test_parse_arguments_rejects_bad_input() {
        let err = EchoTool.execute(json!({ "text": 5 })).await.unwrap_err();
        assert_eq!(err.code(), "INVALID_ARGUMENTS");

        let err = EchoTool.execute(Value::Null).await.unwrap_err();
        assert_eq!(err.code(), "INVALID_ARGUMENTS");
    }

    #[tokio::test]
    async fn test_execute_ok() {
        let output = EchoTool.execute(json!({ "text": "hi" })).await.unwrap();
        assert_eq!(output.data["text"], "hi");
        assert!(output.warnings.is_empty());
    }
}
