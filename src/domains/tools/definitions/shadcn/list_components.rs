//! shadcn/ui registry listing tool.

use reqwest::Client;
use rmcp::{handler::server::tool::cached_schema_for_type, model::JsonObject};
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::{debug, instrument};

use crate::domains::registry::{ExecutionType, ToolDescriptor};
use crate::domains::tools::definitions::common::{api_get_json, http_client};
use crate::domains::tools::{ToolError, ToolHandler, ToolOutput, parse_arguments};

#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
pub struct ListComponentsParams {
    /// Case-insensitive substring to match against component names.
    #[serde(default)]
    pub query: Option<String>,

    /// Registry item type, e.g. "registry:ui" or "registry:block".
    #[serde(default, rename = "type")]
    pub item_type: Option<String>,
}

pub struct ShadcnListComponentsTool {
    client: Client,
    registry_url: String,
}

impl ShadcnListComponentsTool {
    pub const NAME: &'static str = "list_components";

    pub const DESCRIPTION: &'static str = "List components published in the shadcn/ui registry, optionally filtered by name or item type.";

    pub fn new(registry_url: impl Into<String>) -> Self {
        Self {
            client: http_client(),
            registry_url: registry_url.into(),
        }
    }

    fn index_url(&self) -> String {
        format!("{}/index.json", self.registry_url.trim_end_matches('/'))
    }
}

/// Apply the filters to the registry index.
fn filter_index(index: &Value, params: &ListComponentsParams) -> Result<Vec<Value>, ToolError> {
    let items = index
        .as_array()
        .or_else(|| index.get("items").and_then(Value::as_array))
        .ok_or_else(|| ToolError::upstream(None, None, "registry index is not a list"))?;

    let query = params
        .query
        .as_deref()
        .map(|q| q.trim().to_lowercase())
        .filter(|q| !q.is_empty());
    let item_type = params.item_type.as_deref().map(str::trim).filter(|t| !t.is_empty());

    Ok(items
        .iter()
        .filter(|item| {
            let name = item.get("name").and_then(Value::as_str).unwrap_or_default();
            query
                .as_deref()
                .is_none_or(|q| name.to_lowercase().contains(q))
        })
        .filter(|item| {
            item_type.is_none_or(|t| item.get("type").and_then(Value::as_str) == Some(t))
        })
        .map(|item| {
            json!({
                "name": item.get("name"),
                "type": item.get("type"),
                "dependencies": item.get("dependencies").cloned().unwrap_or_else(|| json!([])),
                "registryDependencies": item.get("registryDependencies").cloned().unwrap_or_else(|| json!([])),
            })
        })
        .collect())
}

#[async_trait::async_trait]
impl ToolHandler for ShadcnListComponentsTool {
    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor::new(Self::NAME, Self::DESCRIPTION, ExecutionType::Api)
            .alias("shadcn-list-components")
            .endpoint("GET /index.json")
            .tags(&["shadcn", "ui", "components", "registry"])
            .example(
                json!({ "query": "button" }),
                json!({ "count": 1, "components": [{ "name": "button", "type": "registry:ui" }] }),
            )
    }

    fn input_schema(&self) -> Arc<JsonObject> {
        cached_schema_for_type::<ListComponentsParams>()
    }

    #[instrument(skip_all)]
    async fn execute(&self, arguments: Value) -> Result<ToolOutput, ToolError> {
        let params: ListComponentsParams = parse_arguments(arguments)?;
        let index = api_get_json(&self.client, &self.index_url(), None, &[]).await?;
        let components = filter_index(&index, &params)?;
        debug!("{} shadcn components matched", components.len());

        Ok(ToolOutput::new(json!({
            "count": components.len(),
            "components": components,
        })))
    }
}
