//! Supabase project listing via the management API.

use reqwest::Client;
use rmcp::{handler::server::tool::cached_schema_for_type, model::JsonObject};
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::{info, instrument};

use crate::core::config::CredentialsConfig;
use crate::domains::registry::{ExecutionType, ToolDescriptor};
use crate::domains::tools::definitions::common::{api_get_json, http_client, require_credential};
use crate::domains::tools::{ToolError, ToolHandler, ToolOutput, parse_arguments};

#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
pub struct ListProjectsParams {
    /// Case-insensitive substring to match against project names.
    #[serde(default)]
    pub name: Option<String>,
}

pub struct SupabaseListProjectsTool {
    client: Client,
    credentials: CredentialsConfig,
}

impl SupabaseListProjectsTool {
    pub const NAME: &'static str = "list_projects";

    pub const DESCRIPTION: &'static str = "List Supabase projects visible to the configured access token, with region, status and organization.";

    pub fn new(credentials: CredentialsConfig) -> Self {
        Self {
            client: http_client(),
            credentials,
        }
    }

    fn url(&self) -> String {
        format!(
            "{}/v1/projects",
            self.credentials.supabase_api_url.trim_end_matches('/')
        )
    }
}

fn summarize(body: &Value, name: Option<&str>) -> Result<Vec<Value>, ToolError> {
    let projects = body
        .as_array()
        .ok_or_else(|| ToolError::upstream(None, None, "project list is not an array"))?;
    let needle = name.map(|n| n.trim().to_lowercase()).filter(|n| !n.is_empty());

    Ok(projects
        .iter()
        .filter(|p| {
            needle.as_deref().is_none_or(|n| {
                p.get("name")
                    .and_then(Value::as_str)
                    .is_some_and(|name| name.to_lowercase().contains(n))
            })
        })
        .map(|p| {
            json!({
                "id": p.get("id"),
                "name": p.get("name"),
                "region": p.get("region"),
                "status": p.get("status"),
                "organizationId": p.get("organization_id"),
                "createdAt": p.get("created_at"),
            })
        })
        .collect())
}

#[async_trait::async_trait]
impl ToolHandler for SupabaseListProjectsTool {
    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor::new(Self::NAME, Self::DESCRIPTION, ExecutionType::Api)
            .alias("supabase-projects")
            .endpoint("GET /v1/projects")
            .tags(&["supabase", "database", "projects", "list"])
            .example(
                json!({}),
                json!({ "count": 1, "projects": [{ "id": "abcdefghijklmnopqrst", "name": "billing", "region": "eu-west-1" }] }),
            )
    }

    fn input_schema(&self) -> Arc<JsonObject> {
        cached_schema_for_type::<ListProjectsParams>()
    }

    #[instrument(skip_all)]
    async fn execute(&self, arguments: Value) -> Result<ToolOutput, ToolError> {
        let params: ListProjectsParams = parse_arguments(arguments)?;
        let token = require_credential(&self.credentials.supabase_access_token, "SUPABASE_ACCESS_TOKEN")?;

        info!("Listing Supabase projects");
        let body = api_get_json(&self.client, &self.url(), Some(token), &[]).await?;
        let projects = summarize(&body, params.name.as_deref())?;

        Ok(ToolOutput::new(json!({
            "count": projects.len(),
            "projects": projects,
        })))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body() -> Value {
        json!([
            { "id": "a1", "name": "Billing", "region": "eu-west-1", "status": "ACTIVE_HEALTHY", "organization_id": "org", "created_at": "2025-01-01T00:00:00Z", "database": {} },
            { "id": "b2", "name": "marketing-site", "region": "us-east-1", "status": "INACTIVE" }
        ])
    }

    #[test]
    fn test_summarize_all() {
        let projects = summarize(&body(), None).unwrap();
        assert_eq!(projects.len(), 2);
        assert_eq!(projects[0]["organizationId"], "org");
        assert!(projects[0].get("database").is_none());
    }

    #[test]
    fn test_summarize_name_filter() {
        let projects = summarize(&body(), Some("bill")).unwrap();
        assert_eq!(projects.len(), 1);
        assert_eq!(projects[0]["id"], "a1");

        assert_eq!(summarize(&body(), Some("  ")).unwrap().len(), 2);
    }

    #[test]
    fn test_summarize_rejects_non_array() {
        let err = summarize(&json!({ "message": "nope" }), None).unwrap_err();
        assert_eq!(err.code(), "UPSTREAM_ERROR");
    }

    #[test]
    fn test_url() {
        let tool = SupabaseListProjectsTool::new(CredentialsConfig::default());
        assert_eq!(tool.url(), "https://api.supabase.com/v1/projects");
    }

    #[tokio::test]
    async fn test_missing_token() {
        let tool = SupabaseListProjectsTool::new(CredentialsConfig::default());
        let err = tool.execute(Value::Null).await.unwrap_err();
        assert_eq!(err.code(), "CONFIGURATION_ERROR");
        assert!(err.to_string().contains("SUPABASE_ACCESS_TOKEN"));
    }
}
