//! DocuSign single-envelope lookup.

use reqwest::Client;
use rmcp::{handler::server::tool::cached_schema_for_type, model::JsonObject};
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::{info, instrument};

use super::{account_url, credentials};
use crate::core::config::CredentialsConfig;
use crate::domains::registry::{ExecutionType, ToolDescriptor};
use crate::domains::tools::definitions::common::{api_get_json, http_client};
use crate::domains::tools::{ToolError, ToolHandler, ToolOutput, parse_arguments};

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct GetEnvelopeParams {
    /// The envelope GUID.
    pub envelope_id: String,
}

pub struct DocusignGetEnvelopeTool {
    client: Client,
    credentials: CredentialsConfig,
}

impl DocusignGetEnvelopeTool {
    pub const NAME: &'static str = "get_envelope";

    pub const DESCRIPTION: &'static str =
        "Fetch one DocuSign envelope by ID, including its status, subject, sender and timestamps.";

    pub fn new(credentials: CredentialsConfig) -> Self {
        Self {
            client: http_client(),
            credentials,
        }
    }
}

/// Envelope IDs are GUIDs; anything else would be spliced into the URL path.
fn validate_envelope_id(raw: &str) -> Result<&str, ToolError> {
    let id = raw.trim();
    if id.is_empty() {
        return Err(ToolError::invalid_arguments("envelope_id must not be empty"));
    }
    if !id.chars().all(|c| c.is_ascii_hexdigit() || c == '-') {
        return Err(ToolError::invalid_arguments(format!(
            "envelope_id '{}' is not a valid envelope GUID",
            id
        )));
    }
    Ok(id)
}

#[async_trait::async_trait]
impl ToolHandler for DocusignGetEnvelopeTool {
    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor::new(Self::NAME, Self::DESCRIPTION, ExecutionType::Api)
            .alias("docusign-get-envelope")
            .endpoint("GET /v2.1/accounts/{accountId}/envelopes/{envelopeId}")
            .tags(&["docusign", "esignature", "envelopes", "status"])
            .example(
                json!({ "envelope_id": "4b7c1a2e-93f1-4c52-9e0d-2f1c5a7b8d90" }),
                json!({ "envelopeId": "4b7c1a2e-93f1-4c52-9e0d-2f1c5a7b8d90", "status": "completed" }),
            )
    }

    fn input_schema(&self) -> Arc<JsonObject> {
        cached_schema_for_type::<GetEnvelopeParams>()
    }

    #[instrument(skip_all)]
    async fn execute(&self, arguments: Value) -> Result<ToolOutput, ToolError> {
        let params: GetEnvelopeParams = parse_arguments(arguments)?;
        let envelope_id = validate_envelope_id(&params.envelope_id)?;
        let (token, account_id) = credentials(&self.credentials)?;

        let url = format!(
            "{}/envelopes/{}",
            account_url(&self.credentials, account_id),
            envelope_id
        );
        info!("Fetching DocuSign envelope {}", envelope_id);
        let body = api_get_json(&self.client, &url, Some(token), &[]).await?;
        Ok(ToolOutput::new(body))
    }
}
