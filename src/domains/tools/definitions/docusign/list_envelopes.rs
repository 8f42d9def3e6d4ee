//! DocuSign envelope listing tool.
//!
//! Lists envelopes in the configured account changed since a given date,
//! optionally filtered by status.

use chrono::{DateTime, Duration, NaiveDate, Utc};
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

/// Statuses accepted by the envelopes endpoint.
const STATUSES: &[&str] = &[
    "any",
    "created",
    "sent",
    "delivered",
    "signed",
    "completed",
    "declined",
    "voided",
    "changed",
];

const DEFAULT_LOOKBACK_DAYS: i64 = 30;
const MAX_COUNT: u32 = 100;

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct ListEnvelopesParams {
    /// Only envelopes changed on or after this date (YYYY-MM-DD or RFC 3339).
    /// Defaults to 30 days ago.
    #[serde(default)]
    pub from_date: Option<String>,

    /// Comma-separated envelope statuses, e.g. "sent,delivered".
    #[serde(default)]
    pub status: Option<String>,

    /// Maximum number of envelopes to return (1-100).
    #[serde(default)]
    pub count: Option<u32>,
}

pub struct DocusignListEnvelopesTool {
    client: Client,
    credentials: CredentialsConfig,
}

impl DocusignListEnvelopesTool {
    pub const NAME: &'static str = "list_envelopes";

    pub const DESCRIPTION: &'static str = "List DocuSign envelopes changed since a date, optionally filtered by status. Returns envelope IDs, subjects, statuses and timestamps.";

    pub fn new(credentials: CredentialsConfig) -> Self {
        Self {
            client: http_client(),
            credentials,
        }
    }

    /// The caller's `from_date`, if it is not blank.
    fn given_from_date(params: &ListEnvelopesParams) -> Option<&str> {
        params
            .from_date
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty())
    }

    /// Query parameters for the request, after validation.
    fn query(params: &ListEnvelopesParams, now: DateTime<Utc>) -> Result<Vec<(&'static str, String)>, ToolError> {
        let from_date = match Self::given_from_date(params) {
            None => (now - Duration::days(DEFAULT_LOOKBACK_DAYS))
                .date_naive()
                .to_string(),
            Some(raw) => normalize_date(raw)?,
        };

        let mut query = vec![("from_date", from_date)];

        if let Some(status) = params.status.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            for part in status.split(',').map(str::trim) {
                if !STATUSES.contains(&part) {
                    return Err(ToolError::invalid_arguments(format!(
                        "Unknown envelope status '{}'. Expected one of: {}",
                        part,
                        STATUSES.join(", ")
                    )));
                }
            }
            query.push(("status", status.to_string()));
        }

        if let Some(count) = params.count {
            if count == 0 || count > MAX_COUNT {
                return Err(ToolError::invalid_arguments(format!(
                    "count must be between 1 and {}",
                    MAX_COUNT
                )));
            }
            query.push(("count", count.to_string()));
        }

        Ok(query)
    }
}

fn normalize_date(raw: &str) -> Result<String, ToolError> {
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Ok(date.to_string());
    }
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc).to_rfc3339())
        .map_err(|_| {
            ToolError::invalid_arguments(format!(
                "from_date '{}' is not a YYYY-MM-DD or RFC 3339 date",
                raw
            ))
        })
}

/// Keep the fields callers actually use from each envelope.
fn summarize(body: &Value) -> Value {
    let envelopes: Vec<Value> = body
        .get("envelopes")
        .and_then(Value::as_array)
        .map(|list| {
            list.iter()
                .map(|e| {
                    json!({
                        "envelopeId": e.get("envelopeId"),
                        "status": e.get("status"),
                        "emailSubject": e.get("emailSubject"),
                        "sentDateTime": e.get("sentDateTime"),
                        "completedDateTime": e.get("completedDateTime"),
                        "statusChangedDateTime": e.get("statusChangedDateTime"),
                    })
                })
                .collect()
        })
        .unwrap_or_default();

    json!({
        "count": envelopes.len(),
        "totalSetSize": body.get("totalSetSize"),
        "envelopes": envelopes,
    })
}

#[async_trait::async_trait]
impl ToolHandler for DocusignListEnvelopesTool {
    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor::new(Self::NAME, Self::DESCRIPTION, ExecutionType::Api)
            .alias("docusign-list-envelopes")
            .endpoint("GET /v2.1/accounts/{accountId}/envelopes")
            .tags(&["docusign", "esignature", "envelopes", "list"])
            .example(
                json!({ "status": "sent", "count": 10 }),
                json!({ "count": 1, "envelopes": [{ "envelopeId": "4b7c1a2e-0000-0000-0000-000000000000", "status": "sent" }] }),
            )
    }

    fn input_schema(&self) -> Arc<JsonObject> {
        cached_schema_for_type::<ListEnvelopesParams>()
    }

    #[instrument(skip_all)]
    async fn execute(&self, arguments: Value) -> Result<ToolOutput, ToolError> {
        let params: ListEnvelopesParams = parse_arguments(arguments)?;
        let query = Self::query(&params, Utc::now())?;
        let (token, account_id) = credentials(&self.credentials)?;

        let url = format!("{}/envelopes", account_url(&self.credentials, account_id));
        info!("Listing DocuSign envelopes since {}", query[0].1);
        let body = api_get_json(&self.client, &url, Some(token), &query).await?;

        let mut output = ToolOutput::new(summarize(&body));
        if Self::given_from_date(&params).is_none() {
            output = output.with_warning(format!(
                "from_date not given; defaulted to the last {} days",
                DEFAULT_LOOKBACK_DAYS
            ));
        }
        Ok(output)
    }
}
