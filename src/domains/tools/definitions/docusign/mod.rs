//! DocuSign eSignature adapter.
//!
//! API-only: every tool is a GET against the account's REST endpoints with
//! the configured OAuth token.

mod get_envelope;
mod list_envelopes;

pub use get_envelope::{DocusignGetEnvelopeTool, GetEnvelopeParams};
pub use list_envelopes::{DocusignListEnvelopesTool, ListEnvelopesParams};

use crate::core::config::{Config, CredentialsConfig};
use crate::domains::tools::definitions::common::require_credential;
use crate::domains::tools::{ServerDefinition, ServerInfo, ToolError};

pub const SERVER_NAME: &str = "docusign";

pub fn server(config: &Config) -> ServerDefinition {
    let credentials = &config.credentials;
    ServerDefinition::new(ServerInfo {
        name: SERVER_NAME,
        description: "DocuSign eSignature: inspect envelopes and their signing status",
        version: "1.0.0",
        cli_prefix: None,
        api_base_url: Some(credentials.docusign_base_path.clone()),
        documentation: "docusign/README.md",
    })
    .with_tool(DocusignListEnvelopesTool::new(credentials.clone()))
    .with_tool(DocusignGetEnvelopeTool::new(credentials.clone()))
}

/// Access token and account ID, in that order.
fn credentials(credentials: &CredentialsConfig) -> Result<(&str, &str), ToolError> {
    let token = require_credential(&credentials.docusign_access_token, "DOCUSIGN_ACCESS_TOKEN")?;
    let account = require_credential(&credentials.docusign_account_id, "DOCUSIGN_ACCOUNT_ID")?;
    Ok((token, account))
}

fn account_url(credentials: &CredentialsConfig, account_id: &str) -> String {
    format!(
        "{}/v2.1/accounts/{}",
        credentials.docusign_base_path.trim_end_matches('/'),
        account_id
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_account_url_trims_slash() {
        let credentials = CredentialsConfig {
            docusign_base_path: "https://demo.docusign.net/restapi/".to_string(),
            ..CredentialsConfig::default()
        };
        assert_eq!(
            account_url(&credentials, "123"),
            "https://demo.docusign.net/restapi/v2.1/accounts/123"
        );
    }

    #[test]
    fn test_server_tools_in_order() {
        let manifest = server(&Config::default()).manifest();
        let names: Vec<_> = manifest.tools.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["list_envelopes", "get_envelope"]);
        assert_eq!(
            manifest.api_base_url.as_deref(),
            Some("https://demo.docusign.net/restapi")
        );
    }
}
