//! Read-only views over a registry document: listings, search and stats.
//!
//! None of these touch the disk. Callers pass the document they got from
//! [`RegistryCache::current`](super::RegistryCache::current).

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::document::RegistryDocument;
use super::manifest::{ExecutionType, ServerManifest, ToolDescriptor};

/// Compact listing entry for one server.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerSummary {
    pub name: String,
    pub description: String,
    pub version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cli_prefix: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_base_url: Option<String>,
    pub tool_count: usize,
}

impl From<&ServerManifest> for ServerSummary {
    fn from(manifest: &ServerManifest) -> Self {
        Self {
            name: manifest.name.clone(),
            description: manifest.description.clone(),
            version: manifest.version.clone(),
            cli_prefix: manifest.cli_prefix.clone(),
            api_base_url: manifest.api_base_url.clone(),
            tool_count: manifest.tools.len(),
        }
    }
}

/// A descriptor matched by a search, tagged with its server.
#[derive(Debug, Clone, Serialize)]
pub struct SearchHit {
    pub server: String,
    #[serde(flatten)]
    pub tool: ToolDescriptor,
}

/// Aggregate counts over the registry.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistryStats {
    pub servers: usize,
    pub tools: usize,
    pub cli_tools: usize,
    pub api_tools: usize,
    pub registry_version: String,
    pub last_updated: DateTime<Utc>,
}

pub fn list_servers(doc: &RegistryDocument) -> Vec<ServerSummary> {
    doc.servers.iter().map(ServerSummary::from).collect()
}

/// Substring search over tool name, alias, description and tags.
///
/// Matching is case-insensitive; a blank query matches nothing.
pub fn search_tools(doc: &RegistryDocument, query: &str) -> Vec<SearchHit> {
    let lowered = query.trim().to_lowercase();
    if lowered.is_empty() {
        return Vec::new();
    }
    let needle = lowered.as_str();

    doc.servers
        .iter()
        .flat_map(move |server| {
            server
                .tools
                .iter()
                .filter(move |tool| tool.matches(needle))
                .map(move |tool| SearchHit {
                    server: server.name.clone(),
                    tool: tool.clone(),
                })
        })
        .collect()
}

pub fn stats(doc: &RegistryDocument) -> RegistryStats {
    let tools = || doc.servers.iter().flat_map(|s| s.tools.iter());
    RegistryStats {
        servers: doc.servers.len(),
        tools: doc.tool_count(),
        cli_tools: tools()
            .filter(|t| t.execution_type == ExecutionType::Cli)
            .count(),
        api_tools: tools()
            .filter(|t| t.execution_type == ExecutionType::Api)
            .count(),
        registry_version: doc.version.clone(),
        last_updated: doc.last_updated,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn document() -> RegistryDocument {
        RegistryDocument::new(vec![
            ServerManifest {
                name: "docs".to_string(),
                description: "Signing".to_string(),
                version: "1.0.0".to_string(),
                cli_prefix: None,
                api_base_url: Some("https://sign.example.com".to_string()),
                tools: vec![
                    ToolDescriptor::new("list_envelopes", "List sent envelopes", ExecutionType::Api)
                        .tags(&["signature"]),
                ],
                documentation: "docs/README.md".to_string(),
            },
            ServerManifest {
                name: "ui".to_string(),
                description: "Components".to_string(),
                version: "2.0.0".to_string(),
                cli_prefix: Some("npx shadcn@latest".to_string()),
                api_base_url: None,
                tools: vec![
                    ToolDescriptor::new("add_component", "Add a UI component", ExecutionType::Cli)
                        .tags(&["react"]),
                    ToolDescriptor::new("list_components", "List registry items", ExecutionType::Api),
                ],
                documentation: "ui/README.md".to_string(),
            },
        ])
    }

    #[test]
    fn test_list_servers() {
        let summaries = list_servers(&document());
        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[1].name, "ui");
        assert_eq!(summaries[1].tool_count, 2);
    }

    #[test]
    fn test_search_by_name_description_and_tag() {
        let doc = document();

        let hits = search_tools(&doc, "COMPONENT");
        assert_eq!(hits.len(), 2);
        assert!(hits.iter().all(|h| h.server == "ui"));

        let hits = search_tools(&doc, "signature");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].tool.name, "list_envelopes");

        assert!(search_tools(&doc, "nothing-like-this").is_empty());
    }

    #[test]
    fn test_blank_search_matches_nothing() {
        assert!(search_tools(&document(), "   ").is_empty());
    }

    #[test]
    fn test_stats_counts_by_execution_type() {
        let stats = stats(&document());
        assert_eq!(stats.servers, 2);
        assert_eq!(stats.tools, 3);
        assert_eq!(stats.cli_tools, 1);
        assert_eq!(stats.api_tools, 2);
    }

    #[test]
    fn test_search_hit_flattens_descriptor() {
        let hits = search_tools(&document(), "envelopes");
        let value = serde_json::to_value(&hits[0]).unwrap();
        assert_eq!(value["server"], "docs");
        assert_eq!(value["name"], "list_envelopes");
    }
}
