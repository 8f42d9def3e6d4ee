//! Tool catalog - the fixed set of integrated servers.
//!
//! This is the one place that decides which servers and tools exist. The
//! dispatcher, the STDIO tool router and the generated registry document
//! are all built from the same [`ToolCatalog`], so they cannot disagree.

use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::info;

use super::definitions::{docusign, shadcn, supabase};
use super::handlers::ServerDefinition;
use crate::core::config::Config;
use crate::domains::registry::{RegistryDocument, ServerManifest};

#[derive(Debug, Clone)]
pub struct ToolCatalog {
    servers: Vec<ServerDefinition>,
}

impl ToolCatalog {
    pub fn new(servers: Vec<ServerDefinition>) -> Self {
        Self { servers }
    }

    /// Every adapter compiled into this crate.
    pub fn builtin(config: Arc<Config>) -> Self {
        let catalog = Self::new(vec![
            docusign::server(&config),
            shadcn::server(&config),
            supabase::server(&config),
        ]);
        info!(
            "Tool catalog: {} servers, {} tools",
            catalog.servers.len(),
            catalog.tool_count()
        );
        catalog
    }

    pub fn definitions(&self) -> &[ServerDefinition] {
        &self.servers
    }

    pub fn manifests(&self) -> Vec<ServerManifest> {
        self.servers.iter().map(ServerDefinition::manifest).collect()
    }

    pub fn tool_count(&self) -> usize {
        self.servers.iter().map(|s| s.tools.len()).sum()
    }

    pub fn tool_pairs(&self) -> BTreeSet<(String, String)> {
        self.servers
            .iter()
            .flat_map(|s| s.tools.iter().map(move |t| (s.name().to_string(), t.name())))
            .collect()
    }

    /// A fresh registry document describing this catalog.
    pub fn generate_document(&self) -> RegistryDocument {
        RegistryDocument::new(self.manifests())
    }
}

/// Differences between a registry document and the handlers that exist.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogDrift {
    /// Listed in the document, but no handler is loaded.
    pub missing_handlers: Vec<(String, String)>,
    /// Loaded, but absent from the document.
    pub unlisted_handlers: Vec<(String, String)>,
}

impl CatalogDrift {
    pub fn between(
        document: &BTreeSet<(String, String)>,
        handlers: &BTreeSet<(String, String)>,
    ) -> Self {
        Self {
            missing_handlers: document.difference(handlers).cloned().collect(),
            unlisted_handlers: handlers.difference(document).cloned().collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.missing_handlers.is_empty() && self.unlisted_handlers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::tools::router::Dispatcher;

    fn catalog() -> ToolCatalog {
        ToolCatalog::builtin(Arc::new(Config::default()))
    }

    #[test]
    fn test_builtin_servers() {
        let catalog = catalog();
        let names: Vec<_> = catalog.definitions().iter().map(|s| s.name()).collect();
        assert_eq!(names, vec!["docusign", "shadcn", "supabase"]);
        assert_eq!(catalog.tool_count(), 6);
    }

    #[test]
    fn test_document_matches_dispatcher() {
        let catalog = catalog();
        let dispatcher = Dispatcher::new(catalog.definitions());
        let document = catalog.generate_document();

        assert_eq!(document.tool_pairs(), dispatcher.tool_pairs());
        assert!(CatalogDrift::between(&document.tool_pairs(), &dispatcher.tool_pairs()).is_empty());
    }

    #[test]
    fn test_every_tool_has_contract_and_tags() {
        for manifest in catalog().manifests() {
            for tool in &manifest.tools {
                assert!(!tool.tags.is_empty(), "{} has no tags", tool.name);
                assert!(!tool.examples.is_empty(), "{} has no examples", tool.name);
                match tool.execution_type {
                    crate::domains::registry::ExecutionType::Cli => assert!(tool.command.is_some()),
                    crate::domains::registry::ExecutionType::Api => assert!(tool.endpoint.is_some()),
                }
            }
        }
    }

    #[test]
    fn test_drift_detection() {
        let pair = |s: &str, t: &str| (s.to_string(), t.to_string());
        let document: BTreeSet<_> = [pair("alpha", "toolA"), pair("alpha", "old")].into();
        let handlers: BTreeSet<_> = [pair("alpha", "toolA"), pair("beta", "new")].into();

        let drift = CatalogDrift::between(&document, &handlers);
        assert_eq!(drift.missing_handlers, vec![pair("alpha", "old")]);
        assert_eq!(drift.unlisted_handlers, vec![pair("beta", "new")]);
        assert!(!drift.is_empty());
    }
}
