//! Catalog server state and lifecycle.
//!
//! [`McpServer`] owns everything a transport needs: the tool catalog, the
//! dispatcher, the registry cache, the source cache, the execution history
//! and (once started) the change watcher. It is cheap to clone; clones share
//! all state.
//!
//! Over STDIO it is also the rmcp `ServerHandler`, exposing each catalog
//! tool as an MCP tool named `{server}_{tool}`.

use rmcp::{ServerHandler, handler::server::tool::ToolRouter, model::*, tool_handler};
use serde::Serialize;
use serde_json::Value;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing::{info, instrument, warn};

use super::config::Config;
use crate::domains::registry::{RegistryCache, RegistryDocument};
use crate::domains::tools::{
    CatalogDrift, Dispatcher, ExecutionEnvelope, ExecutionHistory, ToolCatalog, build_tool_router,
};
use crate::domains::watcher::{ChangeWatcher, SourceCache, WatchStats, WatchStatsSnapshot};

/// Liveness information for `GET /mcp/health`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthReport {
    pub status: &'static str,
    pub name: String,
    pub version: String,
    pub uptime_secs: u64,
    pub registry_loaded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub watcher: Option<WatchStatsSnapshot>,
}

#[derive(Clone)]
pub struct McpServer {
    config: Arc<Config>,
    catalog: Arc<ToolCatalog>,
    dispatcher: Arc<Dispatcher>,
    registry: Arc<RegistryCache>,
    sources: Arc<SourceCache>,
    history: Arc<ExecutionHistory>,
    watcher: Option<Arc<Mutex<ChangeWatcher>>>,
    watch_stats: Option<Arc<WatchStats>>,
    started_at: Instant,

    /// Tool router for STDIO tool calls.
    tool_router: ToolRouter<Self>,
}

impl McpServer {
    /// Build the server with the built-in tool catalog. Performs no I/O;
    /// call [`start`](Self::start) to load the registry and begin watching.
    pub fn new(config: Config) -> Self {
        let config = Arc::new(config);
        let catalog = ToolCatalog::builtin(config.clone());
        Self::with_catalog(config, catalog)
    }

    pub fn with_catalog(config: Arc<Config>, catalog: ToolCatalog) -> Self {
        let dispatcher = Arc::new(Dispatcher::new(catalog.definitions()));
        let history = Arc::new(ExecutionHistory::new(config.history.limit));
        let registry = Arc::new(RegistryCache::new(config.registry.path.clone()));
        let sources = Arc::new(SourceCache::new(config.registry.tools_dir.clone()));

        Self {
            tool_router: build_tool_router::<Self>(
                catalog.definitions(),
                dispatcher.clone(),
                history.clone(),
            ),
            config,
            catalog: Arc::new(catalog),
            dispatcher,
            registry,
            sources,
            history,
            watcher: None,
            watch_stats: None,
            started_at: Instant::now(),
        }
    }

    /// Prepare the registry and start the change watcher.
    ///
    /// Writes the registry document first when it is missing and
    /// generation is enabled. A registry that still cannot be loaded is
    /// not fatal: discovery answers "unavailable" until it appears.
    /// Must be called from within a tokio runtime when watching is on.
    pub fn start(&mut self) -> super::error::Result<()> {
        let registry_path = self.registry.path().to_path_buf();

        if !registry_path.exists() && self.config.registry.generate_if_missing {
            info!(
                "Registry {} not found, generating it from the built-in catalog",
                registry_path.display()
            );
            self.catalog.generate_document().write_to(&registry_path)?;
        }

        match self.registry.load(false) {
            Some(document) => {
                info!(
                    "Registry loaded: {} servers, {} tools",
                    document.servers.len(),
                    document.tool_count()
                );
                self.log_drift(&document);
            }
            None => warn!("Registry unavailable; discovery endpoints will answer 503"),
        }

        if self.config.registry.watch {
            let watcher = ChangeWatcher::spawn(
                self.registry.clone(),
                self.sources.clone(),
                &self.config.registry.tools_dir,
                Duration::from_millis(self.config.registry.debounce_ms),
            )?;
            self.watch_stats = Some(watcher.stats().clone());
            self.watcher = Some(Arc::new(Mutex::new(watcher)));
        } else {
            info!("Registry watching disabled");
        }

        Ok(())
    }

    /// Compare the document with the loaded handlers.
    pub fn drift(&self, document: &RegistryDocument) -> CatalogDrift {
        CatalogDrift::between(&document.tool_pairs(), &self.dispatcher.tool_pairs())
    }

    fn log_drift(&self, document: &RegistryDocument) {
        let drift = self.drift(document);
        for (server, tool) in &drift.missing_handlers {
            warn!("Registry lists {}/{} but no handler is loaded", server, tool);
        }
        for (server, tool) in &drift.unlisted_handlers {
            warn!(
                "Handler {}/{} is not in the registry; run `generate-registry`",
                server, tool
            );
        }
    }

    pub fn name(&self) -> &str {
        &self.config.server.name
    }

    pub fn version(&self) -> &str {
        &self.config.server.version
    }

    pub fn config(&self) -> &Arc<Config> {
        &self.config
    }

    pub fn catalog(&self) -> &Arc<ToolCatalog> {
        &self.catalog
    }

    pub fn registry(&self) -> &Arc<RegistryCache> {
        &self.registry
    }

    pub fn sources(&self) -> &Arc<SourceCache> {
        &self.sources
    }

    pub fn history(&self) -> &Arc<ExecutionHistory> {
        &self.history
    }

    /// The cached registry document. Never touches disk.
    pub fn registry_snapshot(&self) -> Option<Arc<RegistryDocument>> {
        self.registry.current()
    }

    /// Invoke a tool and record the outcome.
    #[instrument(skip(self, arguments))]
    pub async fn run_tool(&self, server: &str, tool: &str, arguments: Value) -> ExecutionEnvelope {
        let envelope = self.dispatcher.dispatch(server, tool, arguments).await;
        self.history.record(&envelope);
        envelope
    }

    /// Re-read the registry now, bypassing the debounce, and drop cached sources.
    pub fn reload(&self) -> Option<Arc<RegistryDocument>> {
        info!("Forced registry reload");
        self.sources.clear();
        let document = self.registry.load(false)?;
        self.log_drift(&document);
        Some(document)
    }

    pub fn is_watching(&self) -> bool {
        self.watcher.is_some()
    }

    pub fn uptime(&self) -> Duration {
        self.started_at.elapsed()
    }

    pub fn health(&self) -> HealthReport {
        HealthReport {
            status: "ok",
            name: self.name().to_string(),
            version: self.version().to_string(),
            uptime_secs: self.uptime().as_secs(),
            registry_loaded: self.registry.current().is_some(),
            watcher: self.watch_stats.as_ref().map(|s| s.snapshot()),
        }
    }

    /// Number of MCP tools exposed over STDIO.
    pub fn mcp_tool_count(&self) -> usize {
        self.tool_router.list_all().len()
    }
}

#[tool_handler]
impl ServerHandler for McpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "Catalog of third-party API and CLI tools. Each tool is named {server}_{tool} and returns an execution envelope as JSON."
                    .to_string(),
            ),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}
