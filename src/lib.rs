//! MCP Catalog Server Library
//!
//! Aggregates third-party API and CLI tools (DocuSign, shadcn/ui, Supabase)
//! behind one catalog. Tool metadata is published as a JSON registry that
//! is hot-reloaded from disk; execution always goes through the in-process
//! handlers and returns a uniform envelope.
//!
//! # Architecture
//!
//! - **core**: configuration, errors, the instance lock, path security, the
//!   server state and the HTTP/STDIO transports
//! - **domains**: business logic organized by bounded contexts
//!   - **registry**: manifests, the registry document and its cache
//!   - **tools**: handlers, adapters, dispatch and execution history
//!   - **watcher**: debounced change detection and source caching
//!
//! # Example
//!
//! ```rust,no_run
//! use mcp_catalog_server::core::{Config, McpServer};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let mut server = McpServer::new(Config::from_env());
//!     server.start()?;
//!     let envelope = server
//!         .run_tool("shadcn", "list_components", serde_json::json!({ "query": "button" }))
//!         .await;
//!     println!("{}", serde_json::to_string_pretty(&envelope)?);
//!     Ok(())
//! }
//! ```

pub mod core;
pub mod domains;

// Re-export commonly used types for convenience
pub use core::{Config, Error, McpServer, Result};
