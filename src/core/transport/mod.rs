//! Transport layer for the catalog server.
//!
//! This module provides different transport implementations:
//! - **HTTP**: REST catalog API (`/mcp/...`) - feature: `http` (default)
//! - **STDIO**: every catalog tool exposed as an MCP tool - feature: `stdio`
//!
//! Both transports delegate to the same [`McpServer`](crate::core::McpServer),
//! so listing reads the registry cache and execution goes through the
//! dispatcher regardless of how the request arrived.
//!
//! # Feature Flags
//!
//! - `http` (default): adds axum, tower, tower-http
//! - `stdio`: MCP over stdin/stdout via rmcp

mod config;
mod error;
mod service;

#[cfg(feature = "http")]
pub mod http;

#[cfg(feature = "stdio")]
pub mod stdio;

pub use config::TransportConfig;
pub use error::{TransportError, TransportResult};
pub use service::{TransportService, shutdown_signal};

#[cfg(feature = "http")]
pub use config::HttpConfig;
