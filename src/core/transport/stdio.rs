//! STDIO transport implementation.
//!
//! MCP over stdin/stdout. Every catalog tool is listed as `{server}_{tool}`.

use rmcp::ServiceExt;
use tracing::info;

use super::service::shutdown_signal;
use super::{TransportError, TransportResult};
use crate::core::McpServer;

pub struct StdioTransport;

impl StdioTransport {
    pub async fn run(server: McpServer) -> TransportResult<()> {
        info!(
            "Ready - serving {} catalog tools via stdin/stdout",
            server.mcp_tool_count()
        );

        let service = server
            .serve(rmcp::transport::stdio())
            .await
            .map_err(|e| TransportError::StdioInit(e.to_string()))?;

        // Dropping the running service on shutdown cancels it.
        tokio::select! {
            result = service.waiting() => {
                result.map_err(|e| TransportError::Session(e.to_string()))?;
                info!("STDIO client disconnected");
            }
            _ = shutdown_signal() => {}
        }

        info!("STDIO transport finished");
        Ok(())
    }
}
