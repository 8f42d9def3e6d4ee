//! Catalog server entry point.
//!
//! Initializes logging, loads configuration, takes the per-port instance
//! lock, prepares the registry and serves the configured transport.

use anyhow::{Context, Result};
use tracing::{Level, error, info};
use tracing_subscriber::{EnvFilter, fmt};

use mcp_catalog_server::core::{Config, InstanceLock, McpServer, TransportService};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration from environment
    let config = Config::from_env();

    init_logging(&config.logging.level, config.logging.with_timestamps);

    info!("Starting {} v{}", config.server.name, config.server.version);

    // Held until main returns; the OS releases it if the process dies.
    let _lock = match config.transport.port() {
        Some(port) => match InstanceLock::acquire(&config.instance.lock_dir, port) {
            Ok(lock) => Some(lock),
            Err(e) => {
                error!("{}", e);
                return Err(e).context("refusing to start a second instance");
            }
        },
        None => None,
    };

    let transport = TransportService::new(config.transport.clone());

    let mut server = McpServer::new(config);
    server.start().context("failed to prepare the registry")?;

    info!(
        "Server initialized with {} tools across {} servers",
        server.catalog().tool_count(),
        server.catalog().definitions().len()
    );

    transport.run(server).await?;

    info!("Server shutting down");

    Ok(())
}

/// Initialize the logging subsystem.
///
/// Logs go to stderr so the STDIO transport keeps stdout for protocol
/// frames. `RUST_LOG` directives are honoured on top of the configured level.
fn init_logging(level: &str, with_timestamps: bool) {
    let level = match level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    let builder = fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr);

    if with_timestamps {
        builder.init();
    } else {
        builder.without_time().init();
    }
}
