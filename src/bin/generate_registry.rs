//! Writes the registry document from the built-in tool catalog.
//!
//! With `--check`, compares the document on disk with the loaded handlers
//! instead and exits non-zero on any difference.

use anyhow::{Context, Result, bail};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::Level;
use tracing_subscriber::{EnvFilter, fmt};

use mcp_catalog_server::core::Config;
use mcp_catalog_server::domains::registry::RegistryDocument;
use mcp_catalog_server::domains::tools::{CatalogDrift, ToolCatalog};

/// Generate the MCP tool registry
#[derive(Parser, Debug)]
#[command(name = "generate-registry")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Where to write the registry (defaults to MCP_REGISTRY_PATH or registry/mcp-registry.json)
    #[arg(long, short)]
    output: Option<PathBuf>,

    /// Verify the existing registry matches the built-in tools without writing
    #[arg(long)]
    check: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Arc::new(Config::from_env());
    init_logging(&config.logging.level);

    let output = cli.output.unwrap_or_else(|| config.registry.path.clone());
    let catalog = ToolCatalog::builtin(config);

    if cli.check {
        let document = RegistryDocument::read_from(&output)
            .with_context(|| format!("cannot check {}", output.display()))?;
        let drift = CatalogDrift::between(&document.tool_pairs(), &catalog.tool_pairs());
        if drift.is_empty() {
            println!(
                "{} is up to date ({} tools)",
                output.display(),
                document.tool_count()
            );
            return Ok(());
        }
        for (server, tool) in &drift.missing_handlers {
            eprintln!("listed without a handler: {}/{}", server, tool);
        }
        for (server, tool) in &drift.unlisted_handlers {
            eprintln!("handler missing from registry: {}/{}", server, tool);
        }
        bail!("{} is out of date; rerun generate-registry", output.display());
    }

    let document = catalog.generate_document();
    document
        .write_to(&output)
        .with_context(|| format!("cannot write {}", output.display()))?;

    println!(
        "Wrote {} ({} servers, {} tools)",
        output.display(),
        document.servers.len(),
        document.tool_count()
    );
    Ok(())
}

/// Progress goes to stderr; stdout carries only the result line.
fn init_logging(level: &str) {
    let level = level.parse::<Level>().unwrap_or(Level::INFO);
    let filter = EnvFilter::from_default_env().add_directive(level.into());

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();
}
