//! `supabase migration list` wrapper.

use rmcp::{handler::server::tool::cached_schema_for_type, model::JsonObject};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::{info, instrument};

use crate::core::config::SecurityConfig;
use crate::domains::registry::{ExecutionType, ToolDescriptor};
use crate::domains::tools::definitions::common::{run_cli, working_dir};
use crate::domains::tools::{ToolError, ToolHandler, ToolOutput, parse_arguments};

const PROGRAM: &str = "supabase";

#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
pub struct MigrationListParams {
    /// Project directory containing the supabase/ folder.
    #[serde(default)]
    pub cwd: Option<String>,

    /// Compare against the local database instead of the linked project.
    #[serde(default)]
    pub local: bool,
}

/// One row of the migration table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MigrationRow {
    pub local: Option<String>,
    pub remote: Option<String>,
    pub time: Option<String>,
}

pub struct SupabaseMigrationListTool {
    security: SecurityConfig,
}

impl SupabaseMigrationListTool {
    pub const NAME: &'static str = "migration_list";

    pub const DESCRIPTION: &'static str = "List local and remote Supabase migrations side by side using the Supabase CLI.";

    pub fn new(security: SecurityConfig) -> Self {
        Self { security }
    }

    fn cli_args(params: &MigrationListParams) -> Vec<String> {
        let target = if params.local { "--local" } else { "--linked" };
        vec!["migration".to_string(), "list".to_string(), target.to_string()]
    }
}

/// Parse the `Local | Remote | Time (UTC)` table the CLI prints.
pub fn parse_migration_table(stdout: &str) -> Vec<MigrationRow> {
    let cell = |s: Option<&str>| {
        s.map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_string)
    };

    stdout
        .lines()
        .filter(|line| line.contains('|'))
        .filter(|line| !line.trim_start().starts_with("Local"))
        .filter(|line| !line.chars().all(|c| c == '-' || c == '|' || c.is_whitespace()))
        .map(|line| {
            let mut parts = line.split('|');
            MigrationRow {
                local: cell(parts.next()),
                remote: cell(parts.next()),
                time: cell(parts.next()),
            }
        })
        .collect()
}

#[async_trait::async_trait]
impl ToolHandler for SupabaseMigrationListTool {
    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor::new(Self::NAME, Self::DESCRIPTION, ExecutionType::Cli)
            .alias("supabase-migrations")
            .command("supabase migration list [--local|--linked]")
            .tags(&["supabase", "database", "migrations", "cli"])
            .example(
                json!({ "cwd": "./api" }),
                json!({ "migrations": [{ "local": "20250101000000", "remote": "20250101000000", "time": "2025-01-01 00:00:00" }], "pending": 0 }),
            )
    }

    fn input_schema(&self) -> Arc<JsonObject> {
        cached_schema_for_type::<MigrationListParams>()
    }

    #[instrument(skip_all)]
    async fn execute(&self, arguments: Value) -> Result<ToolOutput, ToolError> {
        let params: MigrationListParams = parse_arguments(arguments)?;
        let cwd = working_dir(params.cwd.as_deref(), &self.security)?;

        info!("Listing Supabase migrations in {}", cwd.display());
        let output = run_cli(PROGRAM, &Self::cli_args(&params), &cwd).await?;
        let migrations = parse_migration_table(&output.stdout);
        let pending = migrations.iter().filter(|m| m.remote.is_none()).count();

        let mut result = ToolOutput::new(json!({
            "migrations": migrations,
            "pending": pending,
        }));
        if migrations.is_empty() {
            result = result.with_warning("No migration rows found in CLI output");
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const OUTPUT: &str = "

        Local          |     Remote     |     Time (UTC)
  ---------------------|----------------|---------------------
    20240101000000     | 20240101000000 | 2024-01-01 00:00:00
    20240215093000     |                | 2024-02-15 09:30:00
";

    #[test]
    fn test_parse_table() {
        let rows = parse_migration_table(OUTPUT);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].local.as_deref(), Some("20240101000000"));
        assert_eq!(rows[0].remote.as_deref(), Some("20240101000000"));
        assert_eq!(rows[1].remote, None);
        assert_eq!(rows[1].time.as_deref(), Some("2024-02-15 09:30:00"));
    }

    #[test]
    fn test_parse_empty_output() {
        assert!(parse_migration_table("Connecting to remote database...\n").is_empty());
    }

    #[test]
    fn test_cli_args() {
        let linked = SupabaseMigrationListTool::cli_args(&MigrationListParams::default());
        assert_eq!(linked, vec!["migration", "list", "--linked"]);

        let local = SupabaseMigrationListTool::cli_args(&MigrationListParams {
            cwd: None,
            local: true,
        });
        assert_eq!(local[2], "--local");
    }

    #[tokio::test]
    async fn test_invalid_working_dir() {
        let tool = SupabaseMigrationListTool::new(SecurityConfig::default());
        let err = tool
            .execute(json!({ "cwd": "/no/such/project/dir" }))
            .await
            .unwrap_err();
        assert_eq!(err.code(), "INVALID_ARGUMENTS");
    }
}
