//! Supabase adapter: management API plus the local CLI.

mod list_projects;
mod migration_list;

pub use list_projects::{ListProjectsParams, SupabaseListProjectsTool};
pub use migration_list::{
    MigrationListParams, MigrationRow, SupabaseMigrationListTool, parse_migration_table,
};

use crate::core::config::Config;
use crate::domains::tools::{ServerDefinition, ServerInfo};

pub const SERVER_NAME: &str = "supabase";

pub fn server(config: &Config) -> ServerDefinition {
    ServerDefinition::new(ServerInfo {
        name: SERVER_NAME,
        description: "Supabase: list projects and inspect database migrations",
        version: "1.0.0",
        cli_prefix: Some("supabase"),
        api_base_url: Some(config.credentials.supabase_api_url.clone()),
        documentation: "supabase/README.md",
    })
    .with_tool(SupabaseListProjectsTool::new(config.credentials.clone()))
    .with_tool(SupabaseMigrationListTool::new(config.security.clone()))
}
