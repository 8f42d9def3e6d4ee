//! shadcn/ui adapter: registry lookups over HTTP, installs through the CLI.

mod add_component;
mod list_components;

pub use add_component::{AddComponentParams, ShadcnAddComponentTool};
pub use list_components::{ListComponentsParams, ShadcnListComponentsTool};

use crate::core::config::Config;
use crate::domains::tools::{ServerDefinition, ServerInfo};

pub const SERVER_NAME: &str = "shadcn";

pub fn server(config: &Config) -> ServerDefinition {
    ServerDefinition::new(ServerInfo {
        name: SERVER_NAME,
        description: "shadcn/ui: browse the component registry and add components to a project",
        version: "1.0.0",
        cli_prefix: Some("npx shadcn@latest"),
        api_base_url: Some(config.credentials.shadcn_registry_url.clone()),
        documentation: "shadcn/README.md",
    })
    .with_tool(ShadcnListComponentsTool::new(
        config.credentials.shadcn_registry_url.clone(),
    ))
    .with_tool(ShadcnAddComponentTool::new(config.security.clone()))
}
