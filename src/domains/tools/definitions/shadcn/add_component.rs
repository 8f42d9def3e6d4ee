//! shadcn/ui component installer.
//!
//! Runs the shadcn CLI through `npx` inside a project directory.

use rmcp::{handler::server::tool::cached_schema_for_type, model::JsonObject};
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::{info, instrument};

use crate::core::config::SecurityConfig;
use crate::domains::registry::{ExecutionType, ToolDescriptor};
use crate::domains::tools::definitions::common::{output_lines, run_cli, working_dir};
use crate::domains::tools::{ToolError, ToolHandler, ToolOutput, parse_arguments};

const PROGRAM: &str = "npx";

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct AddComponentParams {
    /// Component names (or registry item URLs) to add, e.g. ["button", "card"].
    pub components: Vec<String>,

    /// Project directory containing components.json. Defaults to the server's working directory.
    #[serde(default)]
    pub cwd: Option<String>,

    /// Overwrite existing component files.
    #[serde(default)]
    pub overwrite: bool,
}

pub struct ShadcnAddComponentTool {
    security: SecurityConfig,
}

impl ShadcnAddComponentTool {
    pub const NAME: &'static str = "add_component";

    pub const DESCRIPTION: &'static str = "Add shadcn/ui components to a project by running the shadcn CLI non-interactively.";

    pub fn new(security: SecurityConfig) -> Self {
        Self { security }
    }

    /// CLI arguments after `npx`.
    fn cli_args(params: &AddComponentParams) -> Result<Vec<String>, ToolError> {
        if params.components.is_empty() {
            return Err(ToolError::invalid_arguments(
                "components must name at least one component",
            ));
        }

        let mut args = vec!["shadcn@latest".to_string(), "add".to_string()];
        for component in &params.components {
            args.push(validate_component(component)?.to_string());
        }
        args.push("--yes".to_string());
        if params.overwrite {
            args.push("--overwrite".to_string());
        }
        Ok(args)
    }
}

fn validate_component(raw: &str) -> Result<&str, ToolError> {
    let name = raw.trim();
    let allowed = |c: char| c.is_ascii_alphanumeric() || "-_./:@".contains(c);
    if name.is_empty() || name.starts_with('-') || !name.chars().all(allowed) {
        return Err(ToolError::invalid_arguments(format!(
            "'{}' is not a valid component name",
            raw
        )));
    }
    Ok(name)
}

#[async_trait::async_trait]
impl ToolHandler for ShadcnAddComponentTool {
    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor::new(Self::NAME, Self::DESCRIPTION, ExecutionType::Cli)
            .alias("shadcn-add")
            .command("npx shadcn@latest add {components} --yes [--overwrite]")
            .tags(&["shadcn", "ui", "components", "install", "cli"])
            .example(
                json!({ "components": ["button", "card"], "cwd": "./web" }),
                json!({ "components": ["button", "card"], "output": ["✔ Done."] }),
            )
    }

    fn input_schema(&self) -> Arc<JsonObject> {
        cached_schema_for_type::<AddComponentParams>()
    }

    #[instrument(skip_all)]
    async fn execute(&self, arguments: Value) -> Result<ToolOutput, ToolError> {
        let params: AddComponentParams = parse_arguments(arguments)?;
        let args = Self::cli_args(&params)?;
        let cwd = working_dir(params.cwd.as_deref(), &self.security)?;

        info!("Adding shadcn components {:?} in {}", params.components, cwd.display());
        let output = run_cli(PROGRAM, &args, &cwd).await?;

        let mut result = ToolOutput::new(json!({
            "components": params.components,
            "cwd": cwd.display().to_string(),
            "output": output_lines(&output.stdout),
        }));
        if !output.stderr.trim().is_empty() {
            result = result.with_warning(output.stderr.trim().to_string());
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(components: &[&str], overwrite: bool) -> AddComponentParams {
        AddComponentParams {
            components: components.iter().map(|c| c.to_string()).collect(),
            cwd: None,
            overwrite,
        }
    }

    #[test]
    fn test_cli_args() {
        let args = ShadcnAddComponentTool::cli_args(&params(&["button", " card "], false)).unwrap();
        assert_eq!(args, vec!["shadcn@latest", "add", "button", "card", "--yes"]);

        let args = ShadcnAddComponentTool::cli_args(&params(&["dialog"], true)).unwrap();
        assert_eq!(args.last().map(String::as_str), Some("--overwrite"));
    }

    #[test]
    fn test_registry_url_component_allowed() {
        assert!(validate_component("https://example.com/r/hello.json").is_ok());
    }

    #[test]
    fn test_rejects_flag_injection_and_empty() {
        for bad in [&["--cwd=/"][..], &["button; rm -rf /"][..], &[][..]] {
            let err = ShadcnAddComponentTool::cli_args(&params(bad, false)).unwrap_err();
            assert_eq!(err.code(), "INVALID_ARGUMENTS");
        }
    }

    #[tokio::test]
    async fn test_rejects_working_dir_outside_root() {
        let root = tempfile::TempDir::new().unwrap();
        let outside = tempfile::TempDir::new().unwrap();
        let tool = ShadcnAddComponentTool::new(SecurityConfig {
            root_path: Some(root.path().to_path_buf()),
            allow_symlinks: false,
        });

        let err = tool
            .execute(json!({
                "components": ["button"],
                "cwd": outside.path().to_str().unwrap(),
            }))
            .await
            .unwrap_err();
        assert_eq!(err.code(), "INVALID_ARGUMENTS");
    }
}
