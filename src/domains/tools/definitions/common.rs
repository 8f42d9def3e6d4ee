//! Common utilities shared across adapters.
//!
//! HTTP calls to wrapped APIs and CLI invocations both funnel through here
//! so upstream failures are reported the same way by every tool.

use reqwest::{Client, StatusCode};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::core::config::SecurityConfig;
use crate::core::security::{PathSecurityError, validate_working_dir};
use crate::domains::tools::ToolError;

/// Request timeout applied by every adapter client.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Captured stderr is cut to this many bytes in error messages.
const MAX_STDERR_BYTES: usize = 2048;

const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Build the HTTP client an adapter keeps for its lifetime.
pub fn http_client() -> Client {
    Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .user_agent(USER_AGENT)
        .build()
        .unwrap_or_else(|e| {
            warn!("Falling back to default HTTP client: {}", e);
            Client::new()
        })
}

/// Unwrap a credential, or report which variable is missing.
pub fn require_credential<'a>(value: &'a Option<String>, var: &str) -> Result<&'a str, ToolError> {
    match value.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(ToolError::configuration(format!("{} is not set", var))),
    }
}

/// GET a JSON document, optionally with a bearer token.
pub async fn api_get_json(
    client: &Client,
    url: &str,
    bearer: Option<&str>,
    query: &[(&str, String)],
) -> Result<Value, ToolError> {
    debug!("GET {}", url);

    let mut request = client.get(url).query(query);
    if let Some(token) = bearer {
        request = request.bearer_auth(token);
    }

    let response = request
        .send()
        .await
        .map_err(|e| ToolError::upstream(e.status().map(|s| s.as_u16()), None, e.to_string()))?;

    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| ToolError::upstream(Some(status.as_u16()), None, e.to_string()))?;

    if !status.is_success() {
        return Err(upstream_error(status, &body));
    }

    serde_json::from_str(&body).map_err(|e| {
        ToolError::upstream(
            Some(status.as_u16()),
            None,
            format!("response is not valid JSON: {}", e),
        )
    })
}

/// Turn a non-2xx response into an upstream error, keeping the API's own
/// code and message when the body carries them.
pub fn upstream_error(status: StatusCode, body: &str) -> ToolError {
    let parsed: Option<Value> = serde_json::from_str(body).ok();
    let field = |keys: &[&str]| -> Option<String> {
        let obj = parsed.as_ref()?.as_object()?;
        keys.iter()
            .find_map(|k| obj.get(*k).and_then(Value::as_str))
            .map(str::to_string)
    };

    let code = field(&["errorCode", "code", "error"]);
    let message = field(&["message", "error_description", "msg"])
        .or_else(|| code.clone())
        .unwrap_or_else(|| {
            let trimmed = body.trim();
            if trimmed.is_empty() {
                status
                    .canonical_reason()
                    .unwrap_or("request failed")
                    .to_string()
            } else {
                truncate(trimmed, MAX_STDERR_BYTES)
            }
        });

    warn!("Upstream returned {}: {}", status, message);
    ToolError::upstream(Some(status.as_u16()), code, message)
}

/// Output of a successful CLI run.
#[derive(Debug, Clone)]
pub struct CliOutput {
    pub stdout: String,
    pub stderr: String,
}

/// Run a CLI to completion in `cwd`.
pub async fn run_cli(program: &str, args: &[String], cwd: &Path) -> Result<CliOutput, ToolError> {
    let command_line = std::iter::once(program.to_string())
        .chain(args.iter().cloned())
        .collect::<Vec<_>>()
        .join(" ");
    debug!("Running `{}` in {}", command_line, cwd.display());

    let output = Command::new(program)
        .args(args)
        .current_dir(cwd)
        .output()
        .await
        .map_err(|e| ToolError::Cli {
            command: command_line.clone(),
            exit_code: None,
            message: format!("failed to start: {}", e),
        })?;

    let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
    let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

    if !output.status.success() {
        let reason = if stderr.trim().is_empty() {
            stdout.trim()
        } else {
            stderr.trim()
        };
        return Err(ToolError::Cli {
            command: command_line,
            exit_code: output.status.code(),
            message: if reason.is_empty() {
                format!("exited with {}", output.status)
            } else {
                truncate(reason, MAX_STDERR_BYTES)
            },
        });
    }

    Ok(CliOutput { stdout, stderr })
}

/// Resolve an optional working directory argument; defaults to `.`.
pub fn working_dir(input: Option<&str>, security: &SecurityConfig) -> Result<PathBuf, ToolError> {
    let input = input.map(str::trim).filter(|s| !s.is_empty()).unwrap_or(".");
    validate_working_dir(input, security).map_err(|e: PathSecurityError| {
        warn!("Working directory rejected: {}", e);
        ToolError::invalid_arguments(e.to_string())
    })
}

/// Non-empty lines of CLI output.
pub fn output_lines(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim_end)
        .filter(|l| !l.trim().is_empty())
        .map(str::to_string)
        .collect()
}

fn truncate(text: &str, max: usize) -> String {
    if text.len() <= max {
        return text.to_string();
    }
    let mut end = max;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}…", &text[..end])
}
