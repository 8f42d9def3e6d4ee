//! Tool-specific error types.

use serde_json::{Value, json};
use thiserror::Error;

/// Errors that can occur during tool operations.
#[derive(Debug, Error)]
pub enum ToolError {
    /// The requested server or tool was not found.
    #[error("Tool not found: {0}")]
    NotFound(String),

    /// Invalid arguments were provided to the tool.
    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    /// A credential or setting the tool needs is missing.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The wrapped API answered with a failure.
    #[error("Upstream error{}: {message}", .status.map(|s| format!(" (HTTP {})", s)).unwrap_or_default())]
    Upstream {
        status: Option<u16>,
        code: Option<String>,
        message: String,
    },

    /// The wrapped CLI exited unsuccessfully or could not be started.
    #[error("Command `{command}` failed: {message}")]
    Cli {
        command: String,
        exit_code: Option<i32>,
        message: String,
    },

    /// The tool execution failed.
    #[error("Execution failed: {0}")]
    ExecutionFailed(String),

    /// An internal error occurred.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ToolError {
    /// Create a new "not found" error.
    pub fn not_found(name: impl Into<String>) -> Self {
        Self::NotFound(name.into())
    }

    /// Create a new "invalid arguments" error.
    pub fn invalid_arguments(msg: impl Into<String>) -> Self {
        Self::InvalidArguments(msg.into())
    }

    /// Create a new "configuration" error.
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Create a new "upstream" error.
    pub fn upstream(status: Option<u16>, code: Option<String>, message: impl Into<String>) -> Self {
        Self::Upstream {
            status,
            code,
            message: message.into(),
        }
    }

    /// Create a new "execution failed" error.
    pub fn execution_failed(msg: impl Into<String>) -> Self {
        Self::ExecutionFailed(msg.into())
    }

    /// Create a new "internal" error.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Stable code reported in execution envelopes.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "NOT_FOUND",
            Self::InvalidArguments(_) => "INVALID_ARGUMENTS",
            Self::Configuration(_) => "CONFIGURATION_ERROR",
            Self::Upstream { .. } => "UPSTREAM_ERROR",
            Self::Cli { .. } => "CLI_ERROR",
            Self::ExecutionFailed(_) => "EXECUTION_FAILED",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Upstream or process details worth keeping next to the message.
    pub fn details(&self) -> Option<Value> {
        match self {
            Self::Upstream { status, code, .. } => Some(json!({
                "status": status,
                "upstreamCode": code,
            })),
            Self::Cli {
                command, exit_code, ..
            } => Some(json!({
                "command": command,
                "exitCode": exit_code,
            })),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for ToolError {
    fn from(e: serde_json::Error) -> Self {
        Self::InvalidArguments(e.to_string())
    }
}
