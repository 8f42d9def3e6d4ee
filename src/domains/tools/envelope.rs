//! The uniform result wrapper returned by every tool invocation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::error::ToolError;
use crate::domains::registry::ExecutionType;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvelopeError {
    pub code: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl From<&ToolError> for EnvelopeError {
    fn from(err: &ToolError) -> Self {
        Self {
            code: err.code().to_string(),
            message: err.to_string(),
            details: err.details(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionMetadata {
    pub tool: String,
    pub server: String,
    /// Absent when the tool could not be resolved.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execution_type: Option<ExecutionType>,
    pub execution_time_ms: u64,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl ExecutionMetadata {
    pub fn new(server: &str, tool: &str, execution_type: Option<ExecutionType>) -> Self {
        Self {
            tool: tool.to_string(),
            server: server.to_string(),
            execution_type,
            execution_time_ms: 0,
            timestamp: Utc::now(),
            warnings: Vec::new(),
        }
    }
}

/// Success/failure wrapper. Exactly one of `data` and `error` is set, as
/// told by `success`; the fields are private so only the constructors can
/// build one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionEnvelope {
    success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    error: Option<EnvelopeError>,
    metadata: ExecutionMetadata,
}

impl ExecutionEnvelope {
    pub fn success(data: Value, metadata: ExecutionMetadata) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            metadata,
        }
    }

    pub fn failure(error: EnvelopeError, metadata: ExecutionMetadata) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error),
            metadata,
        }
    }

    pub fn from_error(err: &ToolError, metadata: ExecutionMetadata) -> Self {
        Self::failure(EnvelopeError::from(err), metadata)
    }

    pub fn is_success(&self) -> bool {
        self.success
    }

    pub fn data(&self) -> Option<&Value> {
        self.data.as_ref()
    }

    pub fn error(&self) -> Option<&EnvelopeError> {
        self.error.as_ref()
    }

    pub fn error_code(&self) -> Option<&str> {
        self.error.as_ref().map(|e| e.code.as_str())
    }

    pub fn metadata(&self) -> &ExecutionMetadata {
        &self.metadata
    }
}
