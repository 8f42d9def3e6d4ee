//! Transport error types.

use thiserror::Error;

/// Result type for transport operations.
pub type TransportResult<T> = Result<T, TransportError>;

/// Errors that end a transport. Per-request failures never surface here;
/// they are answered as error bodies or envelopes.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The HTTP listener could not bind (port in use, bad host).
    #[error("Failed to bind to {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    /// The HTTP server stopped with an I/O error.
    #[error("HTTP server on {address} failed: {source}")]
    Serve {
        address: String,
        #[source]
        source: std::io::Error,
    },

    /// The MCP handshake over stdin/stdout failed.
    #[error("STDIO initialization failed: {0}")]
    StdioInit(String),

    /// The running MCP session ended abnormally.
    #[error("MCP session error: {0}")]
    Session(String),
}

impl TransportError {
    pub fn bind(address: impl Into<String>, source: std::io::Error) -> Self {
        Self::Bind {
            address: address.into(),
            source,
        }
    }

    pub fn serve(address: impl Into<String>, source: std::io::Error) -> Self {
        Self::Serve {
            address: address.into(),
            source,
        }
    }
}
