//! Core module containing shared infrastructure components.
//!
//! Configuration, error handling, the server state and lifecycle, the
//! per-port instance lock, working-directory security and the transport
//! layer.

pub mod config;
pub mod error;
pub mod lock;
pub mod security;
pub mod server;
pub mod transport;

pub use config::Config;
pub use error::{Error, Result};
pub use lock::{InstanceLock, LockError};
pub use security::{PathSecurityError, validate_working_dir};
pub use server::{HealthReport, McpServer};
pub use transport::{TransportConfig, TransportService};
