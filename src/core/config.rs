//! Configuration management for the catalog server.
//!
//! This module provides a centralized configuration structure that can be
//! populated from environment variables, configuration files, or defaults.

use super::transport::TransportConfig;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;
use tracing::{info, warn};

/// Main configuration structure for the catalog server.
///
/// This struct contains all configurable aspects of the server, organized
/// by domain for clarity and maintainability.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server identification and metadata.
    pub server: ServerConfig,

    /// Logging configuration.
    pub logging: LoggingConfig,

    /// Transport configuration.
    pub transport: TransportConfig,

    /// Registry document and hot-reload configuration.
    pub registry: RegistryConfig,

    /// Execution history configuration.
    pub history: HistoryConfig,

    /// Single-instance lock configuration.
    pub instance: InstanceConfig,

    /// External API credentials configuration.
    pub credentials: CredentialsConfig,

    /// Security and path validation configuration.
    pub security: SecurityConfig,
}

/// Server identification configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// The name of the server as reported to clients.
    pub name: String,

    /// The version of the server.
    pub version: String,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "trace").
    pub level: String,

    /// Whether to include timestamps in log output.
    pub with_timestamps: bool,
}

/// Registry document location and reload behaviour.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Path of the generated registry document.
    pub path: PathBuf,

    /// Directory holding tool source files (documentation, templates).
    pub tools_dir: PathBuf,

    /// Quiet period after the last registry change before reloading.
    pub debounce_ms: u64,

    /// Whether to watch the registry and tool sources for changes.
    pub watch: bool,

    /// Write the registry from the built-in manifests when it is missing at startup.
    pub generate_if_missing: bool,
}

/// Execution history configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryConfig {
    /// Maximum number of execution records retained in memory.
    pub limit: usize,
}

/// Single-instance lock configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstanceConfig {
    /// Directory where per-port lock files are created.
    pub lock_dir: PathBuf,
}

/// Configuration for external API credentials.
///
/// Each adapter reads only its own entries; nothing here is required at startup.
#[derive(Clone, Serialize, Deserialize)]
pub struct CredentialsConfig {
    /// DocuSign OAuth access token.
    pub docusign_access_token: Option<String>,

    /// DocuSign account ID used in envelope URLs.
    pub docusign_account_id: Option<String>,

    /// DocuSign REST base path (demo or production).
    pub docusign_base_path: String,

    /// Supabase personal access token for the management API.
    pub supabase_access_token: Option<String>,

    /// Supabase management API base URL.
    pub supabase_api_url: String,

    /// shadcn/ui component registry base URL.
    pub shadcn_registry_url: String,
}

/// Custom Debug implementation to redact secrets from logs.
impl std::fmt::Debug for CredentialsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialsConfig")
            .field(
                "docusign_access_token",
                &self.docusign_access_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("docusign_account_id", &self.docusign_account_id)
            .field("docusign_base_path", &self.docusign_base_path)
            .field(
                "supabase_access_token",
                &self.supabase_access_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("supabase_api_url", &self.supabase_api_url)
            .field("shadcn_registry_url", &self.shadcn_registry_url)
            .finish()
    }
}

/// Configuration for security and path validation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    /// Optional root directory for CLI working directories.
    /// If None, no path restrictions are enforced.
    pub root_path: Option<PathBuf>,

    /// Whether to allow symlinks in path validation.
    /// If false, symlinks pointing outside the root are rejected.
    pub allow_symlinks: bool,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("registry/mcp-registry.json"),
            tools_dir: PathBuf::from("tools"),
            debounce_ms: 500,
            watch: true,
            generate_if_missing: true,
        }
    }
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self { limit: 500 }
    }
}

impl Default for InstanceConfig {
    fn default() -> Self {
        Self {
            lock_dir: std::env::temp_dir(),
        }
    }
}

impl Default for CredentialsConfig {
    fn default() -> Self {
        Self {
            docusign_access_token: None,
            docusign_account_id: None,
            docusign_base_path: "https://demo.docusign.net/restapi".to_string(),
            supabase_access_token: None,
            supabase_api_url: "https://api.supabase.com".to_string(),
            shadcn_registry_url: "https://ui.shadcn.com/r".to_string(),
        }
    }
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            root_path: None,
            allow_symlinks: true,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                name: "mcp-catalog-server".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                with_timestamps: true,
            },
            transport: TransportConfig::default(),
            registry: RegistryConfig::default(),
            history: HistoryConfig::default(),
            instance: InstanceConfig::default(),
            credentials: CredentialsConfig::default(),
            security: SecurityConfig::default(),
        }
    }
}

impl Config {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from environment variables.
    ///
    /// Environment variables are expected to be prefixed with `MCP_`.
    /// For example: `MCP_SERVER_NAME`, `MCP_LOG_LEVEL`. Adapter credentials
    /// use their vendor names (`DOCUSIGN_*`, `SUPABASE_*`, `SHADCN_*`).
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let mut config = Self::default();

        if let Ok(name) = std::env::var("MCP_SERVER_NAME") {
            config.server.name = name;
        }

        if let Ok(level) = std::env::var("MCP_LOG_LEVEL") {
            config.logging.level = level;
        }
        if let Some(timestamps) = parse_env("MCP_LOG_TIMESTAMPS") {
            config.logging.with_timestamps = timestamps;
        }

        config.transport = TransportConfig::from_env();

        // Registry and hot-reload
        if let Ok(path) = std::env::var("MCP_REGISTRY_PATH") {
            config.registry.path = PathBuf::from(path);
        }
        if let Ok(dir) = std::env::var("MCP_TOOLS_DIR") {
            config.registry.tools_dir = PathBuf::from(dir);
        }
        if let Some(ms) = parse_env("MCP_RELOAD_DEBOUNCE_MS") {
            config.registry.debounce_ms = ms;
        }
        if let Some(watch) = parse_env("MCP_WATCH") {
            config.registry.watch = watch;
        }
        if let Some(generate) = parse_env("MCP_REGISTRY_AUTOGENERATE") {
            config.registry.generate_if_missing = generate;
        }

        if let Some(limit) = parse_env("MCP_HISTORY_LIMIT") {
            config.history.limit = limit;
        }

        if let Ok(dir) = std::env::var("MCP_LOCK_DIR") {
            config.instance.lock_dir = PathBuf::from(dir);
        }

        config.credentials = CredentialsConfig::from_env();

        // Load security configuration
        if let Ok(root_path) = std::env::var("MCP_ROOT_PATH") {
            config.security.root_path = Some(PathBuf::from(root_path));
            info!("Path security enabled: root directory set to {:?}", config.security.root_path);
        } else {
            warn!(
                "MCP_ROOT_PATH not set - no path restrictions active. \
                 CLI tools may run in any working directory."
            );
        }

        if let Some(allow_symlinks) = parse_env("MCP_ALLOW_SYMLINKS") {
            config.security.allow_symlinks = allow_symlinks;
            info!("Symlinks allowed: {}", config.security.allow_symlinks);
        }

        config
    }
}

impl CredentialsConfig {
    /// Load adapter credentials, keeping defaults for anything unset.
    fn from_env() -> Self {
        let mut creds = Self::default();

        creds.docusign_access_token = std::env::var("DOCUSIGN_ACCESS_TOKEN").ok();
        creds.docusign_account_id = std::env::var("DOCUSIGN_ACCOUNT_ID").ok();
        if let Ok(base) = std::env::var("DOCUSIGN_BASE_PATH") {
            creds.docusign_base_path = base;
        }

        creds.supabase_access_token = std::env::var("SUPABASE_ACCESS_TOKEN").ok();
        if let Ok(url) = std::env::var("SUPABASE_API_URL") {
            creds.supabase_api_url = url;
        }

        if let Ok(url) = std::env::var("SHADCN_REGISTRY_URL") {
            creds.shadcn_registry_url = url;
        }

        if creds.docusign_access_token.is_none() {
            info!("DOCUSIGN_ACCESS_TOKEN not set - docusign tools will report a configuration error");
        }
        if creds.supabase_access_token.is_none() {
            info!("SUPABASE_ACCESS_TOKEN not set - supabase API tools will report a configuration error");
        }

        creds
    }
}

/// Parse an environment variable, keeping the default on absence or bad input.
fn parse_env<T: FromStr>(key: &str) -> Option<T> {
    let raw = std::env::var(key).ok()?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!("Ignoring invalid value for {}: {:?}", key, raw);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // Mutex to ensure env var tests run serially
    static ENV_TEST_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn test_registry_from_env() {
        let _lock = ENV_TEST_LOCK.lock().unwrap();
        unsafe {
            std::env::set_var("MCP_REGISTRY_PATH", "/tmp/custom-registry.json");
            std::env::set_var("MCP_RELOAD_DEBOUNCE_MS", "250");
            std::env::set_var("MCP_WATCH", "false");
        }
        let config = Config::from_env();
        assert_eq!(
            config.registry.path,
            PathBuf::from("/tmp/custom-registry.json")
        );
        assert_eq!(config.registry.debounce_ms, 250);
        assert!(!config.registry.watch);
        unsafe {
            std::env::remove_var("MCP_REGISTRY_PATH");
            std::env::remove_var("MCP_RELOAD_DEBOUNCE_MS");
            std::env::remove_var("MCP_WATCH");
        }
    }

    #[test]
    fn test_invalid_number_keeps_default() {
        let _lock = ENV_TEST_LOCK.lock().unwrap();
        unsafe {
            std::env::set_var("MCP_HISTORY_LIMIT", "lots");
        }
        let config = Config::from_env();
        assert_eq!(config.history.limit, 500);
        unsafe {
            std::env::remove_var("MCP_HISTORY_LIMIT");
        }
    }

    #[test]
    fn test_credentials_from_env() {
        let _lock = ENV_TEST_LOCK.lock().unwrap();
        unsafe {
            std::env::set_var("SUPABASE_ACCESS_TOKEN", "sbp_test_12345");
        }
        let config = Config::from_env();
        assert_eq!(
            config.credentials.supabase_access_token.as_deref(),
            Some("sbp_test_12345")
        );
        unsafe {
            std::env::remove_var("SUPABASE_ACCESS_TOKEN");
        }
    }

    #[test]
    fn test_credentials_redacted_in_debug() {
        let creds = CredentialsConfig {
            docusign_access_token: Some("super_secret_token".to_string()),
            supabase_access_token: Some("sbp_secret".to_string()),
            ..CredentialsConfig::default()
        };
        let debug_str = format!("{:?}", creds);
        assert!(debug_str.contains("REDACTED"));
        assert!(!debug_str.contains("super_secret_token"));
        assert!(!debug_str.contains("sbp_secret"));
    }

    #[test]
    fn test_default_debounce_is_half_second() {
        let config = Config::default();
        assert_eq!(config.registry.debounce_ms, 500);
        assert!(config.credentials.docusign_access_token.is_none());
    }
}
