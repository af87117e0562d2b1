/// Configuration management for the Flowdock service
///
/// Handles server configuration and the location of the workflow registry.

use serde::{Deserialize, Serialize};

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server configuration
    pub server: ServerConfig,
    /// Workflow registry configuration
    pub registry: RegistryConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server bind address (e.g., "0.0.0.0")
    pub host: String,
    /// Server port number
    pub port: u16,
    /// Default tracing filter when RUST_LOG is unset (e.g., "info", "flowdock=debug")
    pub log_level: String,
    /// Prefix every API route is mounted under (e.g., "/api/v1")
    pub api_prefix: String,
    /// Service name reported in the startup log
    pub project_name: String,
}

/// Workflow registry configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Root directory holding one subdirectory per workflow (default: "workflows")
    pub workflows_dir: String,
}

impl Default for Config {
    /// Default configuration with ENV_VAR support for k8s/container deployment
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: env_or("FLOWDOCK_HOST", "0.0.0.0"),
                port: env_or("FLOWDOCK_PORT", "8000").parse().unwrap_or(8000),
                log_level: env_or("FLOWDOCK_LOG_LEVEL", "info"),
                api_prefix: normalize_prefix(&env_or("FLOWDOCK_API_PREFIX", "/api/v1")),
                project_name: env_or("FLOWDOCK_PROJECT_NAME", "Flowdock"),
            },
            registry: RegistryConfig {
                workflows_dir: env_or("FLOWDOCK_WORKFLOWS_DIR", "workflows"),
            },
        }
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Leading slash, no trailing slash; empty means "mount at root"
fn normalize_prefix(prefix: &str) -> String {
    let trimmed = prefix.trim().trim_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("/{}", trimmed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefix_is_normalized() {
        assert_eq!(normalize_prefix("/api/v1"), "/api/v1");
        assert_eq!(normalize_prefix("api/v1/"), "/api/v1");
        assert_eq!(normalize_prefix("/"), "");
        assert_eq!(normalize_prefix(""), "");
    }
}
