use thiserror::Error;

use crate::storage::models::{Password, MAX_FILE_SIZE_HARD_CAP};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Process configuration, read once at start-up. The runtime upload policy
/// lives in the database instead (see `RuntimeConfig`).
#[derive(Debug, Clone)]
pub struct Config {
    pub node: NodeConfig,
    pub auth: AuthConfig,
    /// Largest request body the HTTP layer will buffer, in bytes
    pub max_request_body: u64,
}

#[derive(Debug, Clone)]
pub struct NodeConfig {
    pub bind_address: String,
    pub data_dir: String,
}

#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Identity seeded as Admin when no Admin exists
    pub bootstrap_admin: String,
    /// Password given to the seeded Admin; required on a fresh data dir
    pub bootstrap_admin_password: Option<Password>,
    pub session_ttl_secs: u64,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            data_dir: "./data".to_string(),
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            bootstrap_admin: "admin".to_string(),
            bootstrap_admin_password: None,
            session_ttl_secs: 24 * 60 * 60,
        }
    }
}

/// Multipart framing overhead allowed on top of the largest permitted file.
const REQUEST_BODY_OVERHEAD: u64 = 1024 * 1024;

impl Config {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        let node_defaults = NodeConfig::default();
        let defaults = AuthConfig::default();

        let bind_address =
            std::env::var("BIND_ADDRESS").unwrap_or(node_defaults.bind_address);

        let data_dir = std::env::var("DATA_DIR").unwrap_or(node_defaults.data_dir);

        let bootstrap_admin =
            std::env::var("BOOTSTRAP_ADMIN").unwrap_or(defaults.bootstrap_admin);

        let bootstrap_admin_password = std::env::var("BOOTSTRAP_ADMIN_PASSWORD")
            .ok()
            .filter(|s| !s.is_empty())
            .map(Password::new);

        let session_ttl_secs = std::env::var("SESSION_TTL_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.session_ttl_secs);

        let max_request_body = std::env::var("MAX_REQUEST_BODY")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(MAX_FILE_SIZE_HARD_CAP + REQUEST_BODY_OVERHEAD);

        let config = Config {
            node: NodeConfig {
                bind_address,
                data_dir,
            },
            auth: AuthConfig {
                bootstrap_admin,
                bootstrap_admin_password,
                session_ttl_secs,
            },
            max_request_body,
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.node.bind_address.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "BIND_ADDRESS cannot be empty".to_string(),
            ));
        }

        if self.auth.bootstrap_admin.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "BOOTSTRAP_ADMIN cannot be empty".to_string(),
            ));
        }

        if self.auth.session_ttl_secs == 0 {
            return Err(ConfigError::ValidationError(
                "SESSION_TTL_SECS must be greater than 0".to_string(),
            ));
        }

        if self.max_request_body < MAX_FILE_SIZE_HARD_CAP {
            tracing::warn!(
                "MAX_REQUEST_BODY ({}) is below the upload hard cap ({}). \
                 Uploads near the configured limit may be rejected by the HTTP layer.",
                self.max_request_body,
                MAX_FILE_SIZE_HARD_CAP
            );
        }

        Ok(())
    }
}
