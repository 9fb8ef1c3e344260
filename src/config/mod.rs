//! Configuration module for the calling-agent gateway
//!
//! Configuration is assembled from three sources, lowest to highest priority:
//! built-in defaults, environment variables (including values loaded from a
//! `.env` file by `main`), and an optional YAML file passed on the command
//! line. The submodules keep each concern separate:
//!
//! - `env`: environment variable loading
//! - `yaml`: YAML configuration file loading
//! - `merge`: merging YAML overrides onto the environment base
//! - `validation`: configuration validation logic
//!
//! # Example
//! ```rust,no_run
//! use ai_calling_agent::config::ServerConfig;
//! use std::path::PathBuf;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // Load from environment variables only
//! let config = ServerConfig::from_env()?;
//!
//! // Load from YAML file with environment variables as the base
//! let config = ServerConfig::from_file(&PathBuf::from("config.yaml"))?;
//!
//! println!("Server listening on {}", config.address());
//! # Ok(())
//! # }
//! ```

use std::path::{Path, PathBuf};

use thiserror::Error;

mod env;
mod merge;
mod validation;
mod yaml;

pub use yaml::YamlConfig;

/// Default Gemini REST API base for `generateContent` calls.
pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Default Gemini Live API WebSocket endpoint (BidiGenerateContent).
pub const DEFAULT_LIVE_ENDPOINT: &str = "wss://generativelanguage.googleapis.com/ws/google.ai.generativelanguage.v1beta.GenerativeService.BidiGenerateContent";

/// Default model for both text generation and Live sessions.
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An environment variable held a value that failed to parse
    #[error("invalid value for {name}: {message}")]
    InvalidValue { name: String, message: String },

    /// The YAML configuration file could not be read
    #[error("failed to read config file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The YAML configuration file could not be parsed
    #[error("failed to parse config file {path}: {source}")]
    FileParse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// A validation rule failed
    #[error("invalid configuration: {0}")]
    Validation(String),
}

/// TLS configuration for HTTPS and WSS
#[derive(Debug, Clone)]
pub struct TlsConfig {
    /// Path to the TLS certificate file (PEM format)
    pub cert_path: PathBuf,
    /// Path to the TLS private key file (PEM format)
    pub key_path: PathBuf,
}

/// Server configuration
///
/// Everything needed to run the gateway:
/// - server settings (host, port, TLS)
/// - Gemini API settings (key, model names, endpoint overrides)
/// - security settings (CORS, rate limiting, connection limits)
#[derive(Debug, Clone)]
pub struct ServerConfig {
    // Server settings
    pub host: String,
    pub port: u16,

    // TLS configuration (optional)
    pub tls: Option<TlsConfig>,

    /// Gemini API key. Optional at load time so that `/health` and the Twilio
    /// webhook keep working without one; chat and voice sessions fail with a
    /// configuration error instead.
    pub gemini_api_key: Option<String>,

    /// Model used by `POST /chat` (`generateContent`)
    pub text_model: String,

    /// Model used by Live voice sessions (`BidiGenerateContent`)
    pub live_model: String,

    /// REST base URL, overridable for tests and proxies
    pub api_base: String,

    /// Live WebSocket endpoint, overridable for tests and proxies
    pub live_endpoint: String,

    /// Comma-separated CORS origins, or `*` for any origin.
    /// `None` means same-origin only.
    pub cors_allowed_origins: Option<String>,

    // Rate limiting
    pub rate_limit_requests_per_second: u32,
    pub rate_limit_burst_size: u32,

    /// Global cap on concurrent WebSocket sessions (`None` = unlimited)
    pub max_websocket_connections: Option<usize>,

    /// Per-IP cap on concurrent WebSocket sessions
    pub max_connections_per_ip: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            tls: None,
            gemini_api_key: None,
            text_model: DEFAULT_MODEL.to_string(),
            live_model: DEFAULT_MODEL.to_string(),
            api_base: DEFAULT_API_BASE.to_string(),
            live_endpoint: DEFAULT_LIVE_ENDPOINT.to_string(),
            cors_allowed_origins: None,
            rate_limit_requests_per_second: 60,
            rate_limit_burst_size: 10,
            max_websocket_connections: None,
            max_connections_per_ip: 8,
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables only.
    pub fn from_env() -> Result<Self, ConfigError> {
        let config = env::load()?;
        validation::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a YAML file, with environment variables as the
    /// base. YAML values override environment values.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let yaml_config = YamlConfig::from_file(path)?;
        let config = merge::merge(env::load()?, yaml_config);
        validation::validate(&config)?;
        Ok(config)
    }

    /// Get the server address as a string in the format "host:port".
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Check if TLS is enabled.
    pub fn is_tls_enabled(&self) -> bool {
        self.tls.is_some()
    }

    /// Get the Gemini API key, or a configuration error naming the variable
    /// that is missing.
    pub fn require_api_key(&self) -> Result<&str, ConfigError> {
        self.gemini_api_key.as_deref().ok_or_else(|| {
            ConfigError::Validation(
                "GEMINI_API_KEY is not configured in the server environment".to_string(),
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.port, 8000);
        assert_eq!(config.text_model, DEFAULT_MODEL);
        assert_eq!(config.api_base, DEFAULT_API_BASE);
        assert!(config.tls.is_none());
        assert!(validation::validate(&config).is_ok());
    }

    #[test]
    fn test_address_format() {
        let config = ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 9000,
            ..Default::default()
        };
        assert_eq!(config.address(), "127.0.0.1:9000");
    }

    #[test]
    fn test_require_api_key_missing() {
        let config = ServerConfig::default();
        assert!(config.require_api_key().is_err());
    }

    #[test]
    fn test_require_api_key_present() {
        let config = ServerConfig {
            gemini_api_key: Some("test-key".to_string()),
            ..Default::default()
        };
        assert_eq!(config.require_api_key().unwrap(), "test-key");
    }
}
