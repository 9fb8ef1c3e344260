//! YAML configuration file loading.
//!
//! The YAML file mirrors [`ServerConfig`](super::ServerConfig) with every
//! field optional; only the fields present override the environment base.
//!
//! # Example file
//! ```yaml
//! server:
//!   host: "0.0.0.0"
//!   port: 8000
//!   tls:
//!     cert_path: "/etc/certs/server.pem"
//!     key_path: "/etc/certs/server.key"
//! gemini:
//!   api_key: "..."
//!   text_model: "gemini-2.5-flash"
//!   live_model: "gemini-2.5-flash"
//! security:
//!   cors_allowed_origins: "*"
//!   rate_limit_requests_per_second: 60
//!   rate_limit_burst_size: 10
//!   max_websocket_connections: 256
//!   max_connections_per_ip: 8
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use super::ConfigError;

/// Root of the YAML configuration file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct YamlConfig {
    #[serde(default)]
    pub server: YamlServerSection,
    #[serde(default)]
    pub gemini: YamlGeminiSection,
    #[serde(default)]
    pub security: YamlSecuritySection,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct YamlServerSection {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub tls: Option<YamlTlsSection>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct YamlTlsSection {
    pub cert_path: PathBuf,
    pub key_path: PathBuf,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct YamlGeminiSection {
    pub api_key: Option<String>,
    pub text_model: Option<String>,
    pub live_model: Option<String>,
    pub api_base: Option<String>,
    pub live_endpoint: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct YamlSecuritySection {
    pub cors_allowed_origins: Option<String>,
    pub rate_limit_requests_per_second: Option<u32>,
    pub rate_limit_burst_size: Option<u32>,
    pub max_websocket_connections: Option<usize>,
    pub max_connections_per_ip: Option<usize>,
}

impl YamlConfig {
    /// Read and parse the YAML configuration file at `path`.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;
        serde_yaml::from_str(&contents).map_err(|source| ConfigError::FileParse {
            path: path.to_path_buf(),
            source,
        })
    }
}
