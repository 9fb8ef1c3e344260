//! Environment variable loading for [`ServerConfig`].
//!
//! `.env` files are loaded by `main` (via `dotenvy`) before this module runs,
//! so a variable set in the real environment wins over a `.env` value.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use super::{ConfigError, ServerConfig, TlsConfig};

/// Read an optional variable, treating an empty value as unset.
fn var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// Read and parse an optional variable.
fn parsed<T: FromStr>(name: &str) -> Result<Option<T>, ConfigError>
where
    T::Err: std::fmt::Display,
{
    match var(name) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| ConfigError::InvalidValue {
                name: name.to_string(),
                message: e.to_string(),
            }),
        None => Ok(None),
    }
}

/// Build a [`ServerConfig`] from environment variables, falling back to the
/// defaults for anything unset.
pub(super) fn load() -> Result<ServerConfig, ConfigError> {
    let defaults = ServerConfig::default();

    let tls = match (var("TLS_CERT_PATH"), var("TLS_KEY_PATH")) {
        (Some(cert), Some(key)) => Some(TlsConfig {
            cert_path: PathBuf::from(cert),
            key_path: PathBuf::from(key),
        }),
        (None, None) => None,
        _ => {
            return Err(ConfigError::InvalidValue {
                name: "TLS_CERT_PATH / TLS_KEY_PATH".to_string(),
                message: "both must be set to enable TLS".to_string(),
            });
        }
    };

    Ok(ServerConfig {
        host: var("HOST").unwrap_or(defaults.host),
        port: parsed("PORT")?.unwrap_or(defaults.port),
        tls,
        gemini_api_key: var("GEMINI_API_KEY"),
        text_model: var("GEMINI_TEXT_MODEL").unwrap_or(defaults.text_model),
        live_model: var("GEMINI_LIVE_MODEL").unwrap_or(defaults.live_model),
        api_base: var("GEMINI_API_BASE").unwrap_or(defaults.api_base),
        live_endpoint: var("GEMINI_LIVE_ENDPOINT").unwrap_or(defaults.live_endpoint),
        cors_allowed_origins: var("CORS_ALLOWED_ORIGINS"),
        rate_limit_requests_per_second: parsed("RATE_LIMIT_RPS")?
            .unwrap_or(defaults.rate_limit_requests_per_second),
        rate_limit_burst_size: parsed("RATE_LIMIT_BURST")?
            .unwrap_or(defaults.rate_limit_burst_size),
        max_websocket_connections: parsed("MAX_WEBSOCKET_CONNECTIONS")?,
        max_connections_per_ip: parsed("MAX_CONNECTIONS_PER_IP")?
            .unwrap_or(defaults.max_connections_per_ip),
    })
}
