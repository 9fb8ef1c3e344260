//! Configuration validation logic.

use url::Url;

use super::{ConfigError, ServerConfig};

/// Validate a fully merged configuration.
///
/// Catching these at startup gives a clear message instead of a runtime
/// failure on the first session.
pub(super) fn validate(config: &ServerConfig) -> Result<(), ConfigError> {
    if config.port == 0 {
        return Err(ConfigError::Validation(
            "server port must not be 0".to_string(),
        ));
    }

    if config.text_model.trim().is_empty() || config.live_model.trim().is_empty() {
        return Err(ConfigError::Validation(
            "model names must not be empty".to_string(),
        ));
    }

    let api_base = Url::parse(&config.api_base)
        .map_err(|e| ConfigError::Validation(format!("api_base is not a valid URL: {e}")))?;
    if !matches!(api_base.scheme(), "http" | "https") {
        return Err(ConfigError::Validation(format!(
            "api_base must use http or https, got {}",
            api_base.scheme()
        )));
    }

    let live_endpoint = Url::parse(&config.live_endpoint)
        .map_err(|e| ConfigError::Validation(format!("live_endpoint is not a valid URL: {e}")))?;
    if !matches!(live_endpoint.scheme(), "ws" | "wss") {
        return Err(ConfigError::Validation(format!(
            "live_endpoint must use ws or wss, got {}",
            live_endpoint.scheme()
        )));
    }

    if config.rate_limit_requests_per_second == 0 {
        return Err(ConfigError::Validation(
            "rate_limit_requests_per_second must be greater than 0".to_string(),
        ));
    }

    if config.max_connections_per_ip == 0 {
        return Err(ConfigError::Validation(
            "max_connections_per_ip must be greater than 0".to_string(),
        ));
    }

    if let Some(max) = config.max_websocket_connections
        && max == 0
    {
        return Err(ConfigError::Validation(
            "max_websocket_connections must be greater than 0 when set".to_string(),
        ));
    }

    Ok(())
}
