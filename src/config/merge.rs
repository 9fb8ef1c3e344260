//! Merging YAML overrides onto the environment-derived base configuration.
//!
//! Priority, highest first: YAML file, environment variables, defaults.

use super::yaml::YamlConfig;
use super::{ServerConfig, TlsConfig};

/// Apply the YAML overrides on top of the environment base.
pub(super) fn merge(base: ServerConfig, yaml: YamlConfig) -> ServerConfig {
    let tls = match yaml.server.tls {
        Some(section) => Some(TlsConfig {
            cert_path: section.cert_path,
            key_path: section.key_path,
        }),
        None => base.tls,
    };

    ServerConfig {
        host: yaml.server.host.unwrap_or(base.host),
        port: yaml.server.port.unwrap_or(base.port),
        tls,
        gemini_api_key: yaml.gemini.api_key.or(base.gemini_api_key),
        text_model: yaml.gemini.text_model.unwrap_or(base.text_model),
        live_model: yaml.gemini.live_model.unwrap_or(base.live_model),
        api_base: yaml.gemini.api_base.unwrap_or(base.api_base),
        live_endpoint: yaml.gemini.live_endpoint.unwrap_or(base.live_endpoint),
        cors_allowed_origins: yaml
            .security
            .cors_allowed_origins
            .or(base.cors_allowed_origins),
        rate_limit_requests_per_second: yaml
            .security
            .rate_limit_requests_per_second
            .unwrap_or(base.rate_limit_requests_per_second),
        rate_limit_burst_size: yaml
            .security
            .rate_limit_burst_size
            .unwrap_or(base.rate_limit_burst_size),
        max_websocket_connections: yaml
            .security
            .max_websocket_connections
            .or(base.max_websocket_connections),
        max_connections_per_ip: yaml
            .security
            .max_connections_per_ip
            .unwrap_or(base.max_connections_per_ip),
    }
}
