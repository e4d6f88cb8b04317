use std::path::PathBuf;

use super::yaml::YamlConfig;
use super::{ConfigError, ServerConfig, TlsConfig, env};

/// Load the environment configuration and apply YAML overrides on top.
pub(super) fn merge_config(yaml: Option<YamlConfig>) -> Result<ServerConfig, ConfigError> {
    let mut config = env::load_from_env()?;
    let Some(yaml) = yaml else {
        return Ok(config);
    };

    if let Some(server) = yaml.server {
        if let Some(host) = server.host {
            config.host = host;
        }
        if let Some(port) = server.port {
            config.port = port;
        }
        if let Some(tls) = server.tls
            && let (Some(cert), Some(key)) = (tls.cert_path, tls.key_path)
        {
            config.tls = Some(TlsConfig {
                cert_path: PathBuf::from(cert),
                key_path: PathBuf::from(key),
            });
        }
    }

    // `RealtimeYaml` zeroizes its key on drop, so fields are taken, not moved.
    if let Some(mut realtime) = yaml.realtime {
        if let Some(api_key) = realtime.api_key.take() {
            config.openai_api_key = Some(api_key);
        }
        if let Some(url) = realtime.url.take() {
            config.realtime_url = url;
        }
        if realtime.model.is_some() {
            config.realtime_model = realtime.model.take();
        }
        if let Some(timeout) = realtime.authorize_timeout_seconds {
            config.authorize_timeout_seconds = timeout;
        }
        if let Some(size) = realtime.stream_buffer_size {
            config.stream_buffer_size = size;
        }
        if realtime.default_instructions.is_some() {
            config.default_instructions = realtime.default_instructions.take();
        }
    }

    if let Some(security) = yaml.security {
        if security.cors_allowed_origins.is_some() {
            config.cors_allowed_origins = security.cors_allowed_origins;
        }
        if let Some(rps) = security.rate_limit_requests_per_second {
            config.rate_limit_requests_per_second = rps;
        }
        if let Some(burst) = security.rate_limit_burst_size {
            config.rate_limit_burst_size = burst;
        }
    }

    Ok(config)
}
