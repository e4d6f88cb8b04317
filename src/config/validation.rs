use url::Url;

use super::{ConfigError, ServerConfig};

/// Validate a fully merged configuration.
pub(super) fn validate(config: &ServerConfig) -> Result<(), ConfigError> {
    if config.port == 0 {
        return Err(ConfigError::Invalid("port must be non-zero".to_string()));
    }

    validate_realtime_url(&config.realtime_url)?;

    if config.authorize_timeout_seconds == 0 {
        return Err(ConfigError::Invalid(
            "authorize_timeout_seconds must be greater than 0".to_string(),
        ));
    }
    if config.stream_buffer_size == 0 {
        return Err(ConfigError::Invalid(
            "stream_buffer_size must be greater than 0".to_string(),
        ));
    }
    if config.rate_limit_burst_size == 0 {
        return Err(ConfigError::Invalid(
            "rate_limit_burst_size must be greater than 0".to_string(),
        ));
    }

    Ok(())
}

fn validate_realtime_url(raw: &str) -> Result<(), ConfigError> {
    let url = Url::parse(raw)
        .map_err(|e| ConfigError::Invalid(format!("realtime URL '{raw}' is invalid: {e}")))?;

    match url.scheme() {
        "ws" | "wss" => Ok(()),
        other => Err(ConfigError::Invalid(format!(
            "realtime URL must use ws:// or wss://, got '{other}://'"
        ))),
    }
}
