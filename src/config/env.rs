//! Environment variable loading.
//!
//! | Variable | Field |
//! |----------|-------|
//! | `HOST`, `PORT` | bind address |
//! | `TLS_CERT_PATH`, `TLS_KEY_PATH` | TLS (both required to enable) |
//! | `OPENAI_API_KEY` | realtime credential |
//! | `OPENAI_REALTIME_URL`, `OPENAI_REALTIME_MODEL` | endpoint |
//! | `REALTIME_AUTHORIZE_TIMEOUT_SECONDS` | readiness deadline |
//! | `REALTIME_STREAM_BUFFER_SIZE` | output stream capacity |
//! | `REALTIME_DEFAULT_INSTRUCTIONS` | fallback system instructions |
//! | `CORS_ALLOWED_ORIGINS` | CORS |
//! | `RATE_LIMIT_REQUESTS_PER_SECOND`, `RATE_LIMIT_BURST_SIZE` | rate limiting |

use std::path::PathBuf;
use std::str::FromStr;

use super::{ConfigError, ServerConfig, TlsConfig};

/// Build a [`ServerConfig`] from environment variables over the defaults.
pub(super) fn load_from_env() -> Result<ServerConfig, ConfigError> {
    let defaults = ServerConfig::default();

    let tls = match (env_string("TLS_CERT_PATH"), env_string("TLS_KEY_PATH")) {
        (Some(cert), Some(key)) => Some(TlsConfig {
            cert_path: PathBuf::from(cert),
            key_path: PathBuf::from(key),
        }),
        _ => None,
    };

    Ok(ServerConfig {
        host: env_string("HOST").unwrap_or_else(|| defaults.host.clone()),
        port: env_parse("PORT", defaults.port)?,
        tls,
        openai_api_key: env_string("OPENAI_API_KEY"),
        realtime_url: env_string("OPENAI_REALTIME_URL")
            .unwrap_or_else(|| defaults.realtime_url.clone()),
        realtime_model: env_string("OPENAI_REALTIME_MODEL"),
        authorize_timeout_seconds: env_parse(
            "REALTIME_AUTHORIZE_TIMEOUT_SECONDS",
            defaults.authorize_timeout_seconds,
        )?,
        stream_buffer_size: env_parse("REALTIME_STREAM_BUFFER_SIZE", defaults.stream_buffer_size)?,
        default_instructions: env_string("REALTIME_DEFAULT_INSTRUCTIONS"),
        cors_allowed_origins: env_string("CORS_ALLOWED_ORIGINS"),
        rate_limit_requests_per_second: env_parse(
            "RATE_LIMIT_REQUESTS_PER_SECOND",
            defaults.rate_limit_requests_per_second,
        )?,
        rate_limit_burst_size: env_parse("RATE_LIMIT_BURST_SIZE", defaults.rate_limit_burst_size)?,
    })
}

/// Non-empty value of `name`, trimmed.
fn env_string(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn env_parse<T: FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env_string(name) {
        Some(value) => value
            .parse()
            .map_err(|_| ConfigError::InvalidEnv { name, value }),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::env;

    #[test]
    #[serial]
    fn test_env_string_trims_and_filters() {
        unsafe {
            env::set_var("REALTIME_DEFAULT_INSTRUCTIONS", "  Be concise  ");
        }
        assert_eq!(
            env_string("REALTIME_DEFAULT_INSTRUCTIONS"),
            Some("Be concise".to_string())
        );

        unsafe {
            env::set_var("REALTIME_DEFAULT_INSTRUCTIONS", "   ");
        }
        assert_eq!(env_string("REALTIME_DEFAULT_INSTRUCTIONS"), None);

        unsafe {
            env::remove_var("REALTIME_DEFAULT_INSTRUCTIONS");
        }
    }

    #[test]
    #[serial]
    fn test_tls_requires_both_paths() {
        unsafe {
            env::set_var("TLS_CERT_PATH", "/tmp/cert.pem");
            env::remove_var("TLS_KEY_PATH");
        }
        assert!(load_from_env().unwrap().tls.is_none());

        unsafe {
            env::set_var("TLS_KEY_PATH", "/tmp/key.pem");
        }
        let config = load_from_env().unwrap();
        let tls = config.tls.as_ref().unwrap();
        assert_eq!(tls.cert_path, PathBuf::from("/tmp/cert.pem"));
        assert_eq!(tls.key_path, PathBuf::from("/tmp/key.pem"));

        unsafe {
            env::remove_var("TLS_CERT_PATH");
            env::remove_var("TLS_KEY_PATH");
        }
    }

    #[test]
    #[serial]
    fn test_invalid_number() {
        unsafe {
            env::set_var("RATE_LIMIT_BURST_SIZE", "lots");
        }
        let err = load_from_env().unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid value for RATE_LIMIT_BURST_SIZE: 'lots'"
        );
        unsafe {
            env::remove_var("RATE_LIMIT_BURST_SIZE");
        }
    }
}
