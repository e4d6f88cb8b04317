//! Configuration module for the realtime relay server
//!
//! This module handles server configuration from various sources: .env files, YAML files,
//! and environment variables. Priority: YAML > ENV vars > .env values > defaults.
//!
//! # Modules
//! - `yaml`: YAML configuration file loading
//! - `env`: Environment variable loading
//! - `merge`: Applying YAML overrides on top of the environment
//! - `validation`: Configuration validation logic
//!
//! # Example
//! ```rust,no_run
//! use realtime_relay::config::ServerConfig;
//! use std::path::PathBuf;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // Load from environment variables only
//! let config = ServerConfig::from_env()?;
//!
//! // Load from YAML file with environment variable overrides
//! let config_path = PathBuf::from("config.yaml");
//! let config = ServerConfig::from_file(&config_path)?;
//!
//! println!("Server listening on {}", config.address());
//! # Ok(())
//! # }
//! ```

use std::path::PathBuf;

use thiserror::Error;

mod env;
mod merge;
mod validation;
mod yaml;

pub use yaml::YamlConfig;

/// Default bind host
pub const DEFAULT_HOST: &str = "0.0.0.0";
/// Default bind port
pub const DEFAULT_PORT: u16 = 3001;
/// Default readiness deadline, in seconds
pub const DEFAULT_AUTHORIZE_TIMEOUT_SECONDS: u64 = 10;
/// Default output stream capacity, in chunks
pub const DEFAULT_STREAM_BUFFER_SIZE: usize = 64;
/// Default per-IP request rate
pub const DEFAULT_RATE_LIMIT_RPS: u32 = 60;
/// Default per-IP burst size
pub const DEFAULT_RATE_LIMIT_BURST: u32 = 10;

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse YAML config: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Invalid value for {name}: '{value}'")]
    InvalidEnv { name: &'static str, value: String },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// TLS configuration for HTTPS
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlsConfig {
    /// Path to the TLS certificate file (PEM format)
    pub cert_path: PathBuf,
    /// Path to the TLS private key file (PEM format)
    pub key_path: PathBuf,
}

/// Server configuration
///
/// Holds everything the server and the relay need:
/// - Bind address and optional TLS
/// - Realtime endpoint, credential and relay tuning
/// - Security settings (CORS, rate limiting)
#[derive(Debug, Clone)]
pub struct ServerConfig {
    // Server settings
    pub host: String,
    pub port: u16,

    // TLS configuration (optional)
    pub tls: Option<TlsConfig>,

    // Realtime endpoint
    pub openai_api_key: Option<String>,
    pub realtime_url: String,
    /// Model appended to the endpoint as `?model=`
    pub realtime_model: Option<String>,
    pub authorize_timeout_seconds: u64,
    pub stream_buffer_size: usize,
    /// System instructions used when a request carries no prompt
    pub default_instructions: Option<String>,

    // Security settings
    /// Comma-separated origins, or "*" for any
    pub cors_allowed_origins: Option<String>,
    pub rate_limit_requests_per_second: u32,
    pub rate_limit_burst_size: u32,
}

/// Zeroize secret fields when the configuration is dropped.
impl Drop for ServerConfig {
    fn drop(&mut self) {
        use zeroize::Zeroize;

        if let Some(ref mut key) = self.openai_api_key {
            key.zeroize();
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            tls: None,
            openai_api_key: None,
            realtime_url: crate::core::realtime::OPENAI_REALTIME_URL.to_string(),
            realtime_model: None,
            authorize_timeout_seconds: DEFAULT_AUTHORIZE_TIMEOUT_SECONDS,
            stream_buffer_size: DEFAULT_STREAM_BUFFER_SIZE,
            default_instructions: None,
            cors_allowed_origins: None,
            rate_limit_requests_per_second: DEFAULT_RATE_LIMIT_RPS,
            rate_limit_burst_size: DEFAULT_RATE_LIMIT_BURST,
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// Unset variables fall back to defaults. The `.env` file, if any, is
    /// loaded by the binary before this is called.
    pub fn from_env() -> Result<Self, ConfigError> {
        let config = env::load_from_env()?;
        validation::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a YAML file with environment variable base
    ///
    /// Priority order (highest to lowest):
    /// 1. YAML file values
    /// 2. Environment variables (actual ENV vars override .env values)
    /// 3. .env file values
    /// 4. Default values
    ///
    /// # Errors
    /// Returns an error if:
    /// - The YAML file cannot be read or is malformed
    /// - Environment variables have invalid formats
    /// - Configuration validation fails
    pub fn from_file(path: &PathBuf) -> Result<Self, ConfigError> {
        let yaml_config = YamlConfig::from_file(path)?;
        let config = merge::merge_config(Some(yaml_config))?;
        validation::validate(&config)?;
        Ok(config)
    }

    /// Get the server address as "host:port"
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Check if TLS is enabled
    pub fn is_tls_enabled(&self) -> bool {
        self.tls.is_some()
    }

    /// Check if a non-blank API key is configured
    pub fn has_api_key(&self) -> bool {
        self.openai_api_key
            .as_deref()
            .is_some_and(|key| !key.trim().is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::env;
    use std::fs;
    use tempfile::TempDir;

    // Helper to clean up environment variables
    fn cleanup_env_vars() {
        unsafe {
            env::remove_var("HOST");
            env::remove_var("PORT");
            env::remove_var("TLS_CERT_PATH");
            env::remove_var("TLS_KEY_PATH");
            env::remove_var("OPENAI_API_KEY");
            env::remove_var("OPENAI_REALTIME_URL");
            env::remove_var("OPENAI_REALTIME_MODEL");
            env::remove_var("REALTIME_AUTHORIZE_TIMEOUT_SECONDS");
            env::remove_var("REALTIME_STREAM_BUFFER_SIZE");
            env::remove_var("REALTIME_DEFAULT_INSTRUCTIONS");
            env::remove_var("CORS_ALLOWED_ORIGINS");
            env::remove_var("RATE_LIMIT_REQUESTS_PER_SECOND");
            env::remove_var("RATE_LIMIT_BURST_SIZE");
        }
    }

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.address(), "0.0.0.0:3001");
        assert_eq!(config.realtime_url, "wss://api.openai.com/v1/realtime");
        assert_eq!(config.authorize_timeout_seconds, 10);
        assert_eq!(config.stream_buffer_size, 64);
        assert!(!config.is_tls_enabled());
        assert!(!config.has_api_key());
    }

    #[test]
    fn test_has_api_key() {
        let mut config = ServerConfig::default();
        config.openai_api_key = Some("   ".to_string());
        assert!(!config.has_api_key());

        config.openai_api_key = Some("sk-test".to_string());
        assert!(config.has_api_key());
    }

    #[test]
    #[serial]
    fn test_from_env_defaults() {
        cleanup_env_vars();

        let config = ServerConfig::from_env().unwrap();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 3001);
        assert_eq!(config.rate_limit_requests_per_second, 60);
        assert_eq!(config.rate_limit_burst_size, 10);
        assert!(config.openai_api_key.is_none());

        cleanup_env_vars();
    }

    #[test]
    #[serial]
    fn test_from_env_values() {
        cleanup_env_vars();

        unsafe {
            env::set_var("PORT", "8080");
            env::set_var("OPENAI_API_KEY", "sk-env");
            env::set_var("OPENAI_REALTIME_MODEL", "gpt-4o-realtime-preview");
            env::set_var("REALTIME_AUTHORIZE_TIMEOUT_SECONDS", "3");
        }

        let config = ServerConfig::from_env().unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.openai_api_key, Some("sk-env".to_string()));
        assert_eq!(
            config.realtime_model,
            Some("gpt-4o-realtime-preview".to_string())
        );
        assert_eq!(config.authorize_timeout_seconds, 3);

        cleanup_env_vars();
    }

    #[test]
    #[serial]
    fn test_from_env_invalid_port() {
        cleanup_env_vars();

        unsafe {
            env::set_var("PORT", "not-a-port");
        }
        let result = ServerConfig::from_env();
        assert!(matches!(
            result,
            Err(ConfigError::InvalidEnv { name: "PORT", .. })
        ));

        cleanup_env_vars();
    }

    #[test]
    #[serial]
    fn test_from_env_rejects_zero_timeout() {
        cleanup_env_vars();

        unsafe {
            env::set_var("REALTIME_AUTHORIZE_TIMEOUT_SECONDS", "0");
        }
        assert!(matches!(
            ServerConfig::from_env(),
            Err(ConfigError::Invalid(_))
        ));

        cleanup_env_vars();
    }

    #[test]
    #[serial]
    fn test_from_file_yaml_only() {
        cleanup_env_vars();

        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.yaml");

        let yaml_content = r#"
server:
  host: "127.0.0.1"
  port: 8080

realtime:
  api_key: "yaml-key"
  model: "gpt-4o-realtime-preview"
  authorize_timeout_seconds: 5
  stream_buffer_size: 16
  default_instructions: "Be concise"

security:
  cors_allowed_origins: "*"
  rate_limit_requests_per_second: 20
"#;

        fs::write(&config_path, yaml_content).unwrap();

        let config = ServerConfig::from_file(&config_path).unwrap();

        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 8080);
        assert_eq!(config.openai_api_key, Some("yaml-key".to_string()));
        assert_eq!(
            config.realtime_model,
            Some("gpt-4o-realtime-preview".to_string())
        );
        assert_eq!(config.authorize_timeout_seconds, 5);
        assert_eq!(config.stream_buffer_size, 16);
        assert_eq!(config.default_instructions, Some("Be concise".to_string()));
        assert_eq!(config.cors_allowed_origins, Some("*".to_string()));
        assert_eq!(config.rate_limit_requests_per_second, 20);
        assert_eq!(config.rate_limit_burst_size, 10);

        cleanup_env_vars();
    }

    #[test]
    #[serial]
    fn test_from_file_yaml_overrides_env() {
        cleanup_env_vars();

        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.yaml");

        let yaml_content = r#"
server:
  host: "127.0.0.1"

realtime:
  api_key: "yaml-key"
"#;

        fs::write(&config_path, yaml_content).unwrap();

        unsafe {
            env::set_var("HOST", "0.0.0.0");
            env::set_var("PORT", "9000");
            env::set_var("OPENAI_API_KEY", "env-key");
        }

        let config = ServerConfig::from_file(&config_path).unwrap();

        // YAML overrides ENV
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.openai_api_key, Some("yaml-key".to_string()));
        // ENV value kept where YAML is silent
        assert_eq!(config.port, 9000);

        cleanup_env_vars();
    }

    #[test]
    #[serial]
    fn test_from_file_missing_file() {
        cleanup_env_vars();

        let config_path = PathBuf::from("/nonexistent/config.yaml");
        let result = ServerConfig::from_file(&config_path);

        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("Failed to read config file")
        );

        cleanup_env_vars();
    }

    #[test]
    #[serial]
    fn test_from_file_rejects_http_url() {
        cleanup_env_vars();

        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.yaml");
        fs::write(
            &config_path,
            "realtime:\n  url: \"https://api.openai.com/v1/realtime\"\n",
        )
        .unwrap();

        let result = ServerConfig::from_file(&config_path);
        assert!(matches!(result, Err(ConfigError::Invalid(_))));

        cleanup_env_vars();
    }
}
