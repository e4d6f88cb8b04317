//! Realtime endpoint configuration types.
//!
//! This module contains the endpoint constants and the per-relay settings:
//! - Endpoint URL and optional model query parameter
//! - Authorization deadline
//! - Output stream buffer size
//! - Sampling temperature

use std::time::Duration;

use url::Url;

use crate::config::ServerConfig;
use crate::core::realtime::base::{RealtimeError, RealtimeResult};

/// Realtime API WebSocket endpoint.
pub const OPENAI_REALTIME_URL: &str = "wss://api.openai.com/v1/realtime";

/// Protocol-version header name.
pub const OPENAI_BETA_HEADER: &str = "OpenAI-Beta";

/// Protocol-version header value.
pub const OPENAI_BETA_VALUE: &str = "realtime=v1";

/// Default deadline for the readiness signal after the authorize frame.
pub const DEFAULT_AUTHORIZE_TIMEOUT: Duration = Duration::from_secs(10);

/// Default number of chunks buffered between the socket and the consumer.
pub const DEFAULT_STREAM_BUFFER_SIZE: usize = 64;

/// Settings for one [`RealtimeRelay`](super::RealtimeRelay).
#[derive(Debug, Clone, PartialEq)]
pub struct RelayConfig {
    /// WebSocket endpoint (`ws://` or `wss://`)
    pub url: String,
    /// Model appended as `?model=` when set
    pub model: Option<String>,
    /// Deadline for leaving `Authorizing`
    pub authorize_timeout: Duration,
    /// Capacity of the output stream channel
    pub stream_buffer_size: usize,
    /// Sampling temperature forwarded in respond frames
    pub temperature: Option<f32>,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            url: OPENAI_REALTIME_URL.to_string(),
            model: None,
            authorize_timeout: DEFAULT_AUTHORIZE_TIMEOUT,
            stream_buffer_size: DEFAULT_STREAM_BUFFER_SIZE,
            temperature: None,
        }
    }
}

impl RelayConfig {
    /// Relay settings derived from the server configuration.
    pub fn from_server_config(config: &ServerConfig) -> Self {
        Self {
            url: config.realtime_url.clone(),
            model: config.realtime_model.clone(),
            authorize_timeout: Duration::from_secs(config.authorize_timeout_seconds),
            stream_buffer_size: config.stream_buffer_size,
            temperature: None,
        }
    }

    pub fn with_temperature(mut self, temperature: Option<f32>) -> Self {
        self.temperature = temperature;
        self
    }

    /// Build the WebSocket URL, appending the model when configured.
    pub fn build_ws_url(&self) -> RealtimeResult<Url> {
        let mut url = Url::parse(&self.url).map_err(|e| {
            RealtimeError::InvalidConfiguration(format!("invalid realtime URL '{}': {e}", self.url))
        })?;

        if !matches!(url.scheme(), "ws" | "wss") {
            return Err(RealtimeError::InvalidConfiguration(format!(
                "realtime URL must use ws:// or wss://, got '{}'",
                url.scheme()
            )));
        }

        if let Some(model) = self.model.as_deref().filter(|m| !m.is_empty()) {
            url.query_pairs_mut().append_pair("model", model);
        }

        Ok(url)
    }

    /// Authorization deadline in milliseconds, for error reporting.
    pub fn authorize_timeout_ms(&self) -> u64 {
        u64::try_from(self.authorize_timeout.as_millis()).unwrap_or(u64::MAX)
    }
}
