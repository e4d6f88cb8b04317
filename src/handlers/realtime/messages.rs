//! Realtime chat request types
//!
//! Body accepted by `POST /api/chat/realtime`:
//!
//! ```json
//! {
//!   "chatSettings": {"prompt": "Be concise", "temperature": 0.7},
//!   "messages": [{"role": "user", "content": "Hi"}]
//! }
//! ```
//!
//! Unknown `chatSettings` fields are accepted and ignored.
//!
//! Messages are text-only turns: `role` is one of `system`, `user` or
//! `assistant`, and `content` is a string. Other roles and structured
//! (array) content are rejected with 400 rather than forwarded.

use serde::Deserialize;

use crate::core::realtime::Turn;

/// Maximum allowed size for instructions (100 KB)
pub const MAX_INSTRUCTIONS_SIZE: usize = 100 * 1024;

/// Maximum allowed size for a single message (50 KB)
pub const MAX_TEXT_SIZE: usize = 50 * 1024;

/// Maximum number of turns in one request
pub const MAX_TURNS: usize = 256;

/// Chat settings sent by the client
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ChatSettings {
    /// System instructions for the model
    pub prompt: Option<String>,
    /// Sampling temperature
    pub temperature: Option<f32>,
}

/// Realtime chat request body
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RealtimeChatRequest {
    #[serde(default)]
    pub chat_settings: ChatSettings,
    pub messages: Vec<Turn>,
}

impl RealtimeChatRequest {
    /// Check size limits and required content.
    pub fn validate(&self) -> Result<(), String> {
        if self.messages.is_empty() {
            return Err("messages must not be empty".to_string());
        }
        if self.messages.len() > MAX_TURNS {
            return Err(format!(
                "too many messages: {} (max {MAX_TURNS})",
                self.messages.len()
            ));
        }
        if let Some(index) = self
            .messages
            .iter()
            .position(|turn| turn.content.len() > MAX_TEXT_SIZE)
        {
            return Err(format!(
                "message {index} exceeds maximum size of {MAX_TEXT_SIZE} bytes"
            ));
        }
        if let Some(prompt) = &self.chat_settings.prompt
            && prompt.len() > MAX_INSTRUCTIONS_SIZE
        {
            return Err(format!(
                "prompt exceeds maximum size of {MAX_INSTRUCTIONS_SIZE} bytes"
            ));
        }
        if let Some(temperature) = self.chat_settings.temperature
            && !(0.0..=2.0).contains(&temperature)
        {
            return Err(format!(
                "temperature must be between 0.0 and 2.0, got {temperature}"
            ));
        }
        Ok(())
    }

    /// Non-blank prompt, if any.
    pub fn prompt(&self) -> Option<String> {
        self.chat_settings
            .prompt
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(str::to_string)
    }
}
