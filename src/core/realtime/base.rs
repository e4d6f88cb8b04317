//! Base types shared by the realtime relay.
//!
//! This module defines the error taxonomy, the connection state machine and
//! the conversation turn type that flows from callers to the wire codec.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use thiserror::Error;

// =============================================================================
// Error Types
// =============================================================================

/// Errors that can occur during realtime relay operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RealtimeError {
    /// No secret was available to authenticate the relay
    #[error("Missing credential: no API key configured")]
    MissingCredential,

    /// The transport could not be established
    #[error("Connection failed: {0}")]
    ConnectError(String),

    /// Operation attempted while the relay is not connected
    #[error("Not connected")]
    NotConnected,

    /// Inbound frame could not be parsed
    #[error("Malformed frame: {0}")]
    MalformedFrame(String),

    /// Application-level error reported by the remote service
    #[error("Remote error: {0}")]
    RemoteError(String),

    /// The socket failed after the connection was established
    #[error("Transport error: {0}")]
    TransportError(String),

    /// No readiness signal arrived while authorizing
    #[error("Authorization timed out after {0}ms")]
    AuthorizationTimeout(u64),

    /// Outbound request could not be encoded
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
}

/// Result type for realtime operations.
pub type RealtimeResult<T> = Result<T, RealtimeError>;

// =============================================================================
// Connection State
// =============================================================================

/// Lifecycle of one relay session.
///
/// `Idle -> Connecting -> Authorizing -> Ready -> Closed | Failed`. The two
/// last states are terminal; a relay is never reused once it reaches them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    /// Created, `connect` not called yet
    #[default]
    Idle,
    /// Transport handshake in progress
    Connecting,
    /// Authorize frame queued, waiting for a readiness signal
    Authorizing,
    /// Authorized and accepting respond frames
    Ready,
    /// Closed by the caller or cleanly by the remote
    Closed,
    /// Connection or authorization failed
    Failed,
}

impl ConnectionState {
    /// Whether the state is `Closed` or `Failed`.
    #[inline]
    pub fn is_terminal(&self) -> bool {
        matches!(self, ConnectionState::Closed | ConnectionState::Failed)
    }

    /// Whether a respond frame may be queued in this state.
    #[inline]
    pub fn accepts_send(&self) -> bool {
        matches!(self, ConnectionState::Authorizing | ConnectionState::Ready)
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionState::Idle => write!(f, "Idle"),
            ConnectionState::Connecting => write!(f, "Connecting"),
            ConnectionState::Authorizing => write!(f, "Authorizing"),
            ConnectionState::Ready => write!(f, "Ready"),
            ConnectionState::Closed => write!(f, "Closed"),
            ConnectionState::Failed => write!(f, "Failed"),
        }
    }
}

// =============================================================================
// Conversation Turns
// =============================================================================

/// Role of the author of a conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    /// System prompt turn
    System,
    /// End-user turn (typed or transcribed)
    User,
    /// Model reply
    Assistant,
}

impl fmt::Display for TurnRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TurnRole::System => write!(f, "system"),
            TurnRole::User => write!(f, "user"),
            TurnRole::Assistant => write!(f, "assistant"),
        }
    }
}

/// One message of the conversation sent with a respond request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: TurnRole,
    pub content: String,
}

impl Turn {
    pub fn new(role: TurnRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(TurnRole::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(TurnRole::Assistant, content)
    }
}

// =============================================================================
// Callback Types
// =============================================================================

/// Callback type for the error observer.
pub type RealtimeErrorCallback =
    Arc<dyn Fn(RealtimeError) -> Pin<Box<dyn Future<Output = ()> + Send>> + Send + Sync>;
