//! Realtime text relay.
//!
//! A relay session connects to the realtime WebSocket endpoint, authorizes
//! with a caller-supplied [`Credential`], sends conversation turns and
//! streams the model's text back through an [`OutputStream`].
//!
//! # Architecture
//!
//! - `base` - error taxonomy, connection state, conversation turns
//! - `credential` - credentials and the provider seam
//! - `stream` - bounded output stream with a single terminal event
//! - `openai` - wire codec, relay configuration and the relay itself
//!
//! # Example
//!
//! ```rust,ignore
//! use realtime_relay::core::realtime::{
//!     ConfigCredentialProvider, CredentialProvider, RealtimeRelay, RelayConfig, Turn,
//! };
//!
//! let provider = ConfigCredentialProvider::new(Some("sk-...".into()));
//! let credential = provider.credential(Some("Be concise".into()))?;
//!
//! let (mut relay, output) = RealtimeRelay::with_stream(RelayConfig::default());
//! relay.connect(&credential).await?;
//! relay.send("Be concise", &[Turn::user("Hi")]).await?;
//! ```

mod base;
mod credential;
pub mod openai;
mod stream;

pub use base::{
    ConnectionState, RealtimeError, RealtimeErrorCallback, RealtimeResult, Turn, TurnRole,
};
pub use credential::{ConfigCredentialProvider, Credential, CredentialProvider};
pub use openai::{
    DISCONNECTED_REASON, InboundEvent, OPENAI_REALTIME_URL, OutboundRequest, REMOTE_CLOSED_REASON,
    RealtimeRelay, RelayConfig, decode, encode_authorize, encode_respond,
};
pub use stream::{
    OutputStream, STREAM_DROPPED_REASON, StreamAborted, StreamAdapter, StreamEvent, StreamStatus,
    output_stream,
};
