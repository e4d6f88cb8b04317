//! Realtime API relay over WebSocket.
//!
//! This module provides text-only chat over the realtime endpoint: the
//! relay authorizes the socket, asks for a text response over a list of
//! conversation turns, and streams the `content.text` chunks back.
//!
//! # Wire Protocol
//!
//! - Handshake headers: `Authorization: Bearer <key>`, `OpenAI-Beta: realtime=v1`
//! - Outbound: `authorization`, `response.create` (modalities `["text"]`)
//! - Inbound: `content.text`, `response.end`, `error`, `session.created`,
//!   `session.updated`; anything else is ignored

mod client;
mod config;
mod messages;

pub use client::{DISCONNECTED_REASON, REMOTE_CLOSED_REASON, RealtimeRelay};
pub use config::{
    DEFAULT_AUTHORIZE_TIMEOUT, DEFAULT_STREAM_BUFFER_SIZE, OPENAI_BETA_HEADER, OPENAI_BETA_VALUE,
    OPENAI_REALTIME_URL, RelayConfig,
};
pub use messages::{
    InboundEvent, OutboundRequest, UNKNOWN_REMOTE_ERROR, decode, encode_authorize, encode_respond,
};
