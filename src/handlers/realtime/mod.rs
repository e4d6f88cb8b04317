//! Realtime chat handlers
//!
//! # Protocol
//!
//! ## Client → Server
//!
//! - `POST /api/chat/realtime` with `{chatSettings, messages}`
//!
//! ## Server → Client
//!
//! - `200` with a streamed `text/plain` body: model text chunks in arrival order
//! - `4xx`/`5xx` with `{"message": ...}` when the relay cannot start

mod handler;
pub mod messages;

pub use handler::realtime_chat_handler;
