//! HTTP request handlers
//!
//! - `api` - Health check and endpoint info
//! - `realtime` - Streaming realtime chat relay

pub mod api;
pub mod realtime;

pub use realtime::realtime_chat_handler;
