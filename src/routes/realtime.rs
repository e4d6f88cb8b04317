//! Realtime chat route configuration
//!
//! This module configures the streaming chat endpoint that relays
//! conversations to the realtime WebSocket API.

use axum::{Router, routing::post};
use tower_http::trace::TraceLayer;

use crate::handlers::realtime::realtime_chat_handler;
use crate::state::AppState;
use std::sync::Arc;

/// Create the realtime chat router
///
/// # Endpoint
///
/// `POST /api/chat/realtime` - streamed text response
///
/// # Example
///
/// ```json
/// // Client sends
/// {"chatSettings": {"prompt": "Be concise"}, "messages": [{"role": "user", "content": "Hi"}]}
///
/// // Server streams back
/// Hello! How can I help?
/// ```
pub fn create_realtime_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/chat/realtime", post(realtime_chat_handler))
        .layer(TraceLayer::new_for_http())
}
