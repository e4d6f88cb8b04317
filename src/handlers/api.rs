use std::sync::Arc;

use axum::{Json, extract::State};
use serde_json::{Value, json};

use crate::core::realtime::RealtimeRelay;
use crate::state::AppState;

/// Health check endpoint
pub async fn health_check() -> Json<Value> {
    Json(json!({ "status": "OK" }))
}

/// Describe the realtime endpoint this server relays to.
///
/// Never exposes the API key, only whether one is configured.
pub async fn realtime_info(State(state): State<Arc<AppState>>) -> Json<Value> {
    let (relay, _output) = RealtimeRelay::with_stream(state.relay_config.clone());
    let mut info = relay.get_provider_info();
    if let Some(map) = info.as_object_mut() {
        map.remove("session_id");
        map.remove("state");
        map.insert("api_key_configured".to_string(), json!(state.config.has_api_key()));
    }
    Json(info)
}
