pub mod api;
pub mod realtime;

use axum::{Router, routing::get};
use std::sync::Arc;

use crate::handlers;
use crate::state::AppState;

/// All routes without middleware layers.
///
/// - `GET /` - health check
/// - `GET /api/realtime/info`
/// - `POST /api/chat/realtime`
pub fn create_app_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(handlers::api::health_check))
        .merge(api::create_api_router())
        .merge(realtime::create_realtime_router())
}
