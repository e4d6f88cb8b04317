use axum::{Router, routing::get};
use tower_http::trace::TraceLayer;

use crate::handlers::api;
use crate::state::AppState;
use std::sync::Arc;

/// Create the API router
///
/// - `GET /api/realtime/info` - configured endpoint, model and features
pub fn create_api_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/realtime/info", get(api::realtime_info))
        .layer(TraceLayer::new_for_http())
}
