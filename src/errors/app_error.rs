use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::core::realtime::RealtimeError;

/// Errors surfaced by HTTP handlers.
///
/// Rendered as `{"message": "..."}` with the status from [`AppError::status_code`].
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Realtime(#[from] RealtimeError),

    #[error("{0}")]
    BadRequest(String),
}

pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Realtime(err) => match err {
                RealtimeError::MissingCredential => StatusCode::UNAUTHORIZED,
                RealtimeError::ConnectError(_)
                | RealtimeError::RemoteError(_)
                | RealtimeError::TransportError(_) => StatusCode::BAD_GATEWAY,
                RealtimeError::AuthorizationTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
                RealtimeError::NotConnected => StatusCode::CONFLICT,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(status = %status, error = %self, "Request failed");
        } else {
            tracing::warn!(status = %status, error = %self, "Request rejected");
        }

        (status, Json(json!({ "message": self.to_string() }))).into_response()
    }
}
