//! Realtime chat HTTP handler
//!
//! Opens one relay per request and streams the model's text back as a
//! `text/plain` body. The relay lives inside the body stream, so the socket
//! closes when the body completes or the client goes away.

use std::future::Future;
use std::io;
use std::pin::Pin;
use std::sync::Arc;

use axum::{
    Json,
    body::Body,
    extract::{State, rejection::JsonRejection},
    http::header,
    response::{IntoResponse, Response},
};
use bytes::Bytes;
use futures::StreamExt;
use parking_lot::Mutex;
use tracing::{debug, info};

use super::messages::RealtimeChatRequest;
use crate::core::realtime::{RealtimeError, RealtimeRelay, StreamEvent};
use crate::errors::app_error::{AppError, AppResult};
use crate::state::AppState;

/// `POST /api/chat/realtime`
///
/// Errors before the first chunk (missing key, connect failure, bad body,
/// remote error or close before any text) are returned as
/// `{"message": ...}` with a mapped status. Errors after streaming has
/// started terminate the body.
pub async fn realtime_chat_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<RealtimeChatRequest>, JsonRejection>,
) -> AppResult<Response> {
    let Json(request) = payload.map_err(|e| AppError::BadRequest(e.body_text()))?;
    request.validate().map_err(AppError::BadRequest)?;

    let instructions = request
        .prompt()
        .or_else(|| state.config.default_instructions.clone());

    // Resolve the credential before any socket is opened.
    let credential = state.credentials.credential(instructions)?;

    let relay_config = state
        .relay_config
        .clone()
        .with_temperature(request.chat_settings.temperature);
    let (mut relay, mut output) = RealtimeRelay::with_stream(relay_config);
    let session_id = relay.session_id().to_string();

    // The relay reports classified errors to its observer before it aborts
    // the stream, so the slot is filled by the time an abort is read.
    let last_error: Arc<Mutex<Option<RealtimeError>>> = Arc::default();
    let slot = last_error.clone();
    relay.on_error(Arc::new(
        move |err: RealtimeError| -> Pin<Box<dyn Future<Output = ()> + Send>> {
            let slot = slot.clone();
            Box::pin(async move {
                *slot.lock() = Some(err);
            })
        },
    ));

    relay.connect(&credential).await?;
    if let Err(err) = relay
        .send(credential.instructions().unwrap_or_default(), &request.messages)
        .await
    {
        // A rejected credential can end the session before the send lands.
        // Its abort follows the observer call, so wait for it.
        let _ = output.recv().await;
        let err = last_error.lock().take().unwrap_or(err);
        let _ = relay.disconnect().await;
        return Err(err.into());
    }

    // Nothing is committed until the first event arrives: a failure before
    // the first chunk still gets a status code.
    let first_chunk = match output.recv().await {
        Some(StreamEvent::Chunk(text)) => Some(text),
        Some(StreamEvent::End) | None => None,
        Some(StreamEvent::Abort(reason)) => {
            let err = last_error
                .lock()
                .take()
                .unwrap_or(RealtimeError::TransportError(reason));
            let _ = relay.disconnect().await;
            return Err(err.into());
        }
    };

    info!(
        session_id = %session_id,
        turns = request.messages.len(),
        "Streaming realtime chat response"
    );

    let body = async_stream::stream! {
        let mut relay = relay;
        if let Some(text) = first_chunk {
            yield Ok::<Bytes, io::Error>(Bytes::from(text));
        }

        let chunks = output.into_body_stream();
        futures::pin_mut!(chunks);

        while let Some(item) = chunks.next().await {
            let failed = item.is_err();
            yield item;
            if failed {
                break;
            }
        }

        let _ = relay.disconnect().await;
        debug!(session_id = %session_id, "Realtime chat body finished");
    };

    Ok((
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        Body::from_stream(body),
    )
        .into_response())
}
