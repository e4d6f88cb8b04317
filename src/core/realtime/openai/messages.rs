//! Realtime endpoint WebSocket message types.
//!
//! All frames are JSON text frames.
//!
//! # Protocol Overview
//!
//! Client events (sent to server):
//! - authorization - Bearer credential plus protocol-version header
//! - response.create - Request a text-only response over the given turns
//!
//! Server events (received from server):
//! - content.text - Text chunk, appended verbatim to the output
//! - response.end - Response complete
//! - error - Application-level error
//! - session.created / session.updated - Session acknowledged
//!
//! Any other `type` is ignored.

use serde::{Deserialize, Serialize};

use super::config::OPENAI_BETA_VALUE;
use crate::core::realtime::base::{RealtimeError, RealtimeResult, Turn};

/// Fallback reason when an error frame carries no message.
pub const UNKNOWN_REMOTE_ERROR: &str = "Unknown realtime chat error";

// =============================================================================
// Outbound Requests
// =============================================================================

/// Request issued by the relay towards the remote service.
#[derive(Debug, Clone, PartialEq)]
pub enum OutboundRequest {
    /// Authenticate the socket
    Authorize { secret: String },
    /// Ask the model for a response
    Respond {
        instructions: String,
        turns: Vec<Turn>,
        temperature: Option<f32>,
    },
}

impl OutboundRequest {
    /// Short name used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            OutboundRequest::Authorize { .. } => "authorize",
            OutboundRequest::Respond { .. } => "respond",
        }
    }

    /// Encode to the JSON text frame the endpoint expects.
    pub fn encode(&self) -> RealtimeResult<String> {
        let event = match self {
            OutboundRequest::Authorize { secret } => ClientEvent::Authorization {
                authorization: format!("Bearer {secret}"),
                headers: ProtocolHeaders::default(),
            },
            OutboundRequest::Respond {
                instructions,
                turns,
                temperature,
            } => ClientEvent::ResponseCreate {
                response: ResponseConfig {
                    modalities: vec!["text"],
                    instructions,
                    messages: turns,
                    temperature: *temperature,
                },
            },
        };

        serde_json::to_string(&event).map_err(|e| RealtimeError::SerializationError(e.to_string()))
    }
}

/// Encode an authorize frame for `secret`.
pub fn encode_authorize(secret: &str) -> RealtimeResult<String> {
    OutboundRequest::Authorize {
        secret: secret.to_string(),
    }
    .encode()
}

/// Encode a text-only respond frame.
pub fn encode_respond(instructions: &str, turns: &[Turn]) -> RealtimeResult<String> {
    OutboundRequest::Respond {
        instructions: instructions.to_string(),
        turns: turns.to_vec(),
        temperature: None,
    }
    .encode()
}

/// Client events as they appear on the wire.
#[derive(Debug, Serialize)]
#[serde(tag = "type")]
enum ClientEvent<'a> {
    #[serde(rename = "authorization")]
    Authorization {
        authorization: String,
        headers: ProtocolHeaders,
    },

    #[serde(rename = "response.create")]
    ResponseCreate { response: ResponseConfig<'a> },
}

/// Header-equivalent fields carried inside the authorize frame.
#[derive(Debug, Serialize)]
struct ProtocolHeaders {
    #[serde(rename = "OpenAI-Beta")]
    openai_beta: &'static str,
}

impl Default for ProtocolHeaders {
    fn default() -> Self {
        Self {
            openai_beta: OPENAI_BETA_VALUE,
        }
    }
}

#[derive(Debug, Serialize)]
struct ResponseConfig<'a> {
    modalities: Vec<&'static str>,
    instructions: &'a str,
    messages: &'a [Turn],
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

// =============================================================================
// Inbound Events
// =============================================================================

/// Event decoded from an inbound frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundEvent {
    /// Text chunk to append to the output
    TextDelta { text: String },
    /// Response finished
    End,
    /// Application-level error from the service
    Error { message: String },
    /// Session created or updated; the service accepted the credential
    SessionAck,
    /// Frame type the relay does not handle
    Ignored,
}

/// Decode a text frame into an [`InboundEvent`].
///
/// Returns [`RealtimeError::MalformedFrame`] when the payload is not a JSON
/// object with a `type` field, or when a known type is missing its fields.
pub fn decode(frame: &str) -> RealtimeResult<InboundEvent> {
    let event: ServerEvent =
        serde_json::from_str(frame).map_err(|e| RealtimeError::MalformedFrame(e.to_string()))?;

    Ok(match event {
        ServerEvent::ContentText { text } => InboundEvent::TextDelta { text },
        ServerEvent::ResponseEnd => InboundEvent::End,
        ServerEvent::Error { error, message } => InboundEvent::Error {
            message: error
                .and_then(ErrorPayload::into_message)
                .or(message)
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| UNKNOWN_REMOTE_ERROR.to_string()),
        },
        ServerEvent::SessionCreated | ServerEvent::SessionUpdated => InboundEvent::SessionAck,
        ServerEvent::Unknown => InboundEvent::Ignored,
    })
}

/// Server events as they appear on the wire.
#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum ServerEvent {
    #[serde(rename = "content.text")]
    ContentText { text: String },

    #[serde(rename = "response.end")]
    ResponseEnd,

    #[serde(rename = "error")]
    Error {
        #[serde(default)]
        error: Option<ErrorPayload>,
        #[serde(default)]
        message: Option<String>,
    },

    #[serde(rename = "session.created")]
    SessionCreated,

    #[serde(rename = "session.updated")]
    SessionUpdated,

    #[serde(other)]
    Unknown,
}

/// `error` field of an error frame: a bare string or a detail object.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ErrorPayload {
    Text(String),
    Detail(ApiError),
}

impl ErrorPayload {
    fn into_message(self) -> Option<String> {
        match self {
            ErrorPayload::Text(text) => Some(text),
            ErrorPayload::Detail(detail) => detail.message.or(detail.code).or(detail.error_type),
        }
    }
}

/// API error information.
#[derive(Debug, Deserialize)]
struct ApiError {
    #[serde(rename = "type", default)]
    error_type: Option<String>,
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    #[test]
    fn test_authorize_frame() {
        let frame = encode_authorize("sk-test").unwrap();
        let json: Value = serde_json::from_str(&frame).unwrap();
        assert_eq!(json["type"], "authorization");
        assert_eq!(json["authorization"], "Bearer sk-test");
        assert_eq!(json["headers"]["OpenAI-Beta"], "realtime=v1");
    }

    #[test]
    fn test_respond_frame_shape() {
        let turns = vec![Turn::user("Hi"), Turn::assistant("Hello"), Turn::user("Bye")];
        let frame = encode_respond("Be concise", &turns).unwrap();
        let json: Value = serde_json::from_str(&frame).unwrap();

        assert_eq!(json["type"], "response.create");
        assert_eq!(json["response"]["modalities"], json!(["text"]));
        assert_eq!(json["response"]["instructions"], "Be concise");
        assert_eq!(
            json["response"]["messages"],
            serde_json::to_value(&turns).unwrap()
        );
        assert!(json["response"].get("temperature").is_none());
    }

    #[test]
    fn test_respond_frame_with_temperature() {
        let request = OutboundRequest::Respond {
            instructions: String::new(),
            turns: vec![Turn::user("Hi")],
            temperature: Some(0.5),
        };
        let json: Value = serde_json::from_str(&request.encode().unwrap()).unwrap();
        assert_eq!(json["response"]["temperature"], 0.5);
        assert_eq!(request.kind(), "respond");
    }

    #[test]
    fn test_decode_text_delta() {
        let event = decode(r#"{"type":"content.text","text":"Hel"}"#).unwrap();
        assert_eq!(
            event,
            InboundEvent::TextDelta {
                text: "Hel".to_string()
            }
        );
    }

    #[test]
    fn test_decode_text_delta_preserves_whitespace() {
        let event = decode(r#"{"type":"content.text","text":"  lo\n"}"#).unwrap();
        assert_eq!(
            event,
            InboundEvent::TextDelta {
                text: "  lo\n".to_string()
            }
        );
    }

    #[test]
    fn test_decode_end() {
        assert_eq!(
            decode(r#"{"type":"response.end"}"#).unwrap(),
            InboundEvent::End
        );
    }

    #[test]
    fn test_decode_error_variants() {
        assert_eq!(
            decode(r#"{"type":"error","error":"rate_limited"}"#).unwrap(),
            InboundEvent::Error {
                message: "rate_limited".to_string()
            }
        );

        let detailed = r#"{
            "type": "error",
            "error": {"type": "invalid_request_error", "message": "Bad key"}
        }"#;
        assert_eq!(
            decode(detailed).unwrap(),
            InboundEvent::Error {
                message: "Bad key".to_string()
            }
        );

        assert_eq!(
            decode(r#"{"type":"error"}"#).unwrap(),
            InboundEvent::Error {
                message: UNKNOWN_REMOTE_ERROR.to_string()
            }
        );
    }

    #[test]
    fn test_decode_session_ack() {
        assert_eq!(
            decode(r#"{"type":"session.created","session":{"id":"sess_1"}}"#).unwrap(),
            InboundEvent::SessionAck
        );
    }

    #[test]
    fn test_decode_unknown_type_is_ignored() {
        assert_eq!(
            decode(r#"{"type":"rate_limits.updated","rate_limits":[]}"#).unwrap(),
            InboundEvent::Ignored
        );
    }

    #[test]
    fn test_decode_malformed() {
        for frame in [
            "not json",
            "[1, 2, 3]",
            r#"{"text":"no type"}"#,
            r#"{"type":"content.text"}"#,
            r#"{"type":"content.text","text":42}"#,
        ] {
            match decode(frame) {
                Err(RealtimeError::MalformedFrame(_)) => {}
                other => panic!("expected MalformedFrame for {frame:?}, got {other:?}"),
            }
        }
    }
}
