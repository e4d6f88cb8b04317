//! WebSocket Mock Server for the realtime endpoint
//!
//! Accepts any number of connections, records the handshake and every
//! inbound JSON frame, and replays a scripted list of server frames after
//! each `authorization` and `response.create` frame.

use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;
use tokio_tungstenite::accept_hdr_async;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};

/// One scripted server action.
#[derive(Debug, Clone)]
pub enum Step {
    /// Send a JSON text frame
    Json(Value),
    /// Send a raw text frame
    Raw(String),
    /// Pause before the next step
    Delay(Duration),
    /// Send a close frame and drop the connection
    Close,
}

/// Frames replayed after each client request type.
#[derive(Debug, Clone, Default)]
pub struct Script {
    pub on_authorize: Vec<Step>,
    pub on_respond: Vec<Step>,
}

impl Script {
    /// Acknowledge the session, then stream `chunks` and end the response.
    pub fn streaming(chunks: &[&str]) -> Self {
        let mut on_respond: Vec<Step> = chunks
            .iter()
            .map(|chunk| Step::Json(serde_json::json!({"type": "content.text", "text": chunk})))
            .collect();
        on_respond.push(Step::Json(serde_json::json!({"type": "response.end"})));

        Self {
            on_authorize: vec![Step::Json(
                serde_json::json!({"type": "session.created", "session": {"id": "sess_mock"}}),
            )],
            on_respond,
        }
    }
}

/// Captured handshake request.
#[derive(Debug, Clone, Default)]
pub struct Handshake {
    pub uri: String,
    pub authorization: Option<String>,
    pub openai_beta: Option<String>,
}

/// Running mock server. Stops when dropped.
pub struct RealtimeMock {
    addr: SocketAddr,
    frames: Arc<Mutex<Vec<Value>>>,
    handshakes: Arc<Mutex<Vec<Handshake>>>,
    connections: Arc<AtomicUsize>,
    task: JoinHandle<()>,
}

impl RealtimeMock {
    pub async fn start(script: Script) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let script = Arc::new(script);
        let frames = Arc::new(Mutex::new(Vec::new()));
        let handshakes = Arc::new(Mutex::new(Vec::new()));
        let connections = Arc::new(AtomicUsize::new(0));

        let task = {
            let frames = frames.clone();
            let handshakes = handshakes.clone();
            let connections = connections.clone();
            tokio::spawn(async move {
                while let Ok((stream, _)) = listener.accept().await {
                    connections.fetch_add(1, Ordering::SeqCst);
                    let script = script.clone();
                    let frames = frames.clone();
                    let handshakes = handshakes.clone();
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(stream, script, frames, handshakes).await
                        {
                            eprintln!("Mock realtime connection error: {e}");
                        }
                    });
                }
            })
        };

        Self {
            addr,
            frames,
            handshakes,
            connections,
            task,
        }
    }

    pub fn url(&self) -> String {
        format!("ws://{}/v1/realtime", self.addr)
    }

    pub fn frames(&self) -> Vec<Value> {
        self.frames.lock().unwrap().clone()
    }

    pub fn handshakes(&self) -> Vec<Handshake> {
        self.handshakes.lock().unwrap().clone()
    }

    pub fn connection_count(&self) -> usize {
        self.connections.load(Ordering::SeqCst)
    }

    /// Poll until at least `count` frames arrived or two seconds passed.
    pub async fn wait_for_frames(&self, count: usize) -> Vec<Value> {
        for _ in 0..100 {
            let frames = self.frames();
            if frames.len() >= count {
                return frames;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        self.frames()
    }
}

impl Drop for RealtimeMock {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn handle_connection(
    stream: TcpStream,
    script: Arc<Script>,
    frames: Arc<Mutex<Vec<Value>>>,
    handshakes: Arc<Mutex<Vec<Handshake>>>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let callback = move |req: &Request, resp: Response| -> Result<Response, ErrorResponse> {
        let header = |name: &str| {
            req.headers()
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };
        handshakes.lock().unwrap().push(Handshake {
            uri: req.uri().to_string(),
            authorization: header("authorization"),
            openai_beta: header("openai-beta"),
        });
        Ok(resp)
    };

    let ws_stream = accept_hdr_async(stream, callback).await?;
    let (mut write, mut read) = ws_stream.split();

    while let Some(msg) = read.next().await {
        match msg? {
            Message::Text(text) => {
                let value: Value = serde_json::from_str(text.as_str()).unwrap_or(Value::Null);
                let kind = value
                    .get("type")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string();
                frames.lock().unwrap().push(value);

                let steps = match kind.as_str() {
                    "authorization" => &script.on_authorize,
                    "response.create" => &script.on_respond,
                    _ => continue,
                };

                for step in steps {
                    match step {
                        Step::Json(value) => {
                            write.send(Message::Text(value.to_string().into())).await?
                        }
                        Step::Raw(raw) => write.send(Message::Text(raw.clone().into())).await?,
                        Step::Delay(duration) => tokio::time::sleep(*duration).await,
                        Step::Close => {
                            write.send(Message::Close(None)).await?;
                            return Ok(());
                        }
                    }
                }
            }
            Message::Close(_) => break,
            Message::Ping(data) => write.send(Message::Pong(data)).await?,
            _ => {}
        }
    }

    Ok(())
}
