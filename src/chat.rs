//! Terminal chat over the realtime relay.
//!
//! This module powers the `realtime-relay chat` CLI command. Each line read
//! from stdin is treated as one user turn (typed or produced by an external
//! speech transcriber; the text is opaque). Every turn opens its own relay,
//! sends the whole conversation so far, and prints the reply as it streams.
//!
//! ```text
//! $ OPENAI_API_KEY=sk-... realtime-relay chat
//! > Hi
//! Hello! How can I help?
//! > /exit
//! ```
//!
//! Commands: `/reset` clears the conversation, `/exit` or `/quit` leaves.
//! The conversation lives in memory only.

use std::sync::Arc;

use anyhow::{Result, anyhow, bail};
use tokio::io::{AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{debug, warn};

use crate::config::ServerConfig;
use crate::core::realtime::{
    ConfigCredentialProvider, Credential, CredentialProvider, RealtimeError, RealtimeRelay,
    RelayConfig, StreamEvent, Turn,
};

const PROMPT: &[u8] = b"> ";

/// In-memory conversation driven one turn at a time.
pub struct ChatSession {
    credentials: Arc<dyn CredentialProvider>,
    relay_config: RelayConfig,
    instructions: Option<String>,
    turns: Vec<Turn>,
}

impl ChatSession {
    pub fn new(
        credentials: Arc<dyn CredentialProvider>,
        relay_config: RelayConfig,
        instructions: Option<String>,
    ) -> Self {
        Self {
            credentials,
            relay_config,
            instructions,
            turns: Vec::new(),
        }
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn reset(&mut self) {
        self.turns.clear();
    }

    /// Send `text` as a user turn and stream the reply into `out`.
    ///
    /// On success both turns are kept and the reply is returned. On failure
    /// the user turn is dropped again so the input can be retried.
    pub async fn submit<W>(&mut self, text: &str, out: &mut W) -> Result<String>
    where
        W: AsyncWrite + Unpin,
    {
        let text = text.trim();
        if text.is_empty() {
            bail!("empty input");
        }

        let credential = self.credentials.credential(self.instructions.clone())?;

        self.turns.push(Turn::user(text));
        match self.relay_turn(&credential, out).await {
            Ok(reply) => {
                self.turns.push(Turn::assistant(reply.clone()));
                Ok(reply)
            }
            Err(e) => {
                self.turns.pop();
                Err(e)
            }
        }
    }

    async fn relay_turn<W>(&self, credential: &Credential, out: &mut W) -> Result<String>
    where
        W: AsyncWrite + Unpin,
    {
        let (mut relay, mut output) = RealtimeRelay::with_stream(self.relay_config.clone());
        relay.connect(credential).await?;
        relay
            .send(credential.instructions().unwrap_or_default(), &self.turns)
            .await?;

        let mut reply = String::new();
        let outcome = loop {
            match output.recv().await {
                Some(StreamEvent::Chunk(chunk)) => {
                    out.write_all(chunk.as_bytes()).await?;
                    out.flush().await?;
                    reply.push_str(&chunk);
                }
                Some(StreamEvent::End) | None => break Ok(()),
                Some(StreamEvent::Abort(reason)) => break Err(anyhow!("response aborted: {reason}")),
            }
        };

        relay.disconnect().await?;
        debug!(session_id = relay.session_id(), chars = reply.len(), "Chat turn finished");
        outcome.map(|()| reply)
    }
}

/// Run the interactive loop on stdin/stdout until EOF or `/exit`.
pub async fn run(config: ServerConfig) -> Result<()> {
    let credentials = Arc::new(ConfigCredentialProvider::new(config.openai_api_key.clone()));
    let mut session = ChatSession::new(
        credentials,
        RelayConfig::from_server_config(&config),
        config.default_instructions.clone(),
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    stdout.write_all(PROMPT).await?;
    stdout.flush().await?;

    while let Some(line) = lines.next_line().await? {
        match line.trim() {
            "" => {}
            "/exit" | "/quit" => break,
            "/reset" => {
                session.reset();
                stdout.write_all(b"(conversation cleared)\n").await?;
            }
            input => match session.submit(input, &mut stdout).await {
                Ok(_) => stdout.write_all(b"\n").await?,
                Err(e) => {
                    if matches!(
                        e.downcast_ref::<RealtimeError>(),
                        Some(RealtimeError::MissingCredential)
                    ) {
                        return Err(e);
                    }
                    warn!(error = %e, "Chat turn failed");
                    stdout.write_all(format!("\n[error] {e}\n").as_bytes()).await?;
                }
            },
        }

        stdout.write_all(PROMPT).await?;
        stdout.flush().await?;
    }

    Ok(())
}
