//! Per-connection session lifecycle and frame dispatch.
//!
//! A session moves connect → active → closing: it is registered with a
//! generated guest name, serves inbound frames in arrival order, and on
//! disconnect deregisters and announces the leave. Outbound frames travel
//! through a bounded mailbox drained by a dedicated writer task, so neither
//! the dispatcher nor the broadcast engine ever blocks on this socket.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use futures_util::{SinkExt, StreamExt};
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use irori_shared::protocol::{self, DecodeError, Inbound, Outbound};
use irori_shared::validate::{
    ChatError, NameError, PromptError, validate_chat_text, validate_name, validate_prompt,
};

use crate::ai::AiError;
use crate::rate_limit::{RateLimited, SlidingWindow};
use crate::state::AppState;

/// Outbound mailbox capacity per connection. A client that cannot keep up
/// loses frames (drop-newest) instead of growing server memory.
pub const MAILBOX_CAPACITY: usize = 256;

/// Everything a live session owns: its identity, its outbound handle, and
/// its rate-limit buckets. Dropped wholesale when the connection closes.
struct Session {
    id: Uuid,
    tx: mpsc::Sender<Message>,
    chat_window: SlidingWindow,
    ai_window: SlidingWindow,
}

impl Session {
    fn new(id: Uuid, tx: mpsc::Sender<Message>, state: &AppState) -> Self {
        Self {
            id,
            tx,
            chat_window: SlidingWindow::new(&state.chat_limit),
            ai_window: SlidingWindow::with_limit(state.ai_rate_limit),
        }
    }

    /// Send a frame to this connection only. Best-effort: a full or closed
    /// mailbox drops the frame.
    fn reply(&self, frame: &Outbound) {
        let _ = self
            .tx
            .try_send(Message::Text(protocol::encode(frame).into()));
    }
}

/// Why an inbound frame was rejected. The rendered message is exactly what
/// the offending client receives in its `error` frame.
#[derive(Debug, Error)]
enum DispatchError {
    #[error(transparent)]
    Protocol(#[from] DecodeError),
    #[error(transparent)]
    BadName(#[from] NameError),
    #[error(transparent)]
    BadChatText(#[from] ChatError),
    #[error(transparent)]
    BadPrompt(#[from] PromptError),
    #[error(transparent)]
    RateLimited(#[from] RateLimited),
    #[error("AI rate limit reached (max {limit}/min). Try again in {wait_secs} seconds.")]
    AiRateLimited { limit: u32, wait_secs: u64 },
    #[error(transparent)]
    Ai(#[from] AiError),
    #[error("Session is no longer registered.")]
    Unregistered,
}

/// Drive one accepted WebSocket connection from registration to teardown.
pub async fn handle_socket(state: Arc<AppState>, socket: WebSocket, ip: String) {
    let id = Uuid::new_v4();
    let name = format!("guest-{}", &id.simple().to_string()[..6]);
    let (mut ws_tx, mut ws_rx) = socket.split();
    let (tx, mut rx) = mpsc::channel::<Message>(MAILBOX_CAPACITY);

    // Writer task: drains the mailbox into the socket. Everything outbound
    // goes through it.
    let writer = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if let Err(err) = ws_tx.send(msg).await {
                debug!(?err, "writer loop stopped");
                break;
            }
        }
    });

    state
        .registry
        .register(
            id,
            name.clone(),
            ip.clone(),
            state.clock.now_ms(),
            tx.clone(),
        )
        .await;
    state
        .metrics
        .record_connection(state.registry.count().await as u64);
    info!(id = %id, name = %name, ip = %ip, "client connected");

    let mut session = Session::new(id, tx, &state);
    session.reply(&Outbound::AckName {
        name: name.clone(),
        at: state.clock.now_ms(),
    });
    state
        .broadcaster
        .broadcast(
            &Outbound::System {
                text: format!("{name} joined the chat."),
                at: state.clock.now_ms(),
            },
            Some(id),
        )
        .await;

    while let Some(msg) = ws_rx.next().await {
        let msg = match msg {
            Ok(msg) => msg,
            Err(err) => {
                debug!(id = %id, ?err, "receive error, client disconnected abruptly");
                break;
            }
        };
        match msg {
            Message::Text(text) => {
                if let Err(err) = dispatch(&state, &mut session, text.as_str()).await {
                    debug!(id = %id, %err, "frame rejected");
                    session.reply(&Outbound::Error {
                        message: err.to_string(),
                    });
                }
            }
            Message::Close(_) => break,
            Message::Ping(_) | Message::Pong(_) => {
                // Transport-level ping/pong is answered by the protocol layer.
            }
            _ => {}
        }
    }

    let final_name = match state.registry.deregister(id).await {
        Some(snapshot) => snapshot.name,
        None => {
            warn!(id = %id, "session missing from registry at teardown");
            name
        }
    };
    state
        .broadcaster
        .broadcast(
            &Outbound::System {
                text: format!("{final_name} left the chat."),
                at: state.clock.now_ms(),
            },
            None,
        )
        .await;
    writer.abort();
    info!(id = %id, name = %final_name, ip = %ip, "client disconnected");
}

/// Decode and serve one inbound text frame.
///
/// Frames of one connection are dispatched in arrival order, so a chat sent
/// before a rename is attributed to the pre-rename name and vice versa.
async fn dispatch(
    state: &Arc<AppState>,
    session: &mut Session,
    text: &str,
) -> Result<(), DispatchError> {
    match protocol::decode(text)? {
        Inbound::Chat { text } => {
            let text = validate_chat_text(&text)?;
            session.chat_window.check()?;
            let from = state
                .registry
                .current_name(session.id)
                .await
                .ok_or(DispatchError::Unregistered)?;
            state.metrics.record_message();
            state
                .broadcaster
                .broadcast(
                    &Outbound::Chat {
                        from: from.clone(),
                        text,
                        at: state.clock.now_ms(),
                    },
                    None,
                )
                .await;
            debug!(from = %from, id = %session.id, "chat relayed");
        }
        Inbound::SetName { name } => {
            let new_name = validate_name(&name)?;
            let old_name = state
                .registry
                .rename(session.id, new_name.clone())
                .await
                .ok_or(DispatchError::Unregistered)?;
            session.reply(&Outbound::AckName {
                name: new_name.clone(),
                at: state.clock.now_ms(),
            });
            state
                .broadcaster
                .broadcast(
                    &Outbound::System {
                        text: format!("{old_name} is now {new_name}."),
                        at: state.clock.now_ms(),
                    },
                    Some(session.id),
                )
                .await;
            debug!(old = %old_name, new = %new_name, id = %session.id, "renamed");
        }
        Inbound::Status => {
            let status = build_status(state).await;
            session.reply(&status);
        }
        Inbound::ListUsers => {
            let users = state.registry.snapshot().await;
            session.reply(&Outbound::ListUsers { users });
        }
        Inbound::Ping { token } => {
            session.reply(&Outbound::Pong {
                token,
                at: state.clock.now_ms(),
            });
        }
        Inbound::Ai { prompt } => {
            if !state.ai.is_enabled() {
                return Err(AiError::Disabled.into());
            }
            let prompt = validate_prompt(&prompt)?;
            if let Err(limited) = session.ai_window.check() {
                return Err(DispatchError::AiRateLimited {
                    limit: state.ai_rate_limit,
                    wait_secs: limited.wait_secs,
                });
            }
            let from = state
                .registry
                .current_name(session.id)
                .await
                .ok_or(DispatchError::Unregistered)?;

            // The provider call gets its own task so this session keeps
            // serving chat/status/listUsers while the answer is pending.
            let state = Arc::clone(state);
            let reply_tx = session.tx.clone();
            let id = session.id;
            tokio::spawn(async move {
                match state.ai.ask(&prompt).await {
                    Ok(answer) => {
                        state
                            .broadcaster
                            .broadcast(
                                &Outbound::Ai {
                                    from,
                                    prompt,
                                    response: answer.content,
                                    response_ms: answer.response_ms,
                                    tokens: answer.tokens,
                                    cost: answer.cost,
                                    at: state.clock.now_ms(),
                                },
                                None,
                            )
                            .await;
                        debug!(id = %id, "AI answer broadcast");
                    }
                    Err(err) => {
                        debug!(id = %id, %err, "AI request failed");
                        let frame = Outbound::Error {
                            message: err.to_string(),
                        };
                        let _ = reply_tx.try_send(Message::Text(protocol::encode(&frame).into()));
                    }
                }
            });
        }
    }
    Ok(())
}

/// Assemble the `status` snapshot for one requester.
async fn build_status(state: &AppState) -> Outbound {
    Outbound::Status {
        version: env!("CARGO_PKG_VERSION").to_string(),
        rust_version: env!("RUSTC_VERSION").to_string(),
        os: std::env::consts::OS.to_string(),
        cpu_cores: std::thread::available_parallelism()
            .map(|p| p.get())
            .unwrap_or(1),
        uptime_seconds: state.metrics.uptime_seconds(),
        user_count: state.registry.count().await,
        peak_users: state.metrics.peak_users() as usize,
        connections_total: state.metrics.connections_total(),
        messages_sent: state.metrics.messages_sent(),
        messages_per_second: state.metrics.messages_per_second(),
        memory_mb: state.metrics.memory_mb().await,
        ai_enabled: state.ai.is_enabled(),
        ai_model: state.ai.model(),
    }
}
