//! `/ws/assistant`: streams Oracle turns over a websocket.
//!
//! Each text frame carries the full history; binary frames are read as UTF-8 text. The turn runs through the
//! streaming driver; text deltas go out as `chunk` frames, followed by exactly
//! one `done` or `error`. Frames on one connection are handled one at a time.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use futures::{SinkExt, Stream, StreamExt};
use tokio::sync::mpsc;
use tracing::{debug, error, info, info_span, warn, Instrument};

use mammoth_tool_runtime::{ConnectionContext, Conversation, Delta, InputError};

use crate::protocol::{Inbound, Outbound};
use crate::state::AppState;

const CHANNEL_CAPACITY: usize = 64;

pub async fn ws_assistant(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let ctx = ConnectionContext::new();
    let span = info_span!("ws", connection_id = %ctx.connection_id);

    async move {
        info!("client connected");
        let (mut sender, mut receiver) = socket.split();
        let (out_tx, mut out_rx) = mpsc::channel::<Outbound>(CHANNEL_CAPACITY);

        // Single writer; stops quietly once the client is gone.
        let writer = tokio::spawn(
            async move {
                while let Some(frame) = out_rx.recv().await {
                    if sender.send(Message::Text(frame.to_json().into())).await.is_err() {
                        debug!("client went away; dropping remaining frames");
                        break;
                    }
                }
            }
            .in_current_span(),
        );

        drain_frames(&state, &ctx, &mut receiver, &out_tx).await;

        drop(out_tx);
        let _ = writer.await;
        info!("client disconnected");
    }
    .instrument(span)
    .await
}

/// Handle inbound frames one at a time until the client closes or the read fails.
async fn drain_frames<S, E>(
    state: &AppState,
    ctx: &ConnectionContext,
    incoming: &mut S,
    out: &mpsc::Sender<Outbound>,
) where
    S: Stream<Item = Result<Message, E>> + Unpin,
    E: std::fmt::Display,
{
    while let Some(msg) = incoming.next().await {
        match msg {
            Ok(Message::Text(text)) => relay_turn(state, ctx, text.as_str(), out).await,
            Ok(Message::Binary(bytes)) => match std::str::from_utf8(&bytes) {
                Ok(text) => relay_turn(state, ctx, text, out).await,
                Err(e) => {
                    warn!(error = %e, "binary frame is not UTF-8");
                    let message = InputError::Malformed(e.to_string()).to_string();
                    let _ = out.send(Outbound::error(message)).await;
                }
            },
            Ok(Message::Close(_)) => break,
            Ok(Message::Ping(_) | Message::Pong(_)) => {}
            Err(e) => {
                debug!(error = %e, "websocket receive failed");
                break;
            }
        }
    }
}

/// Run one inbound frame to its terminal message.
///
/// Every path sends exactly one `Done` or `Error` to `out`. A closed `out`
/// does not stop the turn.
pub async fn relay_turn(
    state: &AppState,
    ctx: &ConnectionContext,
    raw: &str,
    out: &mpsc::Sender<Outbound>,
) {
    let terminal = match run_turn(state, ctx, raw, out).await {
        Ok(()) => Outbound::Done,
        Err(message) => Outbound::error(message),
    };
    let _ = out.send(terminal).await;
}

async fn run_turn(
    state: &AppState,
    ctx: &ConnectionContext,
    raw: &str,
    out: &mpsc::Sender<Outbound>,
) -> Result<(), String> {
    let inbound: Inbound = serde_json::from_str(raw).map_err(|e| {
        warn!(error = %e, "malformed inbound frame");
        InputError::Malformed(e.to_string()).to_string()
    })?;

    let conversation = Conversation::from_history(inbound.history).map_err(|e| {
        warn!(error = %e, "rejected history");
        e.to_string()
    })?;

    let Some(driver) = state.driver.as_ref() else {
        error!("turn requested but no LLM is configured");
        return Err("LLM is not configured".to_string());
    };

    let prompt = state.prompt.get().await.map_err(|e| {
        error!(error = %e, "system prompt unavailable");
        "system prompt unavailable".to_string()
    })?;
    let mut conversation = conversation.with_system_prompt(prompt);

    let (delta_tx, mut delta_rx) = mpsc::channel::<Delta>(CHANNEL_CAPACITY);
    let delay = state.chunk_delay();

    let run = async {
        let result = driver.run(&mut conversation, ctx, &delta_tx).await;
        drop(delta_tx);
        result
    };

    let forward = async {
        while let Some(delta) = delta_rx.recv().await {
            match delta {
                Delta::Chunk(value) => {
                    if let Some(delay) = delay {
                        tokio::time::sleep(delay).await;
                    }
                    let _ = out.send(Outbound::Chunk { value }).await;
                }
                Delta::ToolStarted { id, name } => {
                    debug!(tool_call_id = %id, tool = %name, "tool started");
                }
                Delta::ToolFinished { id, name, is_error } => {
                    debug!(tool_call_id = %id, tool = %name, is_error, "tool finished");
                }
            }
        }
    };

    let (result, ()) = tokio::join!(run, forward);
    match result {
        Ok(outcome) => {
            info!(
                model_calls = outcome.model_calls,
                tool_calls = outcome.tool_calls,
                "turn done"
            );
            Ok(())
        }
        Err(e) => {
            error!(error = %e, "turn failed");
            Err(e.to_string())
        }
    }
}
