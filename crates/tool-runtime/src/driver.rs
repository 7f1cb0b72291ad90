use crate::accumulator::{PendingToolCall, ToolCallAccumulator};
use crate::conversation::Conversation;
use crate::provider::{LlmError, ToolAwareLlmProvider};
use crate::registry::ToolRegistry;
use crate::stream::{FinishReason, StreamEvent};
use crate::tool::ToolResult;
use futures::StreamExt;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Per-connection handle passed explicitly through the driver.
///
/// Every websocket connection gets its own; nothing about a conversation is
/// kept in process-wide state.
#[derive(Debug, Clone)]
pub struct ConnectionContext {
    pub connection_id: Uuid,
}

impl ConnectionContext {
    pub fn new() -> Self {
        Self {
            connection_id: Uuid::new_v4(),
        }
    }
}

impl Default for ConnectionContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Incremental output pushed to the caller while a turn runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delta {
    /// Assistant text to append to the in-progress turn.
    Chunk(String),
    ToolStarted { id: String, name: String },
    ToolFinished { id: String, name: String, is_error: bool },
}

/// Summary of a completed turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnOutcome {
    /// Full assistant text of the final response.
    pub text: String,
    pub model_calls: usize,
    pub tool_calls: usize,
}

#[derive(Debug, thiserror::Error)]
pub enum DriverError {
    #[error("upstream model error: {0}")]
    Upstream(#[from] LlmError),
    #[error("gave up after {0} model calls without a final answer")]
    MaxIterations(usize),
}

/// Driver state between model calls.
enum DriverState {
    /// Next step is a model call.
    Streaming,
    /// The last response asked for these tools; results go back before the next call.
    AwaitingToolResults(Vec<PendingToolCall>),
}

/// How a single model call ended.
enum StreamOutcome {
    Text(String),
    ToolCalls(Vec<PendingToolCall>),
}

/// Drives one conversation turn: model call, tool dispatch, model call again,
/// until the model answers with text and no pending tool calls.
pub struct StreamingDriver {
    provider: Arc<dyn ToolAwareLlmProvider>,
    registry: Arc<ToolRegistry>,
    max_iterations: usize,
    temperature: f32,
    max_tokens: u32,
}

impl StreamingDriver {
    pub fn new(provider: Arc<dyn ToolAwareLlmProvider>, registry: Arc<ToolRegistry>) -> Self {
        Self {
            provider,
            registry,
            max_iterations: 10,
            temperature: 0.7,
            max_tokens: 2048,
        }
    }

    pub fn with_max_iterations(mut self, max: usize) -> Self {
        self.max_iterations = max.max(1);
        self
    }

    pub fn with_temperature(mut self, temp: f32) -> Self {
        self.temperature = temp;
        self
    }

    pub fn with_max_tokens(mut self, max: u32) -> Self {
        self.max_tokens = max;
        self
    }

    /// Run one turn. Text deltas go to `tx` as they arrive; a closed
    /// receiver is ignored and the turn still runs to completion.
    ///
    /// On success the final assistant text has been appended to
    /// `conversation`. Upstream errors abort the turn without retry.
    pub async fn run(
        &self,
        conversation: &mut Conversation,
        ctx: &ConnectionContext,
        tx: &mpsc::Sender<Delta>,
    ) -> Result<TurnOutcome, DriverError> {
        let mut state = DriverState::Streaming;
        let mut model_calls = 0;
        let mut tool_calls = 0;

        loop {
            state = match state {
                DriverState::Streaming => {
                    if model_calls >= self.max_iterations {
                        warn!(connection_id = %ctx.connection_id, model_calls, "iteration limit reached");
                        return Err(DriverError::MaxIterations(model_calls));
                    }
                    model_calls += 1;
                    debug!(connection_id = %ctx.connection_id, iteration = model_calls, "starting model call");

                    match self.stream_once(conversation, ctx, tx).await? {
                        StreamOutcome::Text(text) => {
                            info!(
                                connection_id = %ctx.connection_id,
                                model_calls,
                                tool_calls,
                                chars = text.len(),
                                "turn complete"
                            );
                            conversation.add_assistant_text(text.clone());
                            return Ok(TurnOutcome {
                                text,
                                model_calls,
                                tool_calls,
                            });
                        }
                        StreamOutcome::ToolCalls(calls) => DriverState::AwaitingToolResults(calls),
                    }
                }
                DriverState::AwaitingToolResults(calls) => {
                    tool_calls += calls.len();
                    self.dispatch_tool_calls(conversation, ctx, calls, tx).await;
                    DriverState::Streaming
                }
            };
        }
    }

    /// One model call. The accumulator lives only for this call.
    async fn stream_once(
        &self,
        conversation: &Conversation,
        ctx: &ConnectionContext,
        tx: &mpsc::Sender<Delta>,
    ) -> Result<StreamOutcome, DriverError> {
        let mut stream = self
            .provider
            .stream_with_tools(
                conversation.messages().to_vec(),
                conversation.system_prompt().map(String::from),
                self.registry.list(),
                self.temperature,
                self.max_tokens,
            )
            .await?;

        let mut text = String::new();
        let mut accumulator = ToolCallAccumulator::new();
        let mut finish_reason = None;

        while let Some(event) = stream.next().await {
            match event? {
                StreamEvent::ContentDelta { text: chunk } => {
                    if chunk.is_empty() {
                        continue;
                    }
                    text.push_str(&chunk);
                    // Receiver gone means the client disconnected; keep going.
                    let _ = tx.send(Delta::Chunk(chunk)).await;
                }
                StreamEvent::ToolCallDelta {
                    index,
                    id,
                    name,
                    arguments_delta,
                } => {
                    accumulator.ingest(
                        index,
                        id.as_deref(),
                        name.as_deref(),
                        arguments_delta.as_deref(),
                    );
                }
                StreamEvent::Finish { reason } => {
                    finish_reason = Some(reason);
                }
            }
        }

        debug!(
            connection_id = %ctx.connection_id,
            finish_reason = ?finish_reason,
            chars = text.len(),
            pending_tool_calls = accumulator.len(),
            provider = self.provider.provider_name(),
            "model stream ended"
        );

        if finish_reason == Some(FinishReason::Length) {
            warn!(connection_id = %ctx.connection_id, "response truncated by max_tokens");
        }

        // Content preempts tool calls so the client never sees two answers.
        if !text.is_empty() {
            if !accumulator.is_empty() {
                warn!(
                    connection_id = %ctx.connection_id,
                    dropped = accumulator.len(),
                    "response had both text and tool calls; ignoring tool calls"
                );
            }
            return Ok(StreamOutcome::Text(text));
        }

        if accumulator.is_empty() {
            return Ok(StreamOutcome::Text(text));
        }
        Ok(StreamOutcome::ToolCalls(accumulator.finalize()))
    }

    /// Append the synthetic assistant message, then run each call in index
    /// order and append its result. Failures become error results.
    async fn dispatch_tool_calls(
        &self,
        conversation: &mut Conversation,
        ctx: &ConnectionContext,
        calls: Vec<PendingToolCall>,
        tx: &mpsc::Sender<Delta>,
    ) {
        info!(connection_id = %ctx.connection_id, count = calls.len(), "executing tool calls");

        let records: Vec<_> = calls.iter().map(PendingToolCall::to_tool_call).collect();
        conversation.add_tool_calls(records.clone());

        for (pending, record) in calls.iter().zip(records) {
            let args = match pending.parse_arguments() {
                Ok(args) => args,
                Err(e) => {
                    warn!(
                        connection_id = %ctx.connection_id,
                        tool = %record.name,
                        error = %e,
                        "unparseable tool arguments; calling with {{}}"
                    );
                    serde_json::json!({})
                }
            };

            let _ = tx
                .send(Delta::ToolStarted {
                    id: record.id.clone(),
                    name: record.name.clone(),
                })
                .await;

            let outcome = self.registry.dispatch(&record.name, args).await;

            let _ = tx
                .send(Delta::ToolFinished {
                    id: record.id.clone(),
                    name: record.name.clone(),
                    is_error: outcome.is_error,
                })
                .await;

            conversation.add_tool_result(ToolResult {
                tool_call_id: record.id,
                content: outcome.content,
                is_error: outcome.is_error,
            });
        }
    }
}
