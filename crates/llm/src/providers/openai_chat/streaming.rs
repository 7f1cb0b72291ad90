//! [`ToolAwareLlmProvider`] trait implementation for the chat-completions streaming API.

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::{self, Stream, StreamExt};
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::fmt::Display;
use std::pin::Pin;
use tracing::debug;

use mammoth_tool_runtime::{
    ConversationMessage, EventStream, LlmError, StreamEvent, ToolAwareLlmProvider,
    ToolDefinition,
};

use super::sse::{parse_line, LineBuffer, SseData};
use super::translate::{build_messages, tool_definition_to_openai};

/// OpenAI provider with streaming tool-call support.
pub struct OpenAiChatProvider {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl OpenAiChatProvider {
    /// Create a new provider.
    ///
    /// # Arguments
    /// * `api_key` - OpenAI API key
    /// * `model` - Model name (e.g. `"gpt-4.1-nano-2025-04-14"`)
    /// * `base_url` - API base URL without the `/v1` suffix
    pub fn new(api_key: String, model: String, base_url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            model,
            base_url,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn request_body(
        &self,
        messages: &[ConversationMessage],
        system_prompt: Option<&str>,
        tools: &[ToolDefinition],
        temperature: f32,
        max_tokens: u32,
    ) -> Value {
        let mut body = json!({
            "model": self.model,
            "messages": build_messages(system_prompt, messages),
            "temperature": temperature,
            "max_tokens": max_tokens,
            "stream": true,
        });
        if !tools.is_empty() {
            body["tools"] = tools.iter().map(tool_definition_to_openai).collect();
        }
        body
    }
}

#[async_trait]
impl ToolAwareLlmProvider for OpenAiChatProvider {
    async fn stream_with_tools(
        &self,
        messages: Vec<ConversationMessage>,
        system_prompt: Option<String>,
        tools: Vec<ToolDefinition>,
        temperature: f32,
        max_tokens: u32,
    ) -> Result<EventStream, LlmError> {
        let url = format!("{}/v1/chat/completions", self.base_url);
        let body = self.request_body(
            &messages,
            system_prompt.as_deref(),
            &tools,
            temperature,
            max_tokens,
        );

        debug!(model = %self.model, url = %url, messages = messages.len(), tools = tools.len(), "starting chat completion stream");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| LlmError::NetworkError(e.to_string()))?;

        let status = response.status().as_u16();
        if status != 200 {
            let retry_after = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok());
            let body_text = response.text().await.unwrap_or_default();
            return Err(status_error(status, retry_after, body_text));
        }

        Ok(sse_event_stream(response.bytes_stream()))
    }

    fn provider_name(&self) -> &str {
        "openai"
    }
}

/// Map a non-200 response onto [`LlmError`].
pub(super) fn status_error(status: u16, retry_after: Option<u64>, body: String) -> LlmError {
    match status {
        401 | 403 => LlmError::AuthError,
        429 => LlmError::RateLimited {
            retry_after_secs: retry_after.unwrap_or(30),
        },
        _ => {
            let message = serde_json::from_str::<Value>(&body)
                .ok()
                .and_then(|v| v["error"]["message"].as_str().map(String::from))
                .unwrap_or(body);
            LlmError::ApiError { status, message }
        }
    }
}

/// Turn a raw SSE body into [`StreamEvent`]s. Ends at `[DONE]`, at the first
/// error, or when the body ends.
pub(super) fn sse_event_stream<S, E>(bytes: S) -> EventStream
where
    S: Stream<Item = Result<Bytes, E>> + Send + 'static,
    E: Display + Send + 'static,
{
    struct State<S> {
        bytes: Pin<Box<S>>,
        lines: LineBuffer,
        pending: VecDeque<StreamEvent>,
        finished: bool,
    }

    impl<S> State<S> {
        /// Parse one line; returns an error to yield, if any.
        fn feed(&mut self, line: &str) -> Option<LlmError> {
            match parse_line(line)? {
                Ok(SseData::Done) => {
                    self.finished = true;
                    None
                }
                Ok(SseData::Events(events)) => {
                    self.pending.extend(events);
                    None
                }
                Err(e) => {
                    self.finished = true;
                    Some(e)
                }
            }
        }
    }

    let state = State {
        bytes: Box::pin(bytes),
        lines: LineBuffer::new(),
        pending: VecDeque::new(),
        finished: false,
    };

    let events = stream::unfold(state, |mut state| async move {
        loop {
            if let Some(evt) = state.pending.pop_front() {
                return Some((Ok(evt), state));
            }
            if state.finished {
                return None;
            }

            match state.bytes.next().await {
                Some(Ok(chunk)) => {
                    state.lines.push(&chunk);
                    while let Some(line) = state.lines.next_line() {
                        if let Some(err) = state.feed(&line) {
                            return Some((Err(err), state));
                        }
                        if state.finished {
                            break;
                        }
                    }
                }
                Some(Err(e)) => {
                    state.finished = true;
                    return Some((Err(LlmError::StreamError(e.to_string())), state));
                }
                None => {
                    state.finished = true;
                    if let Some(rest) = state.lines.take_rest() {
                        if let Some(err) = state.feed(&rest) {
                            return Some((Err(err), state));
                        }
                    }
                }
            }
        }
    });

    Box::pin(events)
}
