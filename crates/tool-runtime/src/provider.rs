use crate::conversation::ConversationMessage;
use crate::stream::StreamEvent;
use crate::tool::ToolDefinition;
use async_trait::async_trait;
use futures::Stream;
use std::pin::Pin;

/// Stream of normalized events from one model call.
pub type EventStream = Pin<Box<dyn Stream<Item = Result<StreamEvent, LlmError>> + Send>>;

/// Trait for LLM providers that support tool use and streaming.
///
/// This trait lives in tool-runtime (not in crates/llm) because it's
/// defined by the consumer (the streaming driver), not the provider.
/// Implementations live in crates/llm.
#[async_trait]
pub trait ToolAwareLlmProvider: Send + Sync {
    /// Stream a response from the LLM with tool definitions available.
    async fn stream_with_tools(
        &self,
        messages: Vec<ConversationMessage>,
        system_prompt: Option<String>,
        tools: Vec<ToolDefinition>,
        temperature: f32,
        max_tokens: u32,
    ) -> Result<EventStream, LlmError>;

    /// Provider name for logging/debugging (e.g., "openai", "mock")
    fn provider_name(&self) -> &str;
}

#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("API error: {status} - {message}")]
    ApiError { status: u16, message: String },
    #[error("Network error: {0}")]
    NetworkError(String),
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
    #[error("Rate limited: retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },
    #[error("Authentication failed")]
    AuthError,
    #[error("Stream error: {0}")]
    StreamError(String),
}

/// Mock LLM provider for testing the driver without real API calls.
#[cfg(any(test, feature = "test-utils"))]
pub mod mock {
    use super::*;
    use crate::stream::FinishReason;
    use futures::stream;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// One scripted model call.
    pub enum MockResponse {
        /// Items yielded by the stream, errors included.
        Stream(Vec<Result<StreamEvent, LlmError>>),
        /// The request itself fails.
        Fail(LlmError),
    }

    /// What the driver sent on one call.
    #[derive(Debug, Clone)]
    pub struct RecordedRequest {
        pub messages: Vec<ConversationMessage>,
        pub system_prompt: Option<String>,
        pub tools: Vec<ToolDefinition>,
    }

    /// A mock provider that replays queued responses in FIFO order.
    pub struct MockLlmProvider {
        responses: Mutex<VecDeque<MockResponse>>,
        requests: Mutex<Vec<RecordedRequest>>,
    }

    impl MockLlmProvider {
        pub fn new() -> Self {
            Self {
                responses: Mutex::new(VecDeque::new()),
                requests: Mutex::new(Vec::new()),
            }
        }

        pub fn queue(&self, response: MockResponse) {
            self.responses.lock().unwrap().push_back(response);
        }

        /// Queue a response made of the given events.
        pub fn queue_events(&self, events: Vec<StreamEvent>) {
            self.queue(MockResponse::Stream(events.into_iter().map(Ok).collect()));
        }

        /// Queue a text response streamed as the given chunks.
        pub fn queue_text_chunks(&self, chunks: &[&str]) {
            let mut events: Vec<StreamEvent> = chunks
                .iter()
                .map(|c| StreamEvent::ContentDelta {
                    text: c.to_string(),
                })
                .collect();
            events.push(StreamEvent::Finish {
                reason: FinishReason::Stop,
            });
            self.queue_events(events);
        }

        /// Queue a simple text response.
        pub fn queue_text(&self, text: &str) {
            self.queue_text_chunks(&[text]);
        }

        /// Queue a single complete tool call at index 0.
        pub fn queue_tool_call(&self, id: &str, name: &str, arguments: &str) {
            self.queue_events(vec![
                StreamEvent::ToolCallDelta {
                    index: 0,
                    id: Some(id.to_string()),
                    name: Some(name.to_string()),
                    arguments_delta: Some(arguments.to_string()),
                },
                StreamEvent::Finish {
                    reason: FinishReason::ToolCalls,
                },
            ]);
        }

        pub fn requests(&self) -> Vec<RecordedRequest> {
            self.requests.lock().unwrap().clone()
        }

        pub fn call_count(&self) -> usize {
            self.requests.lock().unwrap().len()
        }
    }

    impl Default for MockLlmProvider {
        fn default() -> Self {
            Self::new()
        }
    }

    #[async_trait]
    impl ToolAwareLlmProvider for MockLlmProvider {
        async fn stream_with_tools(
            &self,
            messages: Vec<ConversationMessage>,
            system_prompt: Option<String>,
            tools: Vec<ToolDefinition>,
            _temperature: f32,
            _max_tokens: u32,
        ) -> Result<EventStream, LlmError> {
            self.requests.lock().unwrap().push(RecordedRequest {
                messages,
                system_prompt,
                tools,
            });

            let response = self.responses.lock().unwrap().pop_front();
            match response {
                Some(MockResponse::Stream(items)) => Ok(Box::pin(stream::iter(items))),
                Some(MockResponse::Fail(e)) => Err(e),
                None => Ok(Box::pin(stream::iter(vec![Ok(StreamEvent::Finish {
                    reason: FinishReason::Stop,
                })]))),
            }
        }

        fn provider_name(&self) -> &str {
            "mock"
        }
    }
}
