use serde::{Deserialize, Serialize};

/// Normalized events emitted by a streaming chat completion.
/// Provider-agnostic; each provider translates its wire format into these.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StreamEvent {
    /// A chunk of assistant text
    ContentDelta {
        text: String,
    },
    /// A fragment of a tool call. `index` identifies the call within the
    /// response; `id` and `name` usually arrive only on the first fragment.
    ToolCallDelta {
        index: usize,
        id: Option<String>,
        name: Option<String>,
        arguments_delta: Option<String>,
    },
    /// The model finished this response
    Finish {
        reason: FinishReason,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum FinishReason {
    /// Normal end of response
    Stop,
    /// Model wants tool results before continuing
    ToolCalls,
    /// Hit max tokens limit
    Length,
    /// Output withheld by the provider's filter
    ContentFilter,
    Other(String),
}

impl FinishReason {
    /// Map the wire value (`finish_reason`) to a variant.
    pub fn from_wire(value: &str) -> Self {
        match value {
            "stop" => FinishReason::Stop,
            "tool_calls" | "function_call" => FinishReason::ToolCalls,
            "length" => FinishReason::Length,
            "content_filter" => FinishReason::ContentFilter,
            other => FinishReason::Other(other.to_string()),
        }
    }
}
