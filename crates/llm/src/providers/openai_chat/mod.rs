//! OpenAI chat-completions implementation of [`ToolAwareLlmProvider`].
//!
//! Streams `/v1/chat/completions` with `stream: true` and translates the SSE
//! `data:` chunks into provider-agnostic [`StreamEvent`]s. Tool-call fragments
//! are passed through untouched; reassembly happens in the driver's accumulator.
//!
//! [`ToolAwareLlmProvider`]: mammoth_tool_runtime::ToolAwareLlmProvider
//! [`StreamEvent`]: mammoth_tool_runtime::StreamEvent

mod sse;
mod streaming;
mod translate;

pub use self::streaming::OpenAiChatProvider;

#[cfg(test)]
mod tests;
