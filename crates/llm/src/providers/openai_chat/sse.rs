//! SSE line framing and chunk parsing for the chat-completions stream.

use serde_json::Value;
use tracing::trace;

use mammoth_tool_runtime::{FinishReason, LlmError, StreamEvent};

/// Outcome of one `data:` payload.
#[derive(Debug, PartialEq)]
pub(super) enum SseData {
    /// The `[DONE]` sentinel; nothing follows.
    Done,
    Events(Vec<StreamEvent>),
}

/// Splits a byte stream into lines. Bytes are buffered until a newline so a
/// multi-byte character split across network chunks decodes intact.
#[derive(Debug, Default)]
pub(super) struct LineBuffer {
    buf: Vec<u8>,
}

impl LineBuffer {
    pub(super) fn new() -> Self {
        Self::default()
    }

    pub(super) fn push(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Next complete line without its terminator, if one is buffered.
    pub(super) fn next_line(&mut self) -> Option<String> {
        let pos = self.buf.iter().position(|b| *b == b'\n')?;
        let mut line: Vec<u8> = self.buf.drain(..=pos).collect();
        line.pop();
        if line.last() == Some(&b'\r') {
            line.pop();
        }
        Some(String::from_utf8_lossy(&line).into_owned())
    }

    /// Whatever is left once the body ends without a trailing newline.
    pub(super) fn take_rest(&mut self) -> Option<String> {
        if self.buf.is_empty() {
            return None;
        }
        let rest = std::mem::take(&mut self.buf);
        Some(String::from_utf8_lossy(&rest).trim_end_matches('\r').to_string())
    }
}

/// Parse one SSE line. Comments, blank lines and non-`data` fields yield `None`.
pub(super) fn parse_line(line: &str) -> Option<Result<SseData, LlmError>> {
    let data = line.strip_prefix("data:")?.trim_start();
    if data.is_empty() {
        return None;
    }
    Some(parse_data(data))
}

/// Parse the payload of a `data:` line.
pub(super) fn parse_data(data: &str) -> Result<SseData, LlmError> {
    if data == "[DONE]" {
        return Ok(SseData::Done);
    }

    let parsed: Value = serde_json::from_str(data)
        .map_err(|e| LlmError::InvalidResponse(format!("bad stream chunk: {}", e)))?;

    if let Some(err) = parsed.get("error") {
        let message = err["message"]
            .as_str()
            .map(String::from)
            .unwrap_or_else(|| err.to_string());
        return Err(LlmError::StreamError(message));
    }

    let mut events = Vec::new();
    let Some(choice) = parsed["choices"].get(0) else {
        // Usage-only chunks carry no choices.
        trace!("chunk without choices");
        return Ok(SseData::Events(events));
    };

    let delta = &choice["delta"];
    if let Some(text) = delta["content"].as_str() {
        if !text.is_empty() {
            events.push(StreamEvent::ContentDelta {
                text: text.to_string(),
            });
        }
    }

    if let Some(calls) = delta["tool_calls"].as_array() {
        for (position, call) in calls.iter().enumerate() {
            let index = call["index"].as_u64().map(|i| i as usize).unwrap_or(position);
            let function = &call["function"];
            events.push(StreamEvent::ToolCallDelta {
                index,
                id: call["id"].as_str().map(String::from),
                name: function["name"].as_str().map(String::from),
                arguments_delta: function["arguments"].as_str().map(String::from),
            });
        }
    }

    if let Some(reason) = choice["finish_reason"].as_str() {
        events.push(StreamEvent::Finish {
            reason: FinishReason::from_wire(reason),
        });
    }

    Ok(SseData::Events(events))
}
