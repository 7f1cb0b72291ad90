//! Reassembles streamed tool-call fragments into complete calls.

use serde_json::Value;
use std::collections::BTreeMap;

use crate::tool::ToolCall;

/// A tool call under construction, keyed by its stream index.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PendingToolCall {
    pub index: usize,
    pub id: Option<String>,
    pub name: Option<String>,
    /// Argument fragments concatenated in arrival order.
    pub arguments: String,
}

impl PendingToolCall {
    /// Parse the buffered arguments. An empty buffer is not valid JSON.
    pub fn parse_arguments(&self) -> Result<Value, serde_json::Error> {
        serde_json::from_str(&self.arguments)
    }

    /// The raw record echoed back on the synthetic assistant message.
    /// Calls whose id never arrived get a stable placeholder so the
    /// matching tool result can still be paired.
    pub fn to_tool_call(&self) -> ToolCall {
        ToolCall {
            id: self
                .id
                .clone()
                .unwrap_or_else(|| format!("call_{}", self.index)),
            name: self.name.clone().unwrap_or_default(),
            arguments: self.arguments.clone(),
        }
    }
}

/// Per-iteration buffer of tool-call fragments.
///
/// Keyed strictly by the `index` the stream assigns, never by `id`.
/// Fragments are appended verbatim: no de-duplication, no reordering.
#[derive(Debug, Default)]
pub struct ToolCallAccumulator {
    calls: BTreeMap<usize, PendingToolCall>,
}

impl ToolCallAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge one fragment into the call at `index`.
    pub fn ingest(
        &mut self,
        index: usize,
        id: Option<&str>,
        name: Option<&str>,
        arguments_delta: Option<&str>,
    ) {
        let call = self.calls.entry(index).or_insert_with(|| PendingToolCall {
            index,
            ..PendingToolCall::default()
        });

        if let Some(id) = id.filter(|s| !s.is_empty()) {
            call.id = Some(id.to_string());
        }
        if let Some(name) = name.filter(|s| !s.is_empty()) {
            match call.name.as_mut() {
                // Some servers stream the name in pieces too
                Some(existing) if call.arguments.is_empty() && existing != name => {
                    existing.push_str(name)
                }
                Some(_) => {}
                None => call.name = Some(name.to_string()),
            }
        }
        if let Some(fragment) = arguments_delta {
            call.arguments.push_str(fragment);
        }
    }

    /// Drain every buffered call in index order, valid JSON or not.
    pub fn finalize(&mut self) -> Vec<PendingToolCall> {
        std::mem::take(&mut self.calls).into_values().collect()
    }

    pub fn len(&self) -> usize {
        self.calls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.calls.is_empty()
    }
}
