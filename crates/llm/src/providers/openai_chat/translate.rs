//! Translation between provider-agnostic conversation types and the chat-completions format.

use serde_json::{json, Value};

use mammoth_tool_runtime::{ConversationMessage, ToolDefinition};

/// Translate a [`ToolDefinition`] into a `tools[]` entry.
pub(super) fn tool_definition_to_openai(tool: &ToolDefinition) -> Value {
    json!({
        "type": "function",
        "function": {
            "name": tool.name,
            "description": tool.description,
            "parameters": tool.parameters,
        },
    })
}

/// Translate a [`ConversationMessage`] into a chat message object.
pub(super) fn message_to_openai(msg: &ConversationMessage) -> Value {
    match msg {
        ConversationMessage::User(text) => json!({
            "role": "user",
            "content": text,
        }),
        ConversationMessage::Assistant(content) if content.tool_calls.is_empty() => json!({
            "role": "assistant",
            "content": content.text.as_deref().unwrap_or_default(),
        }),
        ConversationMessage::Assistant(content) => {
            let calls: Vec<Value> = content
                .tool_calls
                .iter()
                .map(|tc| {
                    json!({
                        "id": tc.id,
                        "type": "function",
                        "function": {
                            "name": tc.name,
                            "arguments": tc.arguments,
                        },
                    })
                })
                .collect();
            json!({
                "role": "assistant",
                "content": content.text,
                "tool_calls": calls,
            })
        }
        ConversationMessage::ToolResult(result) => json!({
            "role": "tool",
            "tool_call_id": result.tool_call_id,
            "content": result.content,
        }),
    }
}

/// Build the `messages` array: system prompt first, then the conversation.
pub(super) fn build_messages(
    system_prompt: Option<&str>,
    messages: &[ConversationMessage],
) -> Vec<Value> {
    let mut out = Vec::with_capacity(messages.len() + 1);
    if let Some(system) = system_prompt {
        out.push(json!({"role": "system", "content": system}));
    }
    out.extend(messages.iter().map(message_to_openai));
    out
}
