use crate::tool::{ToolCall, ToolResult};
use serde::{Deserialize, Serialize};

/// Author of a client-visible turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One message of the client-held history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub content: String,
}

impl Turn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// A message in the conversation sent upstream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ConversationMessage {
    /// User's text input
    User(String),
    /// Assistant's response (text and/or declared tool calls)
    Assistant(AssistantContent),
    /// Result of a tool execution
    ToolResult(ToolResult),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssistantContent {
    pub text: Option<String>,
    pub tool_calls: Vec<ToolCall>,
}

/// Rejected inbound history. The turn never starts.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InputError {
    #[error("history must contain at least one turn")]
    EmptyHistory,
    #[error("last turn must have role \"user\"")]
    LastTurnNotUser,
    #[error("malformed message: {0}")]
    Malformed(String),
}

/// Conversation state for one relay turn: system prompt plus messages.
///
/// Built fresh from the client's history each turn; tool-call records and
/// tool results appended while the turn runs are never sent back to the client.
#[derive(Debug, Clone, Default)]
pub struct Conversation {
    messages: Vec<ConversationMessage>,
    system_prompt: Option<String>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate client history and convert it. The last turn must be the
    /// user's; an empty history is rejected.
    pub fn from_history(history: Vec<Turn>) -> Result<Self, InputError> {
        match history.last() {
            None => return Err(InputError::EmptyHistory),
            Some(last) if last.role != Role::User => return Err(InputError::LastTurnNotUser),
            Some(_) => {}
        }

        let mut conversation = Self::new();
        for turn in history {
            match turn.role {
                Role::User => conversation.add_user_message(turn.content),
                Role::Assistant => conversation.add_assistant_text(turn.content),
            }
        }
        Ok(conversation)
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        let prompt = prompt.into();
        self.system_prompt = (!prompt.trim().is_empty()).then_some(prompt);
        self
    }

    pub fn system_prompt(&self) -> Option<&str> {
        self.system_prompt.as_deref()
    }

    pub fn add_user_message(&mut self, text: String) {
        self.messages.push(ConversationMessage::User(text));
    }

    pub fn add_assistant_text(&mut self, text: String) {
        self.messages.push(ConversationMessage::Assistant(AssistantContent {
            text: Some(text),
            tool_calls: Vec::new(),
        }));
    }

    /// Synthetic assistant message declaring the calls about to run.
    pub fn add_tool_calls(&mut self, tool_calls: Vec<ToolCall>) {
        self.messages.push(ConversationMessage::Assistant(AssistantContent {
            text: None,
            tool_calls,
        }));
    }

    pub fn add_tool_result(&mut self, result: ToolResult) {
        self.messages.push(ConversationMessage::ToolResult(result));
    }

    pub fn messages(&self) -> &[ConversationMessage] {
        &self.messages
    }

    /// Text of the most recent assistant message that carried text.
    pub fn last_assistant_text(&self) -> Option<&str> {
        self.messages.iter().rev().find_map(|m| match m {
            ConversationMessage::Assistant(content) => content.text.as_deref(),
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_history_preserves_order() {
        let conv = Conversation::from_history(vec![
            Turn::user("Hi"),
            Turn::assistant("Hello! Who should I foretell?"),
            Turn::user("Tell me about Jason"),
        ])
        .unwrap();

        assert_eq!(conv.messages().len(), 3);
        assert_eq!(conv.messages()[2], ConversationMessage::User("Tell me about Jason".into()));
        assert_eq!(conv.last_assistant_text(), Some("Hello! Who should I foretell?"));
    }

    #[test]
    fn test_empty_history_rejected() {
        assert_eq!(Conversation::from_history(vec![]).unwrap_err(), InputError::EmptyHistory);
    }

    #[test]
    fn test_assistant_last_rejected() {
        let err = Conversation::from_history(vec![Turn::user("Hi"), Turn::assistant("Hello")])
            .unwrap_err();
        assert_eq!(err, InputError::LastTurnNotUser);
    }

    #[test]
    fn test_blank_system_prompt_is_dropped() {
        let conv = Conversation::new().with_system_prompt("   ");
        assert!(conv.system_prompt().is_none());
        let conv = Conversation::new().with_system_prompt("You are the Oracle.");
        assert_eq!(conv.system_prompt(), Some("You are the Oracle."));
    }

    #[test]
    fn test_turn_wire_format() {
        let turn: Turn = serde_json::from_str(r#"{"role":"user","content":"hey"}"#).unwrap();
        assert_eq!(turn, Turn::user("hey"));
        assert!(serde_json::from_str::<Turn>(r#"{"role":"system","content":"x"}"#).is_err());
    }
}
