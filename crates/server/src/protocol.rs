//! WebSocket wire messages for `/ws/assistant`.

use serde::{Deserialize, Serialize};

use mammoth_tool_runtime::Turn;

/// One client request: the full conversation so far, ending with the user's turn.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Inbound {
    pub history: Vec<Turn>,
}

/// Server → client frames. Each turn ends with exactly one `Done` or `Error`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Outbound {
    Chunk { value: String },
    Done,
    Error { error: String },
}

impl Outbound {
    pub fn error(message: impl Into<String>) -> Self {
        Outbound::Error {
            error: message.into(),
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, Outbound::Chunk { .. })
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}
