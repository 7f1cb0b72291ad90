//! HTTP endpoints outside the websocket relay.

mod assistant;
mod authenticate;
mod health;

pub use assistant::assistant;
pub use authenticate::{authenticate, session_status};
pub use health::health;

use serde::Serialize;

/// Error body shared by every JSON endpoint: `{"error": "..."}`.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
