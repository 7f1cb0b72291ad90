pub mod prompt;
pub mod provider;
pub mod providers;

pub use prompt::{PromptCache, PromptError};
pub use provider::{LlmError, LlmProvider, Message, Role};
pub use providers::openai_chat::OpenAiChatProvider;
pub use providers::{create_provider, create_tool_provider};
