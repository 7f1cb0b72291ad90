pub mod accumulator;
pub mod conversation;
pub mod driver;
pub mod provider;
pub mod registry;
pub mod stream;
pub mod tool;
pub mod tools;

pub use accumulator::{PendingToolCall, ToolCallAccumulator};
pub use conversation::{AssistantContent, Conversation, ConversationMessage, InputError, Role, Turn};
pub use driver::{ConnectionContext, Delta, DriverError, StreamingDriver, TurnOutcome};
pub use provider::{EventStream, LlmError, ToolAwareLlmProvider};
pub use registry::{RegistryError, ToolOutcome, ToolRegistry, TOOL_NOT_IMPLEMENTED};
pub use stream::{FinishReason, StreamEvent};
pub use tool::{Tool, ToolCall, ToolDefinition, ToolError, ToolResult};
pub use tools::{FetchCandidateProfileTool, FETCH_CANDIDATE_PROFILE};
