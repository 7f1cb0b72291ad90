use crate::tool::{Tool, ToolDefinition};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// Fallback text returned for a tool name nobody registered.
pub const TOOL_NOT_IMPLEMENTED: &str = "Tool not implemented.";

/// Maps tool names to handlers. Adding a tool never touches the driver.
pub struct ToolRegistry {
    tools: BTreeMap<String, Arc<dyn Tool>>,
}

/// What a dispatched call produced. Always a string, even on failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolOutcome {
    pub content: String,
    pub is_error: bool,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: BTreeMap::new(),
        }
    }

    /// Register a tool. Returns error if name already registered.
    pub fn register(&mut self, tool: impl Tool + 'static) -> Result<(), RegistryError> {
        let def = tool.definition();
        if self.tools.contains_key(&def.name) {
            return Err(RegistryError::DuplicateName(def.name));
        }
        self.tools.insert(def.name, Arc::new(tool));
        Ok(())
    }

    /// Look up a tool by name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    /// List all registered tool definitions (for sending to LLM).
    pub fn list(&self) -> Vec<ToolDefinition> {
        self.tools.values().map(|t| t.definition()).collect()
    }

    /// Execute `name` with `args`. Never fails: unknown tools and execution
    /// errors become human-readable fallback strings.
    pub async fn dispatch(&self, name: &str, args: Value) -> ToolOutcome {
        let Some(tool) = self.get(name) else {
            warn!(tool = name, "model requested an unregistered tool");
            return ToolOutcome {
                content: TOOL_NOT_IMPLEMENTED.to_string(),
                is_error: true,
            };
        };

        match tool.execute(args).await {
            Ok(content) => {
                debug!(tool = name, bytes = content.len(), "tool finished");
                ToolOutcome {
                    content,
                    is_error: false,
                }
            }
            Err(e) => {
                warn!(tool = name, error = %e, "tool failed");
                ToolOutcome {
                    content: format!("Tool error: {}", e),
                    is_error: true,
                }
            }
        }
    }

    /// Number of registered tools.
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("Tool with name '{0}' is already registered")]
    DuplicateName(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tool::EchoTool;

    #[test]
    fn test_register_and_lookup() {
        let mut registry = ToolRegistry::new();
        registry.register(EchoTool).unwrap();

        assert_eq!(registry.len(), 1);
        assert!(registry.get("echo").is_some());
        assert!(registry.get("nonexistent").is_none());
    }

    #[test]
    fn test_duplicate_registration() {
        let mut registry = ToolRegistry::new();
        registry.register(EchoTool).unwrap();
        assert!(registry.register(EchoTool).is_err());
    }

    #[test]
    fn test_list_definitions() {
        let mut registry = ToolRegistry::new();
        registry.register(EchoTool).unwrap();

        let defs = registry.list();
        assert_eq!(defs.len(), 1);
        assert_eq!(defs[0].name, "echo");
    }

    #[tokio::test]
    async fn test_dispatch_known_tool() {
        let mut registry = ToolRegistry::new();
        registry.register(EchoTool).unwrap();

        let outcome = registry
            .dispatch("echo", serde_json::json!({"message": "ping"}))
            .await;
        assert_eq!(outcome.content, "ping");
        assert!(!outcome.is_error);
    }

    #[tokio::test]
    async fn test_dispatch_unknown_tool_falls_back() {
        let registry = ToolRegistry::new();
        let outcome = registry.dispatch("launch_rockets", serde_json::json!({})).await;
        assert_eq!(outcome.content, TOOL_NOT_IMPLEMENTED);
        assert!(outcome.is_error);
    }

    #[tokio::test]
    async fn test_dispatch_tool_error_is_contained() {
        let mut registry = ToolRegistry::new();
        registry.register(EchoTool).unwrap();

        let outcome = registry.dispatch("echo", serde_json::json!({})).await;
        assert!(outcome.is_error);
        assert!(outcome.content.starts_with("Tool error: Invalid input"));
    }
}
