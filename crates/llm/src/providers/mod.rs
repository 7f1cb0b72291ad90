pub mod openai;
pub mod openai_chat;

use std::sync::Arc;

use mammoth_core::config::LlmConfig;
use mammoth_tool_runtime::ToolAwareLlmProvider;

use crate::provider::{LlmError, LlmProvider};

/// Non-streaming provider for `/api/assistant`.
pub fn create_provider(llm_config: &LlmConfig) -> Result<Box<dyn LlmProvider>, LlmError> {
    let api_key = llm_config.require_api_key()?;
    Ok(Box::new(openai::OpenAiProvider::new(
        api_key.to_string(),
        llm_config.model.clone(),
        llm_config.base_url.clone(),
    )))
}

/// Streaming, tool-aware provider for the websocket relay.
pub fn create_tool_provider(
    llm_config: &LlmConfig,
) -> Result<Arc<dyn ToolAwareLlmProvider>, LlmError> {
    let api_key = llm_config.require_api_key()?;
    Ok(Arc::new(openai_chat::OpenAiChatProvider::new(
        api_key.to_string(),
        llm_config.model.clone(),
        llm_config.base_url.clone(),
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(api_key: Option<&str>) -> LlmConfig {
        LlmConfig {
            api_key: api_key.map(String::from),
            model: "gpt-4.1-nano-2025-04-14".into(),
            base_url: "https://api.openai.com".into(),
            temperature: 0.7,
            max_tokens: 2048,
            max_tool_iterations: 10,
        }
    }

    #[test]
    fn test_missing_key_is_not_configured() {
        assert!(matches!(
            create_provider(&config(None)),
            Err(LlmError::NotConfigured(_))
        ));
        assert!(matches!(
            create_tool_provider(&config(None)),
            Err(LlmError::NotConfigured(_))
        ));
    }

    #[test]
    fn test_tool_provider_is_openai() {
        let provider = create_tool_provider(&config(Some("sk-test"))).unwrap();
        assert_eq!(provider.provider_name(), "openai");
    }
}
