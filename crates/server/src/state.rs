use std::time::Duration;

use mammoth_core::Config;
use mammoth_llm::{LlmProvider, PromptCache};
use mammoth_tool_runtime::StreamingDriver;

use crate::auth::SessionStore;

pub struct AppState {
    pub config: Config,
    /// `None` when no API key is configured; turns then end in an error frame.
    pub driver: Option<StreamingDriver>,
    pub completion: Option<Box<dyn LlmProvider>>,
    pub prompt: PromptCache,
    pub sessions: SessionStore,
}

impl AppState {
    pub fn chunk_delay(&self) -> Option<Duration> {
        match self.config.relay.chunk_delay_ms {
            0 => None,
            ms => Some(Duration::from_millis(ms)),
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;

    use mammoth_storage::ProfileStore;
    use mammoth_tool_runtime::provider::mock::MockLlmProvider;
    use mammoth_tool_runtime::ToolAwareLlmProvider;

    use super::*;
    use crate::startup::build_registry;

    pub const TEST_ACCESS_TOKEN: &str = "test-access-token";

    pub struct TestApp {
        pub state: Arc<AppState>,
        pub provider: Arc<MockLlmProvider>,
    }

    fn test_config() -> Config {
        let mut config = Config::for_profile("MAMMOTH_SERVER_TEST");
        config.auth.access_token = Some(TEST_ACCESS_TOKEN.to_string());
        config.auth.session_ttl_secs = 3600;
        config.auth.secure_cookie = false;
        config.relay.chunk_delay_ms = 0;
        config
    }

    /// App state backed by a mock model and an in-memory profile store.
    pub fn test_app(store: ProfileStore) -> TestApp {
        let config = test_config();
        let provider = Arc::new(MockLlmProvider::new());
        let registry = build_registry(Arc::new(store)).unwrap();
        let driver = StreamingDriver::new(
            provider.clone() as Arc<dyn ToolAwareLlmProvider>,
            Arc::new(registry),
        );
        let sessions = SessionStore::new(&config.auth);
        TestApp {
            state: Arc::new(AppState {
                config,
                driver: Some(driver),
                completion: None,
                prompt: PromptCache::fixed("You are the AskMammoth Oracle."),
                sessions,
            }),
            provider,
        }
    }

    /// App state with no model configured.
    pub fn unconfigured_app() -> Arc<AppState> {
        let config = test_config();
        let sessions = SessionStore::new(&config.auth);
        Arc::new(AppState {
            config,
            driver: None,
            completion: None,
            prompt: PromptCache::fixed(""),
            sessions,
        })
    }
}
