//! Server startup: shared state initialization and the listener.

use std::sync::Arc;

use anyhow::Context;
use tracing::{info, warn};

use mammoth_core::Config;
use mammoth_llm::{create_provider, create_tool_provider, PromptCache};
use mammoth_storage::ProfileStore;
use mammoth_tool_runtime::{FetchCandidateProfileTool, StreamingDriver, ToolRegistry};

use crate::auth::SessionStore;
use crate::router;
use crate::state::AppState;

/// Tools offered to the model on every turn.
pub fn build_registry(store: Arc<ProfileStore>) -> anyhow::Result<ToolRegistry> {
    let mut registry = ToolRegistry::new();
    registry.register(FetchCandidateProfileTool::new(store))?;
    Ok(registry)
}

pub fn build_app_state(config: Config) -> anyhow::Result<Arc<AppState>> {
    let store = ProfileStore::from_config(&config.storage).context("failed to open profile store")?;
    info!(backend = store.backend().label(), "profile store ready");
    let registry = Arc::new(build_registry(Arc::new(store))?);

    let driver = match create_tool_provider(&config.llm) {
        Ok(provider) => {
            info!(model = %config.llm.model, tools = registry.len(), "streaming driver ready");
            Some(
                StreamingDriver::new(provider, registry)
                    .with_max_iterations(config.llm.max_tool_iterations)
                    .with_temperature(config.llm.temperature)
                    .with_max_tokens(config.llm.max_tokens),
            )
        }
        Err(e) => {
            warn!("LLM not available: {} (websocket turns will report errors)", e);
            None
        }
    };

    let completion = match create_provider(&config.llm) {
        Ok(provider) => Some(provider),
        Err(e) => {
            warn!("LLM not available: {} (POST /api/assistant disabled)", e);
            None
        }
    };

    let sessions = SessionStore::new(&config.auth);
    if sessions.is_open() {
        warn!("ACCESS_TOKEN not set: protected routes are open to everyone");
    } else if !router::allows_credentials(&config.server.cors_origin) {
        warn!(
            "CORS_ORIGIN is '*': cross-origin browsers cannot send the session cookie; \
             set CORS_ORIGIN to the frontend origin"
        );
    }

    Ok(Arc::new(AppState {
        prompt: PromptCache::new(config.relay.prompt_path.clone()),
        config,
        driver,
        completion,
        sessions,
    }))
}

pub async fn serve(config: Config) -> anyhow::Result<()> {
    config.log_summary();
    let addr = format!("{}:{}", config.server.host, config.server.port);

    let state = build_app_state(config)?;
    if let Err(e) = state.prompt.get().await {
        warn!("{} (will retry on first turn)", e);
    }

    let app = router::build_router(state)?;
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("failed to listen for ctrl_c: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
