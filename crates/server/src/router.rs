//! HTTP router construction.
//!
//! Assembles all Axum routes and middleware into a single `Router`.

use std::sync::Arc;

use anyhow::Context;
use axum::http::{header, HeaderValue, Method};
use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;

use crate::state::AppState;
use crate::{api, auth, relay};

/// Whether browsers on other origins may send the session cookie.
pub fn allows_credentials(origin: &str) -> bool {
    origin != "*"
}

/// `*` allows any origin without credentials; a concrete origin also
/// allows the session cookie to be sent cross-site.
pub fn cors_layer(origin: &str) -> anyhow::Result<CorsLayer> {
    if !allows_credentials(origin) {
        return Ok(CorsLayer::permissive());
    }
    let origin = HeaderValue::from_str(origin)
        .with_context(|| format!("invalid CORS_ORIGIN '{}'", origin))?;
    Ok(CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE])
        .allow_credentials(true))
}

/// Build the complete application router with all routes and middleware.
pub fn build_router(state: Arc<AppState>) -> anyhow::Result<Router> {
    let cors = cors_layer(&state.config.server.cors_origin)?;

    let protected = Router::new()
        .route("/ws/assistant", get(relay::ws_assistant))
        .route("/api/assistant", post(api::assistant))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_session,
        ));

    Ok(Router::new()
        .route("/health", get(api::health))
        .route(
            "/api/authenticate",
            get(api::session_status).post(api::authenticate),
        )
        .merge(protected)
        .layer(cors)
        .with_state(state))
}
