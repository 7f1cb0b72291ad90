//! Access-token login and session status.

use std::sync::Arc;

use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::ErrorResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticateRequest {
    pub access_token: String,
}

#[derive(Debug, Serialize)]
pub struct AuthenticateResponse {
    pub authenticated: bool,
}

/// `POST /api/authenticate`: trade the access token for a session cookie.
pub async fn authenticate(
    State(state): State<Arc<AppState>>,
    Json(req): Json<AuthenticateRequest>,
) -> Response {
    match state.sessions.authenticate(&req.access_token).await {
        Some(token) => {
            info!("client authenticated");
            (
                StatusCode::OK,
                [(header::SET_COOKIE, state.sessions.cookie(&token))],
                Json(AuthenticateResponse {
                    authenticated: true,
                }),
            )
                .into_response()
        }
        None => {
            warn!("rejected access token");
            (
                StatusCode::UNAUTHORIZED,
                Json(ErrorResponse::new("Invalid access token")),
            )
                .into_response()
        }
    }
}

/// `GET /api/authenticate`: 200 when the caller holds a live session.
pub async fn session_status(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Response {
    if state.sessions.is_authorized(&headers).await {
        Json(AuthenticateResponse {
            authenticated: true,
        })
        .into_response()
    } else {
        (
            StatusCode::UNAUTHORIZED,
            Json(ErrorResponse::new("Authentication required")),
        )
            .into_response()
    }
}
