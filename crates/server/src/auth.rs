//! Shared-secret login and cookie sessions.
//!
//! A client trades the configured access token for an opaque session id via
//! `POST /api/authenticate`. Protected routes then require that id in the
//! `mammoth_session` cookie. Sessions live in memory and expire after the
//! configured TTL.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::extract::{Request, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use rand::RngCore;
use tokio::sync::RwLock;
use tracing::debug;

use mammoth_core::config::AuthConfig;

use crate::api::ErrorResponse;
use crate::state::AppState;

pub const SESSION_COOKIE: &str = "mammoth_session";

/// Upper bound on `SESSION_TTL_SECS`; longer values are clamped.
pub const MAX_SESSION_TTL: Duration = Duration::from_secs(365 * 24 * 60 * 60);

pub struct SessionStore {
    access_token: Option<String>,
    ttl: Duration,
    secure_cookie: bool,
    sessions: RwLock<HashMap<String, Instant>>,
}

impl SessionStore {
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            access_token: config.access_token.clone().filter(|t| !t.is_empty()),
            ttl: Duration::from_secs(config.session_ttl_secs).min(MAX_SESSION_TTL),
            secure_cookie: config.secure_cookie,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// No access token configured: every request counts as authenticated.
    pub fn is_open(&self) -> bool {
        self.access_token.is_none()
    }

    /// Issue a new session id when `candidate` matches the access token.
    pub async fn authenticate(&self, candidate: &str) -> Option<String> {
        let expected = self.access_token.as_deref()?;
        if !constant_time_eq(expected.as_bytes(), candidate.as_bytes()) {
            return None;
        }

        let mut bytes = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut bytes);
        let token = hex::encode(bytes);

        let mut sessions = self.sessions.write().await;
        let now = Instant::now();
        sessions.retain(|_, expires| *expires > now);
        let expires = now.checked_add(self.ttl).unwrap_or(now);
        sessions.insert(token.clone(), expires);
        debug!(active = sessions.len(), "session issued");
        Some(token)
    }

    /// True when `token` names a live session. Expired entries are dropped.
    pub async fn validate(&self, token: &str) -> bool {
        let now = Instant::now();
        {
            let sessions = self.sessions.read().await;
            match sessions.get(token) {
                None => return false,
                Some(expires) if *expires > now => return true,
                Some(_) => {}
            }
        }
        self.sessions.write().await.remove(token);
        false
    }

    /// True when the request carries a live session, or auth is open.
    pub async fn is_authorized(&self, headers: &HeaderMap) -> bool {
        if self.is_open() {
            return true;
        }
        match session_token(headers) {
            Some(token) => self.validate(token).await,
            None => false,
        }
    }

    /// `Set-Cookie` value for a freshly issued session.
    pub fn cookie(&self, token: &str) -> String {
        format!(
            "{}={}; HttpOnly; SameSite=Lax; Path=/; Max-Age={}{}",
            SESSION_COOKIE,
            token,
            self.ttl.as_secs(),
            if self.secure_cookie { "; Secure" } else { "" }
        )
    }
}

/// Session id from the request's `Cookie` headers, if present.
pub fn session_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value)
        .filter(|value| !value.is_empty())
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

/// Middleware guarding routes that need a session.
pub async fn require_session(
    State(state): State<Arc<AppState>>,
    req: Request,
    next: Next,
) -> Response {
    if state.sessions.is_authorized(req.headers()).await {
        return next.run(req).await;
    }
    (
        StatusCode::UNAUTHORIZED,
        Json(ErrorResponse::new("Authentication required")),
    )
        .into_response()
}
