use std::env;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}

/// Read a profiled env var: tries {PROFILE}_{KEY} first, falls back to {KEY}.
fn profiled_env_opt(profile: &str, key: &str) -> Option<String> {
    if !profile.is_empty() {
        let prefixed = format!("{}_{}", profile, key);
        if let Some(v) = env_opt(&prefixed) {
            return Some(v);
        }
    }
    env_opt(key)
}

fn profiled_env_or(profile: &str, key: &str, default: &str) -> String {
    profiled_env_opt(profile, key).unwrap_or_else(|| default.to_string())
}

fn profiled_env_u16(profile: &str, key: &str, default: u16) -> u16 {
    profiled_env_opt(profile, key)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn profiled_env_u32(profile: &str, key: &str, default: u32) -> u32 {
    profiled_env_opt(profile, key)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn profiled_env_u64(profile: &str, key: &str, default: u64) -> u64 {
    profiled_env_opt(profile, key)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

// ── Top-level config ──────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Active profile name (empty = default).
    pub profile: String,
    pub server: ServerConfig,
    pub llm: LlmConfig,
    pub storage: StorageConfig,
    pub auth: AuthConfig,
    pub relay: RelayConfig,
}

impl Config {
    /// Build config from environment variables for a named profile (call
    /// `load_dotenv()` first; empty string = default). When set (e.g. `PROD`),
    /// every key is first looked up as `{PROFILE}_{KEY}`, falling back to `{KEY}`.
    pub fn for_profile(profile: &str) -> Self {
        let p = profile.to_uppercase();
        let p = p.as_str();
        Self {
            profile: p.to_string(),
            server: ServerConfig::from_env_profiled(p),
            llm: LlmConfig::from_env_profiled(p),
            storage: StorageConfig::from_env_profiled(p),
            auth: AuthConfig::from_env_profiled(p),
            relay: RelayConfig::from_env_profiled(p),
        }
    }

    pub fn profile_label(&self) -> &str {
        if self.profile.is_empty() { "default" } else { &self.profile }
    }

    /// Print a redacted summary for startup logs.
    pub fn log_summary(&self) {
        tracing::info!("Config loaded (profile: {}):", self.profile_label());
        tracing::info!("  server:   {}:{} (cors: {})", self.server.host, self.server.port, self.server.cors_origin);
        tracing::info!(
            "  llm:      model={}, base_url={}, key={}",
            self.llm.model,
            self.llm.base_url,
            if self.llm.is_configured() { "set" } else { "(none)" }
        );
        tracing::info!(
            "  storage:  backend={}, bucket={}, prefix={}",
            self.storage.backend.as_str(),
            self.storage.bucket,
            if self.storage.prefix.is_empty() { "(none)" } else { &self.storage.prefix }
        );
        tracing::info!(
            "  auth:     access_token={}, session_ttl={}s",
            if self.auth.access_token.is_some() { "set" } else { "(none)" },
            self.auth.session_ttl_secs
        );
        tracing::info!(
            "  relay:    prompt={}, chunk_delay={}ms",
            self.relay.prompt_path.display(),
            self.relay.chunk_delay_ms
        );
    }
}

// ── Server ────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors_origin: String,
}

impl ServerConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            host: profiled_env_or(p, "HOST", "0.0.0.0"),
            port: profiled_env_u16(p, "PORT", 3000),
            cors_origin: profiled_env_or(p, "CORS_ORIGIN", "*"),
        }
    }
}

// ── LLM (OpenAI-compatible chat completions) ──────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
    pub temperature: f32,
    pub max_tokens: u32,
    /// Upper bound on model calls per conversation turn.
    pub max_tool_iterations: usize,
}

impl LlmConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            api_key: profiled_env_opt(p, "OPENAI_API_KEY"),
            model: profiled_env_or(p, "OPENAI_MODEL", "gpt-4.1-nano-2025-04-14"),
            base_url: profiled_env_or(p, "OPENAI_BASE_URL", "https://api.openai.com")
                .trim_end_matches('/')
                .to_string(),
            temperature: profiled_env_or(p, "LLM_TEMPERATURE", "0.7")
                .parse()
                .unwrap_or(0.7),
            max_tokens: profiled_env_u32(p, "LLM_MAX_TOKENS", 2048),
            max_tool_iterations: profiled_env_u32(p, "LLM_MAX_TOOL_ITERATIONS", 10) as usize,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    pub fn require_api_key(&self) -> Result<&str, CoreError> {
        self.api_key
            .as_deref()
            .ok_or(CoreError::MissingConfig("OPENAI_API_KEY"))
    }
}

// ── Profile document store ────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Local,
    S3,
    Gcs,
}

impl StoreBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            StoreBackend::Local => "local",
            StoreBackend::S3 => "s3",
            StoreBackend::Gcs => "gcs",
        }
    }

    fn parse(value: &str) -> Result<Self, CoreError> {
        match value.to_ascii_lowercase().as_str() {
            "local" | "fs" => Ok(StoreBackend::Local),
            "s3" | "aws" => Ok(StoreBackend::S3),
            "gcs" | "gcp" => Ok(StoreBackend::Gcs),
            other => Err(CoreError::InvalidConfig {
                key: "PROFILE_STORE",
                value: other.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub backend: StoreBackend,
    pub bucket: String,
    /// Key prefix inside the bucket (no trailing slash).
    pub prefix: String,
    /// Root directory for the local backend.
    pub local_dir: PathBuf,
    pub aws_region: String,
    pub aws_access_key_id: Option<String>,
    pub aws_secret_access_key: Option<String>,
    pub aws_endpoint_url: Option<String>,
    pub gcs_service_account_path: Option<String>,
}

impl StorageConfig {
    fn from_env_profiled(p: &str) -> Self {
        let raw_backend = profiled_env_or(p, "PROFILE_STORE", "local");
        let backend = StoreBackend::parse(&raw_backend).unwrap_or_else(|e| {
            tracing::warn!("{}; falling back to local profile store", e);
            StoreBackend::Local
        });
        Self {
            backend,
            bucket: profiled_env_or(p, "PROFILE_BUCKET", "ask-mammoth-bucket"),
            prefix: profiled_env_or(p, "PROFILE_PREFIX", "")
                .trim_matches('/')
                .to_string(),
            local_dir: PathBuf::from(profiled_env_or(p, "PROFILE_DIR", "profiles")),
            aws_region: profiled_env_or(p, "AWS_REGION", "us-east-1"),
            aws_access_key_id: profiled_env_opt(p, "AWS_ACCESS_KEY_ID"),
            aws_secret_access_key: profiled_env_opt(p, "AWS_SECRET_ACCESS_KEY"),
            aws_endpoint_url: profiled_env_opt(p, "AWS_ENDPOINT_URL"),
            gcs_service_account_path: profiled_env_opt(p, "GOOGLE_SERVICE_ACCOUNT"),
        }
    }
}

// ── Auth (single shared secret) ───────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    pub access_token: Option<String>,
    pub session_ttl_secs: u64,
    /// Mark the session cookie `Secure` (set behind TLS).
    pub secure_cookie: bool,
}

impl AuthConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            access_token: profiled_env_opt(p, "ACCESS_TOKEN"),
            session_ttl_secs: profiled_env_u64(p, "SESSION_TTL_SECS", 86_400),
            secure_cookie: profiled_env_or(p, "SECURE_COOKIE", "false") == "true",
        }
    }
}

// ── Relay ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelayConfig {
    pub prompt_path: PathBuf,
    /// Artificial delay between forwarded chunks (0 disables).
    pub chunk_delay_ms: u64,
}

impl RelayConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            prompt_path: PathBuf::from(profiled_env_or(p, "ORACLE_PROMPT_PATH", "oracle-prompt.md")),
            chunk_delay_ms: profiled_env_u64(p, "RELAY_CHUNK_DELAY_MS", 0),
        }
    }
}
