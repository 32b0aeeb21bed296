//! Relay configuration types.
//!
//! `RelayConfig` represents the top-level `sera.toml`. Every field has a
//! default so an empty (or missing) file yields a runnable configuration.
//! Secrets (the upstream API key) are never part of this file; they come
//! from the environment.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::llm::GenerationConfig;

/// Top-level configuration for the relay.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RelayConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub upstream: UpstreamConfig,
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default)]
    pub persona: PersonaConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub session: SessionCookieConfig,
    #[serde(default)]
    pub cors: CorsConfig,
    #[serde(default)]
    pub web: WebConfig,
}

/// Listener address.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    9000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Upstream model endpoint and sampling settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamConfig {
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default)]
    pub generation: GenerationConfig,
}

fn default_model() -> String {
    "gemini-2.0-flash".to_string()
}

fn default_base_url() -> String {
    "https://generativelanguage.googleapis.com".to_string()
}

fn default_timeout_secs() -> u64 {
    120
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            generation: GenerationConfig::default(),
        }
    }
}

/// Bounded linear-backoff retry around the upstream call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Total upstream attempts per exchange (not additional retries).
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Base delay; the wait after attempt `n` (0-based) is `base * (n + 1)`.
    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,
}

fn default_max_attempts() -> u32 {
    5
}

fn default_initial_delay_ms() -> u64 {
    1000
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_delay_ms: default_initial_delay_ms(),
        }
    }
}

/// Persona and clock settings for the system instruction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonaConfig {
    #[serde(default = "default_persona_name")]
    pub name: String,
    /// Inline persona/style rules. Takes precedence over `instructions_path`.
    #[serde(default)]
    pub instructions: Option<String>,
    /// File holding persona/style rules.
    #[serde(default)]
    pub instructions_path: Option<PathBuf>,
    /// IANA timezone used for the "current time" line.
    #[serde(default = "default_timezone")]
    pub timezone: String,
    /// Short label appended to the timestamp (e.g. "WIB").
    #[serde(default = "default_timezone_label")]
    pub timezone_label: String,
    /// Locale for day and month names (e.g. "id_ID", "en_US").
    #[serde(default = "default_locale")]
    pub locale: String,
}

fn default_persona_name() -> String {
    "Sera".to_string()
}

fn default_timezone() -> String {
    "Asia/Jakarta".to_string()
}

fn default_timezone_label() -> String {
    "WIB".to_string()
}

fn default_locale() -> String {
    "en_US".to_string()
}

impl Default for PersonaConfig {
    fn default() -> Self {
        Self {
            name: default_persona_name(),
            instructions: None,
            instructions_path: None,
            timezone: default_timezone(),
            timezone_label: default_timezone_label(),
            locale: default_locale(),
        }
    }
}

/// In-process conversation store bounds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Maximum turns retained per user; 0 disables the cap.
    #[serde(default = "default_max_turns")]
    pub max_turns: usize,
    /// Idle time after which a user's history is evicted; 0 disables eviction.
    #[serde(default = "default_idle_ttl_secs")]
    pub idle_ttl_secs: u64,
    /// How often the eviction sweep runs.
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
}

fn default_max_turns() -> usize {
    40
}

fn default_idle_ttl_secs() -> u64 {
    30 * 60
}

fn default_sweep_interval_secs() -> u64 {
    60
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            max_turns: default_max_turns(),
            idle_ttl_secs: default_idle_ttl_secs(),
            sweep_interval_secs: default_sweep_interval_secs(),
        }
    }
}

/// Attributes of the identity cookie issued to new callers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionCookieConfig {
    #[serde(default = "default_cookie_name")]
    pub name: String,
    #[serde(default = "default_cookie_path")]
    pub path: String,
    #[serde(default = "default_cookie_max_age_secs")]
    pub max_age_secs: i64,
    #[serde(default = "default_true")]
    pub secure: bool,
    #[serde(default = "default_true")]
    pub http_only: bool,
    /// Emit `SameSite=None` so cross-site frontends can send the cookie back.
    #[serde(default = "default_true")]
    pub cross_site: bool,
}

fn default_cookie_name() -> String {
    "user_id".to_string()
}

fn default_cookie_path() -> String {
    "/chat".to_string()
}

fn default_cookie_max_age_secs() -> i64 {
    600
}

fn default_true() -> bool {
    true
}

impl Default for SessionCookieConfig {
    fn default() -> Self {
        Self {
            name: default_cookie_name(),
            path: default_cookie_path(),
            max_age_secs: default_cookie_max_age_secs(),
            secure: true,
            http_only: true,
            cross_site: true,
        }
    }
}

/// Cross-origin allow-list. Credentialed requests are permitted from these origins.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    #[serde(default = "default_allowed_origins")]
    pub allowed_origins: Vec<String>,
}

fn default_allowed_origins() -> Vec<String> {
    vec![
        "https://rey.is-great.net".to_string(),
        "https://reyhkm.pages.dev".to_string(),
        "https://rey.wuaze.com".to_string(),
        "https://aisera.pages.dev".to_string(),
    ]
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: default_allowed_origins(),
        }
    }
}

/// Landing page location.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebConfig {
    #[serde(default = "default_index_path")]
    pub index_path: PathBuf,
}

fn default_index_path() -> PathBuf {
    PathBuf::from("index.html")
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            index_path: default_index_path(),
        }
    }
}
