//! Global configuration parsing, validation, and credential loading.

use std::env;
use std::fs;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use tracing::warn;

use crate::{AppError, Result};

/// Keychain service name under which credentials are stored.
pub const KEYRING_SERVICE: &str = "hablemos";

/// Connection settings for the OpenAI-compatible language model endpoint.
///
/// The API key is loaded at runtime via OS keychain or environment variable,
/// never from the TOML config file.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub struct LlmConfig {
    /// Base URL up to and including the API version, e.g. `https://api.openai.com/v1`.
    #[serde(default = "default_llm_base_url")]
    pub base_url: String,
    /// Model identifier sent with every request.
    pub model: String,
    /// Sampling temperature.
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// Upper bound on generated tokens per request.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// Per-request HTTP timeout.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
    /// Number of prior chat messages forwarded as conversation context.
    #[serde(default = "default_history_limit")]
    pub history_limit: u32,
    /// Bearer token (populated at runtime).
    #[serde(skip)]
    pub api_key: Option<String>,
}

impl LlmConfig {
    /// Request timeout as a [`Duration`].
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }
}

fn default_llm_base_url() -> String {
    "https://api.openai.com/v1".into()
}

fn default_temperature() -> f32 {
    0.7
}

fn default_max_tokens() -> u32 {
    1024
}

fn default_request_timeout() -> u64 {
    60
}

fn default_history_limit() -> u32 {
    20
}

/// Tuning knobs for conjugation drill selection, grading and unlocking.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub struct DrillConfig {
    /// Number of drills generated for a new session.
    #[serde(default = "default_session_size")]
    pub session_size: u32,
    /// Number of rules a session draws from.
    #[serde(default = "default_rules_per_session")]
    pub rules_per_session: u32,
    /// Accuracy below which a rule counts as weak.
    #[serde(default = "default_weak_threshold")]
    pub weak_accuracy_threshold: f64,
    /// Accuracy every unlocked rule must reach before the next rule unlocks.
    #[serde(default = "default_unlock_threshold")]
    pub unlock_accuracy_threshold: f64,
    /// Attempts required before a rule's accuracy is trusted.
    #[serde(default = "default_min_attempts")]
    pub min_attempts: u32,
    /// Maximum weak rules picked per session.
    #[serde(default = "default_weak_limit")]
    pub weak_limit: u32,
    /// Maximum recently practiced rules picked per session.
    #[serde(default = "default_recent_limit")]
    pub recent_limit: u32,
    /// Maximum most-recently-unlocked rules picked per session.
    #[serde(default = "default_newest_limit")]
    pub newest_limit: u32,
    /// Whether answers differing only in accents are graded correct.
    #[serde(default)]
    pub accept_missing_accents: bool,
    /// Minutes after which an unfinished session is marked abandoned.
    #[serde(default = "default_stale_session_minutes")]
    pub stale_session_minutes: u32,
}

impl Default for DrillConfig {
    fn default() -> Self {
        Self {
            session_size: default_session_size(),
            rules_per_session: default_rules_per_session(),
            weak_accuracy_threshold: default_weak_threshold(),
            unlock_accuracy_threshold: default_unlock_threshold(),
            min_attempts: default_min_attempts(),
            weak_limit: default_weak_limit(),
            recent_limit: default_recent_limit(),
            newest_limit: default_newest_limit(),
            accept_missing_accents: false,
            stale_session_minutes: default_stale_session_minutes(),
        }
    }
}

fn default_session_size() -> u32 {
    10
}

fn default_rules_per_session() -> u32 {
    4
}

fn default_weak_threshold() -> f64 {
    0.7
}

fn default_unlock_threshold() -> f64 {
    0.8
}

fn default_min_attempts() -> u32 {
    5
}

fn default_weak_limit() -> u32 {
    2
}

fn default_recent_limit() -> u32 {
    1
}

fn default_newest_limit() -> u32 {
    2
}

fn default_stale_session_minutes() -> u32 {
    120
}

fn default_bind_address() -> IpAddr {
    IpAddr::V4(Ipv4Addr::LOCALHOST)
}

fn default_http_port() -> u16 {
    3000
}

fn default_database_path() -> PathBuf {
    PathBuf::from("data/hablemos.db")
}

fn default_upload_dir() -> PathBuf {
    PathBuf::from("data/books")
}

fn default_max_upload_bytes() -> u64 {
    50 * 1024 * 1024
}

fn default_max_journal_chars() -> usize {
    10_000
}

/// Global configuration parsed from `config.toml`.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub struct GlobalConfig {
    /// Interface the HTTP server binds to.
    #[serde(default = "default_bind_address")]
    pub bind_address: IpAddr,
    /// HTTP port for the JSON API.
    #[serde(default = "default_http_port")]
    pub http_port: u16,
    /// `SQLite` database file.
    #[serde(default = "default_database_path")]
    pub database_path: PathBuf,
    /// Directory holding uploaded e-book files.
    #[serde(default = "default_upload_dir")]
    pub upload_dir: PathBuf,
    /// Largest accepted e-book upload.
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: u64,
    /// Longest accepted journal entry, in characters.
    #[serde(default = "default_max_journal_chars")]
    pub max_journal_chars: usize,
    /// Language model endpoint settings.
    pub llm: LlmConfig,
    /// Conjugation drill tuning.
    #[serde(default)]
    pub drills: DrillConfig,
}

impl GlobalConfig {
    /// Load and validate configuration from a TOML file path.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if the file cannot be read or contains
    /// invalid TOML, or if validation fails.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .map_err(|err| AppError::Config(format!("failed to read config: {err}")))?;
        Self::from_toml_str(&raw)
    }

    /// Parse configuration from a TOML string and validate it.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if parsing or validation fails.
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Load the language model API key from OS keychain with env-var fallback.
    ///
    /// A missing key is not an error: local OpenAI-compatible servers
    /// usually run without authentication.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if the keychain task panics.
    pub async fn load_credentials(&mut self) -> Result<()> {
        self.llm.api_key = load_credential("llm_api_key", "LLM_API_KEY").await?;
        if self.llm.api_key.is_none() {
            warn!("no llm api key configured; requests are sent unauthenticated");
        }
        Ok(())
    }

    /// Socket address the HTTP server listens on.
    #[must_use]
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_address, self.http_port)
    }

    fn validate(&self) -> Result<()> {
        if self.llm.model.trim().is_empty() {
            return Err(AppError::Config("llm.model must not be empty".into()));
        }
        if !self.llm.base_url.starts_with("http://") && !self.llm.base_url.starts_with("https://")
        {
            return Err(AppError::Config(
                "llm.base_url must be an http(s) url".into(),
            ));
        }
        if self.llm.history_limit == 0 {
            return Err(AppError::Config(
                "llm.history_limit must be greater than zero".into(),
            ));
        }
        if self.max_upload_bytes == 0 {
            return Err(AppError::Config(
                "max_upload_bytes must be greater than zero".into(),
            ));
        }

        let drills = &self.drills;
        if drills.session_size == 0 || drills.rules_per_session == 0 {
            return Err(AppError::Config(
                "drills.session_size and drills.rules_per_session must be greater than zero"
                    .into(),
            ));
        }
        for (name, value) in [
            ("weak_accuracy_threshold", drills.weak_accuracy_threshold),
            ("unlock_accuracy_threshold", drills.unlock_accuracy_threshold),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(AppError::Config(format!(
                    "drills.{name} must lie between 0 and 1"
                )));
            }
        }

        Ok(())
    }
}

/// Load a single credential from OS keychain with env-var fallback.
async fn load_credential(keyring_key: &str, env_key: &str) -> Result<Option<String>> {
    let key = keyring_key.to_owned();

    // keyring is synchronous I/O.
    let keychain_result = tokio::task::spawn_blocking(move || {
        keyring::Entry::new(KEYRING_SERVICE, &key).and_then(|entry| entry.get_password())
    })
    .await
    .map_err(|err| AppError::Config(format!("keychain task panicked: {err}")))?;

    match keychain_result {
        Ok(value) if !value.is_empty() => return Ok(Some(value)),
        Ok(_) => {
            warn!(key = keyring_key, "keychain entry is empty, trying env var");
        }
        Err(err) => {
            warn!(
                key = keyring_key,
                ?err,
                "keychain lookup failed, trying env var"
            );
        }
    }

    Ok(env::var(env_key).ok().filter(|value| !value.is_empty()))
}
