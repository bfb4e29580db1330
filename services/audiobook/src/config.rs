//! services/audiobook/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use audiobook_core::DEFAULT_MAX_CHUNK_LEN;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub log_level: Level,
    pub openai_api_key: Option<String>,
    pub tts_model: String,
    pub tts_voice: String,
    pub max_chunk_len: usize,
    pub audio_cache_dir: PathBuf,
    pub session_ttl: Duration,
    pub session_capacity: usize,
    pub synthesis_concurrency: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: Level::INFO,
            openai_api_key: None,
            tts_model: "tts-1".to_string(),
            tts_voice: "alloy".to_string(),
            max_chunk_len: DEFAULT_MAX_CHUNK_LEN,
            audio_cache_dir: PathBuf::from("./audio_cache"),
            session_ttl: Duration::from_secs(60 * 60),
            session_capacity: 64,
            synthesis_concurrency: 4,
        }
    }
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination.
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }
        let defaults = Self::default();

        let log_level_str = std::env::var("RUST_LOG").unwrap_or_else(|_| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        // --- Load API Keys (as optional) ---
        let openai_api_key = std::env::var("OPENAI_API_KEY").ok();

        // --- Load Adapter-specific Settings ---
        let tts_model = std::env::var("TTS_MODEL").unwrap_or(defaults.tts_model);
        let tts_voice = std::env::var("TTS_VOICE").unwrap_or(defaults.tts_voice);

        // --- Load Pipeline Settings ---
        let max_chunk_len = parse_var("MAX_CHUNK_LEN", defaults.max_chunk_len)?;
        if max_chunk_len == 0 {
            return Err(ConfigError::InvalidValue(
                "MAX_CHUNK_LEN".to_string(),
                "must be greater than zero".to_string(),
            ));
        }
        let audio_cache_dir = std::env::var("AUDIO_CACHE_DIR")
            .map(PathBuf::from)
            .unwrap_or(defaults.audio_cache_dir);
        let session_ttl = Duration::from_secs(parse_var(
            "SESSION_TTL_SECS",
            defaults.session_ttl.as_secs(),
        )?);
        let session_capacity = parse_var("SESSION_CAPACITY", defaults.session_capacity)?;
        let synthesis_concurrency =
            parse_var("SYNTHESIS_CONCURRENCY", defaults.synthesis_concurrency)?.max(1);

        Ok(Self {
            log_level,
            openai_api_key,
            tts_model,
            tts_voice,
            max_chunk_len,
            audio_cache_dir,
            session_ttl,
            session_capacity,
            synthesis_concurrency,
        })
    }

    /// The OpenAI key, which only the real speech adapter needs.
    pub fn require_openai_api_key(&self) -> Result<&str, ConfigError> {
        self.openai_api_key
            .as_deref()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingVar("OPENAI_API_KEY".to_string()))
    }
}

/// Reads `name` and parses it, falling back to `default` when it is unset.
fn parse_var<T>(name: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidValue(name.to_string(), e.to_string())),
        Err(_) => Ok(default),
    }
}
