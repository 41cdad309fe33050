use std::path::PathBuf;

use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
///
/// Backend credentials are optional at startup: a missing key only fails the
/// calls that need it, with an authentication error for that call.
#[derive(Debug, Clone)]
pub struct Config {
    pub data_dir: PathBuf,
    pub port: u16,
    pub rust_log: String,
    pub llama_api_key: Option<String>,
    pub llama_api_url: String,
    pub gemini_api_key: Option<String>,
    pub gemini_api_url: String,
    pub llm_timeout_secs: u64,
    pub calendly_api_key: Option<String>,
    pub calendly_api_url: String,
    pub scheduling_link_ttl_hours: u64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            data_dir: PathBuf::from(env_or("DATA_DIR", "/tmp/data")),
            port: parse_env("PORT", 8080)?,
            rust_log: env_or("RUST_LOG", "info"),
            llama_api_key: optional_env("LLAMA_API_KEY"),
            llama_api_url: env_or(
                "LLAMA_API_URL",
                "https://traip13.tgptinf.ucsd.edu/v1/chat/completions",
            ),
            gemini_api_key: optional_env("GEMINI_API_KEY"),
            gemini_api_url: env_or(
                "GEMINI_API_URL",
                "https://generativelanguage.googleapis.com/v1beta/models",
            ),
            llm_timeout_secs: parse_env("LLM_TIMEOUT_SECS", 120)?,
            calendly_api_key: optional_env("CALENDLY_API_KEY"),
            calendly_api_url: env_or("CALENDLY_API_URL", "https://api.calendly.com"),
            scheduling_link_ttl_hours: parse_env("SCHEDULING_LINK_TTL_HOURS", 12)?,
        })
    }

    /// Path of the context document inside the data directory.
    pub fn context_path(&self) -> PathBuf {
        self.data_dir.join("context.json")
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Empty values count as unset so a blank line in `.env` does not look like a credential.
fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("Environment variable '{key}' has an invalid value: {raw}")),
        Err(_) => Ok(default),
    }
}
