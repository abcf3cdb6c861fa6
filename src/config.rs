use crate::llm::{GEMINI_API_BASE, GEMINI_MODEL};
use std::env;
use std::net::SocketAddr;

/// ---------------------------------------------------------------------------
/// Configuration Constants
/// ---------------------------------------------------------------------------

pub const GEMINI_API_KEY_ENV: &str = "GEMINI_API_KEY";

const DEFAULT_DATABASE_URL: &str = "sqlite://fittrack.db?mode=rwc";
const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8000";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
  #[error("Invalid value for {name}: '{value}'")]
  Invalid { name: String, value: String },
}

/// Process configuration, read once at startup.
///
/// The Gemini API key is not part of this struct; it is read at
/// call time through [`gemini_api_key`].
#[derive(Debug, Clone)]
pub struct AppConfig {
  pub database_url: String,
  pub bind_addr: SocketAddr,
  pub gemini_model: String,
  pub gemini_api_base: String,
}

fn var_or(name: &str, default: &str) -> String {
  env::var(name)
    .ok()
    .map(|v| v.trim().to_string())
    .filter(|v| !v.is_empty())
    .unwrap_or_else(|| default.to_string())
}

impl AppConfig {
  pub fn from_env() -> Result<Self, ConfigError> {
    let bind_raw = var_or("FITTRACK_BIND_ADDR", DEFAULT_BIND_ADDR);
    let bind_addr = bind_raw.parse().map_err(|_| ConfigError::Invalid {
      name: "FITTRACK_BIND_ADDR".into(),
      value: bind_raw.clone(),
    })?;

    Ok(Self {
      database_url: var_or("DATABASE_URL", DEFAULT_DATABASE_URL),
      bind_addr,
      gemini_model: var_or("GEMINI_MODEL", GEMINI_MODEL),
      gemini_api_base: var_or("GEMINI_API_BASE", GEMINI_API_BASE),
    })
  }
}

/// Current Gemini API key, if one is set and non-blank
pub fn gemini_api_key() -> Option<String> {
  env::var(GEMINI_API_KEY_ENV)
    .ok()
    .map(|k| k.trim().to_string())
    .filter(|k| !k.is_empty())
}
