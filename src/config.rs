use std::env;
use std::fmt::{self, Debug};

use thiserror::Error;

pub const DEFAULT_MODEL: &str = "llama3-8b-8192";
pub const DEFAULT_BASE_URL: &str = "https://api.groq.com/openai/v1";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("GROQ_API_KEY is not set; export it before launching")]
    MissingApiKey,
}

/// Runtime configuration, read once from the environment at startup.
#[derive(Clone)]
pub struct Config {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
}

impl Config {
    /// Reads `GROQ_API_KEY` (required), `GROQ_MODEL` and `GROQ_BASE_URL`
    /// (optional overrides) from the environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_key = env::var("GROQ_API_KEY")
            .ok()
            .filter(|key| !key.trim().is_empty())
            .ok_or(ConfigError::MissingApiKey)?;

        Ok(Self {
            api_key,
            model: env::var("GROQ_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string()),
            base_url: env::var("GROQ_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string()),
        })
    }

    pub fn with_api_key(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }
}

impl Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .finish()
    }
}
