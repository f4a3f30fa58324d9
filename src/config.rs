use serde::Deserialize;
use std::fmt;
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::constants;
use crate::error::{Result, ScraperError};
use crate::ingestion::backoff::RetryPolicy;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub openaq: OpenAqConfig,
    pub population: PopulationConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OpenAqConfig {
    pub base_url: String,
    pub page_size: u32,
    pub max_retries: u32,
    pub retry_delay_secs: u64,
    pub timeout_seconds: u64,
}

impl Default for OpenAqConfig {
    fn default() -> Self {
        Self {
            base_url: constants::OPENAQ_BASE_URL.to_string(),
            page_size: constants::DEFAULT_PAGE_SIZE,
            max_retries: constants::DEFAULT_MAX_RETRIES,
            retry_delay_secs: constants::DEFAULT_RETRY_DELAY_SECS,
            timeout_seconds: constants::DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl OpenAqConfig {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_retries, Duration::from_secs(self.retry_delay_secs))
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PopulationConfig {
    pub url: String,
}

impl Default for PopulationConfig {
    fn default() -> Self {
        Self {
            url: constants::POPULATION_PAGE_URL.to_string(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    ///
    /// With no explicit path, a missing `config.toml` falls back to the
    /// built-in defaults. An explicitly named file must exist.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let (config_path, required) = match path {
            Some(p) => (p, true),
            None => (Path::new(constants::DEFAULT_CONFIG_PATH), false),
        };

        if !required && !config_path.exists() {
            return Ok(Self::default());
        }

        let config_content = fs::read_to_string(config_path).map_err(|e| {
            ScraperError::Config(format!(
                "Failed to read config file '{}': {}",
                config_path.display(),
                e
            ))
        })?;

        Self::from_toml(&config_content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        if config.openaq.page_size == 0 {
            return Err(ScraperError::Config("openaq.page_size must be at least 1".into()));
        }
        Ok(config)
    }
}

/// Secret credential for the air-quality API. Never printed in full.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    /// Read the key from `OPENAQ_API_KEY`.
    pub fn from_env() -> Result<Self> {
        Self::from_value(std::env::var(constants::API_KEY_ENV).ok())
    }

    /// A missing or blank value is a configuration error, not an empty credential.
    pub fn from_value(value: Option<String>) -> Result<Self> {
        match value {
            Some(v) if !v.trim().is_empty() => Ok(Self(v.trim().to_string())),
            _ => Err(ScraperError::Config(format!(
                "{} is not set; export it or add it to .env",
                constants::API_KEY_ENV
            ))),
        }
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(***)")
    }
}
