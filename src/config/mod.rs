#[cfg(feature = "cli")]
pub mod cli;
pub mod env;
pub mod toml_config;

use crate::adapters::github::DEFAULT_API_BASE_URL;
use crate::core::applier::DEFAULT_CONCURRENT_REQUESTS;
use crate::core::ConfigProvider;
use crate::utils::error::Result;
use crate::utils::validation::{validate_range, validate_url, Validate};
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[cfg(feature = "cli")]
pub use cli::CliConfig;
pub use env::{credentials_from_lookup, load_credentials, TOKEN_ENV_VAR};
pub use toml_config::FileConfig;

pub const DEFAULT_COOLDOWN_SECONDS: u64 = 10;
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 30;
pub const DEFAULT_MAX_RETRIES: u32 = 2;
pub const DEFAULT_RETRY_DELAY_MS: u64 = 500;

/// Fully resolved settings: defaults, then config file, then command line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    pub api_base_url: String,
    pub concurrent_requests: usize,
    pub timeout_seconds: u64,
    pub max_retries: u32,
    pub retry_delay_ms: u64,
    pub degrade_on_error: bool,
    pub apply: bool,
    pub cooldown_seconds: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            concurrent_requests: DEFAULT_CONCURRENT_REQUESTS,
            timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
            max_retries: DEFAULT_MAX_RETRIES,
            retry_delay_ms: DEFAULT_RETRY_DELAY_MS,
            degrade_on_error: false,
            apply: false,
            cooldown_seconds: DEFAULT_COOLDOWN_SECONDS,
        }
    }
}

impl Settings {
    pub fn cooldown(&self) -> Duration {
        Duration::from_secs(self.cooldown_seconds)
    }
}

impl ConfigProvider for Settings {
    fn api_base_url(&self) -> &str {
        &self.api_base_url
    }

    fn concurrent_requests(&self) -> usize {
        self.concurrent_requests
    }

    fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    fn max_retries(&self) -> u32 {
        self.max_retries
    }

    fn retry_base_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    fn degrade_on_error(&self) -> bool {
        self.degrade_on_error
    }
}

impl Validate for Settings {
    fn validate(&self) -> Result<()> {
        validate_url("api_base_url", &self.api_base_url)?;
        validate_range("concurrent_requests", self.concurrent_requests, 1, 32)?;
        validate_range("timeout_seconds", self.timeout_seconds, 1, 300)?;
        validate_range("max_retries", self.max_retries, 0, 10)?;
        validate_range("retry_delay_ms", self.retry_delay_ms, 0, 60_000)?;
        validate_range("cooldown_seconds", self.cooldown_seconds, 0, 3_600)?;

        if self.apply && self.degrade_on_error {
            tracing::warn!("⚠️ degrade_on_error is set; runs with a failed collection will not apply");
        }

        tracing::debug!("✅ Configuration validation passed");
        Ok(())
    }
}
