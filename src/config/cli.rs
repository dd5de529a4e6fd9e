use crate::config::toml_config::FileConfig;
use crate::config::Settings;
use crate::utils::error::Result;
use clap::Parser;
use std::path::PathBuf;

/// Tunables are optional here so that unset flags fall through to the
/// config file and then to the defaults.
#[derive(Debug, Clone, Parser)]
#[command(name = "follow-sync")]
#[command(about = "Audit and reconcile your GitHub followers and following")]
#[command(version)]
pub struct CliConfig {
    /// GitHub username; prompted for when omitted
    #[arg(long, short)]
    pub username: Option<String>,

    /// API base URL (GitHub Enterprise: https://host/api/v3)
    #[arg(long)]
    pub api_base_url: Option<String>,

    /// Unfollow non-mutual accounts and follow back followers
    #[arg(long)]
    pub apply: bool,

    /// Run a single pass and exit instead of prompting for refresh
    #[arg(long)]
    pub once: bool,

    #[arg(long, help = "Seconds to wait before a refresh [default: 10]")]
    pub cooldown_seconds: Option<u64>,

    #[arg(long, help = "Maximum mutations in flight at once [default: 4]")]
    pub concurrent_requests: Option<usize>,

    #[arg(long, help = "Per-request timeout in seconds [default: 30]")]
    pub timeout_seconds: Option<u64>,

    #[arg(long, help = "Retries for a failed page fetch [default: 2]")]
    pub max_retries: Option<u32>,

    #[arg(long, help = "Base retry backoff in milliseconds [default: 500]")]
    pub retry_delay_ms: Option<u64>,

    /// Treat a failed collection as empty instead of failing the run (never applies)
    #[arg(long)]
    pub degrade_on_error: bool,

    /// TOML config file
    #[arg(long, short)]
    pub config: Option<PathBuf>,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Log CPU and memory usage per phase")]
    pub monitor: bool,

    #[arg(long, help = "Emit logs as JSON lines")]
    pub log_json: bool,
}

impl CliConfig {
    pub fn resolve(&self) -> Result<Settings> {
        let mut settings = Settings::default();

        if let Some(path) = &self.config {
            FileConfig::from_file(path)?.apply_to(&mut settings);
        }

        if let Some(url) = &self.api_base_url {
            settings.api_base_url = url.clone();
        }
        if let Some(cooldown) = self.cooldown_seconds {
            settings.cooldown_seconds = cooldown;
        }
        if let Some(concurrent) = self.concurrent_requests {
            settings.concurrent_requests = concurrent;
        }
        if let Some(timeout) = self.timeout_seconds {
            settings.timeout_seconds = timeout;
        }
        if let Some(retries) = self.max_retries {
            settings.max_retries = retries;
        }
        if let Some(delay) = self.retry_delay_ms {
            settings.retry_delay_ms = delay;
        }
        if self.apply {
            settings.apply = true;
        }
        if self.degrade_on_error {
            settings.degrade_on_error = true;
        }

        Ok(settings)
    }
}
