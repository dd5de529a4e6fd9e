use crate::config::Settings;
use crate::utils::error::{Result, SyncError};
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Optional `--config` file. Every key may be omitted.
///
/// ```toml
/// [api]
/// base_url = "${GITHUB_API_URL}"
/// timeout_seconds = 20
///
/// [collect]
/// max_retries = 3
/// retry_delay_ms = 250
/// degrade_on_error = false
///
/// [apply]
/// enabled = true
/// concurrent_requests = 4
///
/// [refresh]
/// cooldown_seconds = 30
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub api: Option<ApiSection>,
    pub collect: Option<CollectSection>,
    pub apply: Option<ApplySection>,
    pub refresh: Option<RefreshSection>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ApiSection {
    pub base_url: Option<String>,
    pub timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CollectSection {
    pub max_retries: Option<u32>,
    pub retry_delay_ms: Option<u64>,
    pub degrade_on_error: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ApplySection {
    pub enabled: Option<bool>,
    pub concurrent_requests: Option<usize>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RefreshSection {
    pub cooldown_seconds: Option<u64>,
}

impl FileConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        tracing::debug!("Loaded config file {}", path.as_ref().display());
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed = substitute_env_vars(content, |name| std::env::var(name).ok())?;
        Ok(toml::from_str(&processed)?)
    }

    /// Overlays every key present in the file onto `settings`.
    pub fn apply_to(&self, settings: &mut Settings) {
        if let Some(api) = &self.api {
            if let Some(base_url) = &api.base_url {
                settings.api_base_url = base_url.clone();
            }
            if let Some(timeout) = api.timeout_seconds {
                settings.timeout_seconds = timeout;
            }
        }

        if let Some(collect) = &self.collect {
            if let Some(retries) = collect.max_retries {
                settings.max_retries = retries;
            }
            if let Some(delay) = collect.retry_delay_ms {
                settings.retry_delay_ms = delay;
            }
            if let Some(degrade) = collect.degrade_on_error {
                settings.degrade_on_error = degrade;
            }
        }

        if let Some(apply) = &self.apply {
            if let Some(enabled) = apply.enabled {
                settings.apply = enabled;
            }
            if let Some(concurrent) = apply.concurrent_requests {
                settings.concurrent_requests = concurrent;
            }
        }

        if let Some(refresh) = &self.refresh {
            if let Some(cooldown) = refresh.cooldown_seconds {
                settings.cooldown_seconds = cooldown;
            }
        }
    }
}

/// Replaces `${NAME}` with the looked-up value; unknown names are left as-is.
fn substitute_env_vars<F>(content: &str, lookup: F) -> Result<String>
where
    F: Fn(&str) -> Option<String>,
{
    let re = Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}").map_err(|e| SyncError::Configuration {
        message: format!("invalid substitution pattern: {}", e),
    })?;

    let result = re.replace_all(content, |caps: &Captures| {
        let name = &caps[1];
        lookup(name).unwrap_or_else(|| format!("${{{}}}", name))
    });

    Ok(result.into_owned())
}
