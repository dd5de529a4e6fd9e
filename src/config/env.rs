use crate::domain::model::Credentials;
use crate::utils::error::{Result, SyncError};
use crate::utils::validation::validate_non_empty_string;

pub const TOKEN_ENV_VAR: &str = "GITHUB_TOKEN";

/// Reads the API token from the environment, loading `.env` first if present.
pub fn load_credentials(identity: &str) -> Result<Credentials> {
    if let Ok(path) = dotenvy::dotenv() {
        tracing::debug!("Loaded environment from {}", path.display());
    }
    credentials_from_lookup(identity, |name| std::env::var(name).ok())
}

/// Builds credentials from an arbitrary variable lookup.
pub fn credentials_from_lookup<F>(identity: &str, lookup: F) -> Result<Credentials>
where
    F: Fn(&str) -> Option<String>,
{
    validate_non_empty_string("username", identity)?;

    let token = lookup(TOKEN_ENV_VAR)
        .filter(|token| !token.trim().is_empty())
        .ok_or_else(|| SyncError::MissingConfig {
            field: TOKEN_ENV_VAR.to_string(),
        })?;

    Ok(Credentials::new(identity.trim(), token.trim()))
}
