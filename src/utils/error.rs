use crate::domain::model::CollectionKind;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("API request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Unexpected status {status} while fetching {kind} page {page}")]
    UnexpectedStatus {
        kind: CollectionKind,
        page: u32,
        status: u16,
    },

    #[error("Collecting {kind} failed: {source}")]
    Collection {
        kind: CollectionKind,
        #[source]
        source: Box<SyncError>,
    },

    /// More than one collection failed in the same run.
    #[error("{}", join_messages(.0))]
    Collections(Vec<SyncError>),

    #[error("Serialization error: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Missing configuration: {field}")]
    MissingConfig { field: String },

    #[error("Invalid value for {field} ({value}): {reason}")]
    InvalidConfigValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Run cancelled")]
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    RemoteApi,
    Configuration,
    Data,
    Interrupted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl SyncError {
    pub fn collection(kind: CollectionKind, source: SyncError) -> Self {
        SyncError::Collection {
            kind,
            source: Box::new(source),
        }
    }

    /// Groups collection failures; a single failure is returned as-is.
    pub fn collections(mut errors: Vec<SyncError>) -> Self {
        if errors.len() == 1 {
            if let Some(only) = errors.pop() {
                return only;
            }
        }
        SyncError::Collections(errors)
    }

    /// Which collections this error reports as failed.
    pub fn failed_kinds(&self) -> Vec<CollectionKind> {
        match self {
            SyncError::Collection { kind, .. } => vec![*kind],
            SyncError::Collections(errors) => {
                errors.iter().flat_map(|e| e.failed_kinds()).collect()
            }
            _ => Vec::new(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            SyncError::Collections(errors) => errors
                .first()
                .map(|e| e.category())
                .unwrap_or(ErrorCategory::RemoteApi),
            SyncError::Transport(_) => ErrorCategory::Network,
            SyncError::UnexpectedStatus { .. } => ErrorCategory::RemoteApi,
            SyncError::Collection { source, .. } => source.category(),
            SyncError::Decode(_) => ErrorCategory::Data,
            SyncError::Io(_) => ErrorCategory::Data,
            SyncError::TomlParse(_)
            | SyncError::Configuration { .. }
            | SyncError::MissingConfig { .. }
            | SyncError::InvalidConfigValue { .. } => ErrorCategory::Configuration,
            SyncError::Cancelled => ErrorCategory::Interrupted,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        if let SyncError::Collections(errors) = self {
            return errors
                .iter()
                .map(|e| e.severity())
                .max()
                .unwrap_or(ErrorSeverity::High);
        }
        match self.category() {
            ErrorCategory::Interrupted => ErrorSeverity::Low,
            ErrorCategory::Network => ErrorSeverity::Medium,
            ErrorCategory::RemoteApi | ErrorCategory::Data => ErrorSeverity::High,
            ErrorCategory::Configuration => ErrorSeverity::Critical,
        }
    }

    /// Worth retrying: connection-level failures, throttling, server errors.
    pub fn is_transient(&self) -> bool {
        match self {
            SyncError::Transport(e) => !e.is_decode() && !e.is_builder(),
            SyncError::UnexpectedStatus { status, .. } => *status == 429 || *status >= 500,
            SyncError::Collection { source, .. } => source.is_transient(),
            SyncError::Collections(errors) => {
                !errors.is_empty() && errors.iter().all(|e| e.is_transient())
            }
            SyncError::Io(e) => matches!(
                e.kind(),
                std::io::ErrorKind::ConnectionReset
                    | std::io::ErrorKind::ConnectionAborted
                    | std::io::ErrorKind::TimedOut
                    | std::io::ErrorKind::Interrupted
            ),
            _ => false,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            SyncError::Transport(_) => "Check your network connection and try again",
            SyncError::UnexpectedStatus { status: 401, .. } => {
                "The token was rejected; generate a new GITHUB_TOKEN"
            }
            SyncError::UnexpectedStatus { status: 403, .. }
            | SyncError::UnexpectedStatus { status: 429, .. } => {
                "The API rate limit was probably hit; wait a few minutes before refreshing"
            }
            SyncError::UnexpectedStatus { status: 404, .. } => "Check that the username exists",
            SyncError::UnexpectedStatus { .. } => "Retry later; the API returned an error",
            SyncError::Collection { source, .. } => source.recovery_suggestion(),
            SyncError::Collections(errors) => errors
                .first()
                .map(|e| e.recovery_suggestion())
                .unwrap_or("Retry later; the API returned an error"),
            SyncError::Decode(_) => "The API returned an unexpected payload; check --api-base-url",
            SyncError::Io(_) => "Check file permissions and paths",
            SyncError::TomlParse(_) => "Fix the syntax of the configuration file",
            SyncError::Configuration { .. }
            | SyncError::MissingConfig { .. }
            | SyncError::InvalidConfigValue { .. } => {
                "Review the command line flags, config file and GITHUB_TOKEN"
            }
            SyncError::Cancelled => "Run again when ready",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            SyncError::Collection { kind, source } => {
                format!("Could not fetch your {}: {}", kind, source.user_friendly_message())
            }
            SyncError::Collections(errors) => errors
                .iter()
                .map(|e| e.user_friendly_message())
                .collect::<Vec<_>>()
                .join("\n"),
            SyncError::Transport(e) if e.is_timeout() => "The request timed out".to_string(),
            SyncError::Transport(_) => "Could not reach the API".to_string(),
            SyncError::MissingConfig { field } => format!("{} is not set", field),
            other => other.to_string(),
        }
    }
}

fn join_messages(errors: &[SyncError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

pub type Result<T> = std::result::Result<T, SyncError>;
