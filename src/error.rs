use std::io;
use thiserror::Error;

/// Custom error type for the telemetry core
#[derive(Error, Debug)]
pub enum DevexError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Provider unavailable: {0}")]
    ProviderUnavailable(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Persistence error: {0}")]
    Persistence(#[from] rusqlite::Error),

    #[error("Port probe failed: {0}")]
    Probe(String),

    #[error("Termination failed: {0}")]
    Termination(String),

    #[error("Lifecycle error: {0}")]
    Lifecycle(String),
}

/// Result type alias for the telemetry core
pub type Result<T> = std::result::Result<T, DevexError>;

impl DevexError {
    /// Create a config error
    pub fn config<S: Into<String>>(msg: S) -> Self {
        DevexError::Config(msg.into())
    }

    /// Create a provider-unavailable error
    pub fn provider_unavailable<S: Into<String>>(msg: S) -> Self {
        DevexError::ProviderUnavailable(msg.into())
    }

    /// Create a parse error
    pub fn parse<S: Into<String>>(msg: S) -> Self {
        DevexError::Parse(msg.into())
    }

    pub fn probe<S: Into<String>>(msg: S) -> Self {
        DevexError::Probe(msg.into())
    }

    pub fn termination<S: Into<String>>(msg: S) -> Self {
        DevexError::Termination(msg.into())
    }

    pub fn lifecycle<S: Into<String>>(msg: S) -> Self {
        DevexError::Lifecycle(msg.into())
    }

    /// True for the errors a sampling tick skips over rather than reports
    pub fn is_skippable_sample(&self) -> bool {
        matches!(
            self,
            DevexError::ProviderUnavailable(_) | DevexError::Parse(_)
        )
    }
}
