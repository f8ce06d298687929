//! Error types shared across the application.

use std::fmt::{Display, Formatter};

/// Shared application result type.
pub type Result<T> = std::result::Result<T, AppError>;

/// Application error enumeration covering all domain failure modes.
#[derive(Debug)]
pub enum AppError {
    /// Configuration parsing or validation failure.
    Config(String),
    /// Persistence failure when interacting with `SQLite`.
    Db(String),
    /// Slack API or Socket Mode failure.
    Slack(String),
    /// `PagerDuty` REST API failure.
    PagerDuty(String),
    /// Jira REST API failure.
    Jira(String),
    /// A command argument was well-counted but malformed.
    InvalidInput(String),
    /// Requested entity does not exist.
    NotFound(String),
    /// File-system or I/O operation failure.
    Io(String),
}

impl AppError {
    /// The bare message without the category prefix.
    ///
    /// This is what users see in chat; the prefixed [`Display`] form is
    /// reserved for logs.
    #[must_use]
    pub fn user_message(&self) -> &str {
        match self {
            Self::Config(msg)
            | Self::Db(msg)
            | Self::Slack(msg)
            | Self::PagerDuty(msg)
            | Self::Jira(msg)
            | Self::InvalidInput(msg)
            | Self::NotFound(msg)
            | Self::Io(msg) => msg,
        }
    }
}

impl Display for AppError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(msg) => write!(f, "config: {msg}"),
            Self::Db(msg) => write!(f, "db: {msg}"),
            Self::Slack(msg) => write!(f, "slack: {msg}"),
            Self::PagerDuty(msg) => write!(f, "pagerduty: {msg}"),
            Self::Jira(msg) => write!(f, "jira: {msg}"),
            Self::InvalidInput(msg) => write!(f, "invalid input: {msg}"),
            Self::NotFound(msg) => write!(f, "not found: {msg}"),
            Self::Io(msg) => write!(f, "io: {msg}"),
        }
    }
}

impl std::error::Error for AppError {}

impl From<toml::de::Error> for AppError {
    fn from(err: toml::de::Error) -> Self {
        Self::Config(format!("invalid config: {err}"))
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        Self::Db(err.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}
