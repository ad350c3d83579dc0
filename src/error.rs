use thiserror::Error;

/// Failures surfaced to the presentation layer. None of them are fatal:
/// an operation that returns one of these has left its state untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TourneyError {
    /// Bad user input: missing or negative scores, a draw where a decisive
    /// result is required, blank names.
    #[error("{0}")]
    Validation(String),

    /// A stage or lifecycle transition was attempted before its gate opened,
    /// or after it was already passed.
    #[error("{0}")]
    Precondition(String),

    #[error("{0} not found")]
    NotFound(String),

    /// Reading or writing the persisted state failed.
    #[error("storage: {0}")]
    Storage(String),
}

impl TourneyError {
    pub fn validation(msg: impl Into<String>) -> Self {
        TourneyError::Validation(msg.into())
    }

    pub fn precondition(msg: impl Into<String>) -> Self {
        TourneyError::Precondition(msg.into())
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        TourneyError::NotFound(what.into())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, TourneyError::NotFound(_))
    }
}

impl From<std::io::Error> for TourneyError {
    fn from(err: std::io::Error) -> Self {
        TourneyError::Storage(err.to_string())
    }
}

impl From<serde_json::Error> for TourneyError {
    fn from(err: serde_json::Error) -> Self {
        TourneyError::Storage(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, TourneyError>;
