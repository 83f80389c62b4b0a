use std::time::Duration;
use thiserror::Error;

/// Errors surfaced by link retrieval and search.
#[derive(Debug, Error)]
pub enum RaceError {
    /// The provider could not be reached or refused the request.
    #[error("link provider unavailable: {0}")]
    ProviderUnavailable(String),

    /// The provider answered with something that does not decode.
    #[error("malformed provider response: {0}")]
    MalformedResponse(String),

    /// Both frontiers ran dry without meeting.
    #[error("no path found from {from:?} to {to:?}")]
    NoPathFound { from: String, to: String },

    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The caller's deadline elapsed before the frontiers met.
    #[error("search timed out after {0:?}")]
    Timeout(Duration),

    #[error("search task failed: {0}")]
    TaskFailed(#[from] tokio::task::JoinError),
}

impl RaceError {
    /// Transport and decode failures, as opposed to search outcomes.
    pub fn is_provider_failure(&self) -> bool {
        matches!(
            self,
            RaceError::ProviderUnavailable(_) | RaceError::MalformedResponse(_)
        )
    }
}

impl From<reqwest::Error> for RaceError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            RaceError::MalformedResponse(e.to_string())
        } else {
            RaceError::ProviderUnavailable(e.to_string())
        }
    }
}

impl From<serde_json::Error> for RaceError {
    fn from(e: serde_json::Error) -> Self {
        RaceError::MalformedResponse(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, RaceError>;
