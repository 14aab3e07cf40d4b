use thiserror::Error;

/// Errors surfaced by the ranking pipeline.
///
/// `Clone` so one failed load can be handed to every caller that joined it.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RankingError {
    #[error("Failed to fetch market data: {0}")]
    Upstream(String),

    #[error("Invalid market data payload: {0}")]
    InvalidPayload(String),

    #[error("Load for '{key}' timed out after {secs}s")]
    Timeout { key: String, secs: u64 },

    #[error("Load task failed: {0}")]
    TaskFailed(String),

    #[error("Not found: {0}")]
    NotFound(String),
}
