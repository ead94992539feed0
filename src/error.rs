//! Error taxonomy shared by the registry, judge client and rating pipeline.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Fatal startup problems. Raised before any network call is made.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{key} or {secret} environment variables not set")]
    MissingCredentials { key: String, secret: String },

    #[error("the {command} command needs --auth")]
    AuthRequired { command: &'static str },
}

/// Failures talking to the judge API.
#[derive(Debug, Error)]
pub enum JudgeError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("judge returned http {status}: {body}")]
    Status { status: u16, body: String },

    /// A `FAILED` envelope. The comment is the judge's own explanation.
    #[error("{comment}")]
    Api { comment: String },

    #[error("failed to decode judge response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("response cache error: {0}")]
    Cache(#[from] std::io::Error),
}

impl JudgeError {
    /// Transient failures worth retrying: timeouts, connection drops, 5xx/429
    /// and the judge's rate limiter. Everything else is a definitive answer.
    pub fn is_retryable(&self) -> bool {
        match self {
            JudgeError::Transport(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            JudgeError::Status { status, .. } => *status >= 500 || *status == 429,
            JudgeError::Api { comment } => comment.contains("Call limit exceeded"),
            JudgeError::Decode(_) | JudgeError::Cache(_) => false,
        }
    }
}

/// Failures reading the registration sheet.
#[derive(Debug, Error)]
pub enum SheetError {
    #[error("failed to read sheet: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to download sheet: {0:#}")]
    Download(anyhow::Error),

    #[error("failed to parse sheet: {0}")]
    Csv(#[from] csv::Error),

    #[error("sheet has no header row")]
    MissingHeader,
}

/// Per-contest rating failures. Only the affected contest is skipped.
#[derive(Debug, Error, PartialEq)]
pub enum RatingError {
    #[error("contest {contest_id} has no registered teams in its standings")]
    EmptyContest { contest_id: u64 },
}

/// A handle the judge definitively does not know. Recorded as a validation
/// reason, never retried.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct LookupFailure(pub String);

/// One registration row that failed validation. Kept in the registry's
/// error log instead of being raised, so the rest of the load continues.
#[derive(Debug, Error, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[error("invalid details for {team} ({institute}), row {row}: {}", .reasons.join(", "))]
pub struct ValidationError {
    /// 1-based data row in the sheet (the header row is not counted).
    pub row: usize,
    pub institute: String,
    pub team: String,
    pub reasons: Vec<String>,
}
