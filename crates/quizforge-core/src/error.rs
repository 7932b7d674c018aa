//! Error types shared across quizforge.
//!
//! Provider errors live here rather than in `quizforge-providers` so the
//! generation engine can downcast and classify them for retry decisions
//! without string matching.

use thiserror::Error;

use crate::model::Difficulty;

/// Errors that can occur when interacting with an LLM provider.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The API returned a 429 rate limit response.
    #[error("rate limited, retry after {retry_after_ms}ms")]
    RateLimited { retry_after_ms: u64 },

    /// Authentication failed (invalid API key).
    #[error("authentication failed: {0}")]
    AuthenticationFailed(String),

    /// The requested model was not found.
    #[error("model not found: {0}")]
    ModelNotFound(String),

    /// The API returned an error response.
    #[error("API error (HTTP {status}): {message}")]
    ApiError { status: u16, message: String },

    /// The request timed out.
    #[error("request timed out after {0}s")]
    Timeout(u64),

    /// A network error occurred.
    #[error("network error: {0}")]
    NetworkError(String),
}

impl ProviderError {
    /// Returns `true` if this error is permanent and should not be retried.
    pub fn is_permanent(&self) -> bool {
        matches!(
            self,
            ProviderError::AuthenticationFailed(_) | ProviderError::ModelNotFound(_)
        )
    }

    /// Returns the retry-after delay in milliseconds, if applicable.
    pub fn retry_after_ms(&self) -> Option<u64> {
        match self {
            ProviderError::RateLimited { retry_after_ms } => Some(*retry_after_ms),
            _ => None,
        }
    }
}

/// Invalid diagnostic settings, rejected before allocation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SettingsError {
    #[error("question count must be at least 1")]
    ZeroQuestionCount,

    #[error("{difficulty} percentage must be between 0 and 100, got {percentage}")]
    PercentageOutOfRange {
        difficulty: Difficulty,
        percentage: u32,
    },

    #[error("time limit must be a positive number of seconds")]
    ZeroTimeLimit,
}

/// Caller contract violations detected by the result analyzer.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AnalysisError {
    #[error("cannot analyze an empty question set")]
    EmptyQuestionSet,

    #[error("duplicate question id in question set: {0}")]
    DuplicateQuestionId(String),

    #[error("answer references unknown question id: {0}")]
    UnknownQuestion(String),
}

/// Failures parsing content-generator output.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("response is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("response contained no usable questions ({rejected} rejected)")]
    NoQuestions { rejected: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn permanent_errors_are_classified() {
        assert!(ProviderError::AuthenticationFailed("bad key".into()).is_permanent());
        assert!(ProviderError::ModelNotFound("gpt-0".into()).is_permanent());
        assert!(!ProviderError::Timeout(30).is_permanent());
        assert!(!ProviderError::RateLimited {
            retry_after_ms: 10
        }
        .is_permanent());
    }

    #[test]
    fn retry_after_only_for_rate_limits() {
        assert_eq!(
            ProviderError::RateLimited {
                retry_after_ms: 5000
            }
            .retry_after_ms(),
            Some(5000)
        );
        assert_eq!(ProviderError::NetworkError("reset".into()).retry_after_ms(), None);
    }

    #[test]
    fn settings_error_messages() {
        let err = SettingsError::PercentageOutOfRange {
            difficulty: Difficulty::Easy,
            percentage: 140,
        };
        assert_eq!(
            err.to_string(),
            "easy percentage must be between 0 and 100, got 140"
        );
    }
}
