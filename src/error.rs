//! Error types for analytics and the document store.

use thiserror::Error;

/// Errors raised by the aggregation functions.
///
/// Empty inputs are never errors; they resolve to zeroed metrics.
/// Malformed answers are rejected at ingestion (`StoreError::InvalidInput`).
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AnalyticsError {
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },
}

impl AnalyticsError {
    pub fn question_not_found(id: &str) -> Self {
        AnalyticsError::NotFound {
            kind: "question",
            id: id.to_string(),
        }
    }
}

/// Errors raised by the store and the survey service.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The operation is not allowed in the survey's current status.
    #[error("{0}")]
    InvalidState(String),

    #[error("failed to access data file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse data file: {0}")]
    Parse(#[from] serde_json::Error),
}

impl StoreError {
    pub fn survey_not_found(id: &str) -> Self {
        StoreError::NotFound {
            kind: "survey",
            id: id.to_string(),
        }
    }

    pub fn respondent_not_found(id: &str) -> Self {
        StoreError::NotFound {
            kind: "respondent",
            id: id.to_string(),
        }
    }

    /// Whether the error maps to a "not found" result for callers.
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }
}

impl From<AnalyticsError> for StoreError {
    fn from(err: AnalyticsError) -> Self {
        match err {
            AnalyticsError::NotFound { kind, id } => StoreError::NotFound { kind, id },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = AnalyticsError::question_not_found("q9");
        assert_eq!(err.to_string(), "question not found: q9");

        let err = StoreError::survey_not_found("s1");
        assert_eq!(err.to_string(), "survey not found: s1");
        assert!(err.is_not_found());
    }

    #[test]
    fn test_analytics_error_converts() {
        let err: StoreError = AnalyticsError::question_not_found("q1").into();
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "question not found: q1");
    }
}
