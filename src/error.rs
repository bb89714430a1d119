use axum::http::StatusCode;
use std::time::Duration;
use thiserror::Error;

/// Seconds a client is told to wait when the provider rate limits us without saying for how long.
const DEFAULT_RATE_LIMIT_RETRY_SECS: u64 = 30;

/// Failures reaching or interpreting the language model provider.
#[derive(Debug, Clone, Error)]
pub enum LlmError {
    #[error("provider request timed out after {}s", .0.as_secs())]
    Timeout(Duration),

    #[error("too many concurrent provider requests")]
    Saturated,

    #[error("provider rate limit exceeded")]
    RateLimited { retry_after: Option<u64> },

    #[error("provider returned HTTP {status}: {message}")]
    Http { status: u16, message: String },

    #[error("provider transport error: {0}")]
    Transport(String),

    #[error("provider blocked the request: {0}")]
    Blocked(String),

    #[error("unrecognized provider response: {0}")]
    UnrecognizedResponse(String),

    #[error("provider error: {0}")]
    Provider(String),

    #[error("no language model configured")]
    NotConfigured,
}

impl LlmError {
    /// Whether another attempt could plausibly succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            LlmError::Timeout(_) | LlmError::RateLimited { .. } | LlmError::Transport(_) => true,
            LlmError::Http { status, .. } => *status >= 500,
            _ => false,
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            LlmError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            LlmError::Saturated | LlmError::RateLimited { .. } | LlmError::NotConfigured => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            _ => StatusCode::BAD_GATEWAY,
        }
    }

    /// Value for the `Retry-After` header, in seconds.
    pub fn retry_after(&self) -> Option<u64> {
        match self {
            LlmError::Timeout(_) => Some(5),
            LlmError::Saturated => Some(1),
            LlmError::RateLimited { retry_after } => {
                Some(retry_after.unwrap_or(DEFAULT_RATE_LIMIT_RETRY_SECS))
            }
            LlmError::Http { status, .. } if *status >= 500 => Some(5),
            LlmError::Transport(_) => Some(5),
            _ => None,
        }
    }
}

/// Failures of the analysis gateway operations.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("Invalid analysis type")]
    InvalidAnalysisType(String),

    #[error("Prompt is required")]
    EmptyPrompt,

    #[error("Error generating analysis: {0}")]
    Provider(#[from] LlmError),
}

impl AnalysisError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AnalysisError::InvalidAnalysisType(_) | AnalysisError::EmptyPrompt => {
                StatusCode::BAD_REQUEST
            }
            AnalysisError::Provider(e) => e.status_code(),
        }
    }

    pub fn retry_after(&self) -> Option<u64> {
        match self {
            AnalysisError::Provider(e) => e.retry_after(),
            _ => None,
        }
    }

    /// The bare failure description, without the analysis prefix.
    pub fn detail(&self) -> String {
        match self {
            AnalysisError::Provider(e) => e.to_string(),
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(LlmError::Timeout(Duration::from_secs(1)).is_transient());
        assert!(LlmError::RateLimited { retry_after: None }.is_transient());
        assert!(LlmError::Http {
            status: 503,
            message: "overloaded".to_string()
        }
        .is_transient());

        assert!(!LlmError::Http {
            status: 400,
            message: "bad request".to_string()
        }
        .is_transient());
        assert!(!LlmError::Blocked("SAFETY".to_string()).is_transient());
        assert!(!LlmError::NotConfigured.is_transient());
        assert!(!LlmError::Saturated.is_transient());
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            LlmError::Timeout(Duration::from_secs(60)).status_code(),
            StatusCode::GATEWAY_TIMEOUT
        );
        assert_eq!(
            LlmError::RateLimited {
                retry_after: Some(12)
            }
            .status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            LlmError::UnrecognizedResponse("{}".to_string()).status_code(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            AnalysisError::InvalidAnalysisType("poetry".to_string()).status_code(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_retry_after() {
        assert_eq!(
            LlmError::RateLimited {
                retry_after: Some(12)
            }
            .retry_after(),
            Some(12)
        );
        assert_eq!(
            LlmError::RateLimited { retry_after: None }.retry_after(),
            Some(DEFAULT_RATE_LIMIT_RETRY_SECS)
        );
        assert_eq!(LlmError::NotConfigured.retry_after(), None);
        assert_eq!(AnalysisError::EmptyPrompt.retry_after(), None);
    }

    #[test]
    fn test_messages() {
        let err = AnalysisError::from(LlmError::Transport("connection refused".to_string()));
        assert_eq!(
            err.to_string(),
            "Error generating analysis: provider transport error: connection refused"
        );
        assert_eq!(err.detail(), "provider transport error: connection refused");
        assert_eq!(
            AnalysisError::InvalidAnalysisType("x".to_string()).to_string(),
            "Invalid analysis type"
        );
        assert_eq!(
            LlmError::Timeout(Duration::from_secs(60)).to_string(),
            "provider request timed out after 60s"
        );
    }
}
