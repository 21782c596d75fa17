use std::time::Duration;

use ai_client::AiError;
use thiserror::Error;

/// Why a model-backed stage produced nothing usable. The lifecycle treats
/// every variant as a failed attempt, never as a crash.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum CollaboratorError {
    #[error("model unavailable: {0}")]
    ModelUnavailable(String),

    #[error("malformed response: {0}")]
    MalformedResponse(String),

    #[error("call timed out after {0:?}")]
    Timeout(Duration),
}

impl From<AiError> for CollaboratorError {
    fn from(e: AiError) -> Self {
        match e {
            AiError::Timeout(after) => CollaboratorError::Timeout(after),
            AiError::Parse(msg) => CollaboratorError::MalformedResponse(msg),
            other if other.is_transport() => CollaboratorError::ModelUnavailable(other.to_string()),
            other => CollaboratorError::MalformedResponse(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_failures_are_malformed_responses() {
        let err: CollaboratorError = AiError::Parse("no JSON object".into()).into();
        assert!(matches!(err, CollaboratorError::MalformedResponse(_)));
    }

    #[test]
    fn provider_errors_mean_unavailable() {
        let err: CollaboratorError = AiError::Unavailable {
            status: 503,
            body: "overloaded".into(),
        }
        .into();
        assert!(matches!(err, CollaboratorError::ModelUnavailable(ref m) if m.contains("503")));
    }

    #[test]
    fn gateway_timeouts_keep_their_duration() {
        let err: CollaboratorError = AiError::Timeout(Duration::from_secs(5)).into();
        assert_eq!(err, CollaboratorError::Timeout(Duration::from_secs(5)));
    }
}
