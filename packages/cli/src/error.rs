use axum::{
    http::{HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use bookclub_voting::VotingError;
use serde::Serialize;
use std::collections::HashMap;
use thiserror::Error;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Seconds a throttled voter is told to wait when the limiter gives no better hint
pub const DEFAULT_RETRY_AFTER_SECS: u64 = 60;

/// Main application error type that all handlers should return
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Rate limit exceeded")]
    RateLimitExceeded { retry_after: u64 },

    /// No caller identity on the request
    #[error("Unauthorized access")]
    Unauthorized,

    /// Wrap errors from the voting engine
    #[error("{0}")]
    Voting(#[from] VotingError),
}

/// Structured error response format for API consistency
#[derive(Serialize)]
struct ErrorResponse {
    success: bool,
    error: ErrorDetail,
    request_id: String,
}

/// Error detail structure with machine-readable codes
#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    retry_after: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<HashMap<String, String>>,
}

impl AppError {
    /// Convert AppError to appropriate HTTP status code and error code
    fn to_status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::RateLimitExceeded { .. } => {
                (StatusCode::TOO_MANY_REQUESTS, "RATE_LIMIT_EXCEEDED")
            }
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            AppError::Voting(voting_error) => match voting_error {
                // The caller is identified but lacks the membership or admin role
                VotingError::Unauthorized => (StatusCode::FORBIDDEN, "FORBIDDEN"),
                VotingError::RateLimited => (StatusCode::TOO_MANY_REQUESTS, "RATE_LIMIT_EXCEEDED"),
                VotingError::VotingLocked => (StatusCode::LOCKED, "VOTING_LOCKED"),
                VotingError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
                VotingError::NotVotable { .. } => (StatusCode::CONFLICT, "NOT_VOTABLE"),
                VotingError::RoundConflict => (StatusCode::CONFLICT, "ROUND_CONFLICT"),
                VotingError::NoActiveRound => (StatusCode::CONFLICT, "NO_ACTIVE_ROUND"),
                VotingError::NoFinalizedRound => (StatusCode::CONFLICT, "NO_FINALIZED_ROUND"),
                VotingError::NoCandidates => (StatusCode::CONFLICT, "NO_CANDIDATES"),
                VotingError::DuplicateSuggestion { .. } => {
                    (StatusCode::CONFLICT, "DUPLICATE_SUGGESTION")
                }
                VotingError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
                VotingError::StoreUnavailable(_) => {
                    (StatusCode::SERVICE_UNAVAILABLE, "STORE_UNAVAILABLE")
                }
                VotingError::Storage(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
            },
        }
    }

    /// Get user-friendly error message (sanitized for external consumption)
    fn to_user_message(&self) -> String {
        match self {
            AppError::RateLimitExceeded { .. } => {
                "Too many votes. Please try again later".to_string()
            }
            AppError::Unauthorized => "Missing X-User-Id header".to_string(),
            AppError::Voting(voting_error) => match voting_error {
                VotingError::Unauthorized => {
                    "You are not allowed to perform this action".to_string()
                }
                VotingError::RateLimited => "Too many votes. Please try again later".to_string(),
                VotingError::NotFound(what) => format!("{} not found", capitalize(what)),
                VotingError::RoundConflict => {
                    "Another administrator changed the round at the same time; reload and try again"
                        .to_string()
                }
                VotingError::Validation(e) => format!("Validation failed: {}", e),
                VotingError::StoreUnavailable(_) => {
                    "The data store is temporarily unavailable".to_string()
                }
                VotingError::Storage(_) => "An internal server error occurred".to_string(),
                other => other.to_string(),
            },
        }
    }

    fn details(&self) -> Option<HashMap<String, String>> {
        match self {
            AppError::Voting(VotingError::DuplicateSuggestion {
                match_type,
                existing_id,
            }) => Some(HashMap::from([
                ("matchType".to_string(), match_type.to_string()),
                ("existingId".to_string(), existing_id.clone()),
            ])),
            _ => None,
        }
    }

    fn retry_after(&self) -> Option<u64> {
        match self {
            AppError::RateLimitExceeded { retry_after } => Some(*retry_after),
            AppError::Voting(VotingError::RateLimited) => Some(DEFAULT_RETRY_AFTER_SECS),
            _ => None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let request_id = Uuid::new_v4().to_string();
        let (status_code, error_code) = self.to_status_and_code();
        let user_message = self.to_user_message();

        match &self {
            AppError::Voting(VotingError::Storage(storage_err)) => {
                error!(
                    request_id = %request_id,
                    storage_error = %storage_err,
                    "Storage system error"
                );
            }
            AppError::Voting(VotingError::StoreUnavailable(reason)) => {
                warn!(
                    request_id = %request_id,
                    reason = %reason,
                    "Store unavailable"
                );
            }
            // Expected while a round is finalized
            AppError::Voting(VotingError::VotingLocked) => {
                debug!(request_id = %request_id, "Vote rejected: voting locked");
            }
            AppError::RateLimitExceeded { .. } | AppError::Voting(VotingError::RateLimited) => {
                warn!(
                    request_id = %request_id,
                    audit = true,
                    "Vote rate limit exceeded"
                );
            }
            _ => {
                info!(
                    request_id = %request_id,
                    error_code = %error_code,
                    error = %self,
                    "API error response"
                );
            }
        }

        let retry_after = self.retry_after();
        let error_response = ErrorResponse {
            success: false,
            error: ErrorDetail {
                code: error_code.to_string(),
                message: user_message,
                retry_after,
                details: self.details(),
            },
            request_id,
        };

        let mut response = Json(error_response).into_response();
        *response.status_mut() = status_code;

        if let Some(retry_after) = retry_after {
            response
                .headers_mut()
                .insert("Retry-After", HeaderValue::from(retry_after));
        }

        response
    }
}

/// Result type alias for API handlers
pub type ApiResult<T> = Result<T, AppError>;

/// Helper functions for common error scenarios
impl AppError {
    pub fn rate_limited(retry_after: u64) -> Self {
        Self::RateLimitExceeded { retry_after }
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bookclub_core::{SuggestionStatus, ValidationError};
    use bookclub_storage::StorageError;
    use bookclub_voting::MatchType;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use serde_json::Value;

    #[rstest]
    #[case(VotingError::Unauthorized, StatusCode::FORBIDDEN, "FORBIDDEN")]
    #[case(VotingError::VotingLocked, StatusCode::LOCKED, "VOTING_LOCKED")]
    #[case(VotingError::RoundConflict, StatusCode::CONFLICT, "ROUND_CONFLICT")]
    #[case(VotingError::NoActiveRound, StatusCode::CONFLICT, "NO_ACTIVE_ROUND")]
    #[case(VotingError::NoFinalizedRound, StatusCode::CONFLICT, "NO_FINALIZED_ROUND")]
    #[case(VotingError::NoCandidates, StatusCode::CONFLICT, "NO_CANDIDATES")]
    #[case(VotingError::NotFound("suggestion x".into()), StatusCode::NOT_FOUND, "NOT_FOUND")]
    #[case(
        VotingError::NotVotable { id: "x".into(), status: SuggestionStatus::Read },
        StatusCode::CONFLICT,
        "NOT_VOTABLE"
    )]
    #[case(
        VotingError::Validation(ValidationError::EmptyField("title")),
        StatusCode::BAD_REQUEST,
        "VALIDATION_ERROR"
    )]
    #[case(
        VotingError::StoreUnavailable("timed out".into()),
        StatusCode::SERVICE_UNAVAILABLE,
        "STORE_UNAVAILABLE"
    )]
    #[case(VotingError::RateLimited, StatusCode::TOO_MANY_REQUESTS, "RATE_LIMIT_EXCEEDED")]
    fn test_voting_error_status(
        #[case] error: VotingError,
        #[case] status: StatusCode,
        #[case] code: &str,
    ) {
        let (actual_status, actual_code) = AppError::from(error).to_status_and_code();
        assert_eq!(actual_status, status);
        assert_eq!(actual_code, code);
    }

    #[test]
    fn test_missing_identity_is_unauthorized() {
        let (status, code) = AppError::Unauthorized.to_status_and_code();
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(code, "UNAUTHORIZED");
    }

    #[test]
    fn test_user_message_sanitization() {
        let storage_error = AppError::from(VotingError::Storage(StorageError::Database(
            "Database connection failed with password xyz".to_string(),
        )));
        let (status, code) = storage_error.to_status_and_code();
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(code, "INTERNAL_ERROR");

        let message = storage_error.to_user_message();
        assert_eq!(message, "An internal server error occurred");
        assert!(!message.contains("password"));
    }

    #[tokio::test]
    async fn test_duplicate_response_carries_match_details() {
        let error = AppError::from(VotingError::DuplicateSuggestion {
            match_type: MatchType::Isbn,
            existing_id: "sug-1".to_string(),
        });

        let response = error.into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body["success"], false);
        assert_eq!(body["error"]["code"], "DUPLICATE_SUGGESTION");
        assert_eq!(body["error"]["details"]["matchType"], "isbn");
        assert_eq!(body["error"]["details"]["existingId"], "sug-1");
    }

    #[tokio::test]
    async fn test_rate_limit_response_sets_retry_after() {
        let response = AppError::rate_limited(12).into_response();

        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers()["Retry-After"], "12");

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body["error"]["retry_after"], 12);
    }
}
