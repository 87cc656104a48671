// ABOUTME: Error taxonomy for voting operations
// ABOUTME: Classifies raw database failures into conflict, unavailability, and storage errors

use bookclub_core::{SuggestionStatus, ValidationError};
use bookclub_storage::StorageError;
use thiserror::Error;

use crate::types::MatchType;

// SQLite primary result codes
const SQLITE_BUSY: i32 = 5;
const SQLITE_LOCKED: i32 = 6;

#[derive(Debug, Error)]
pub enum VotingError {
    #[error("Unauthorized")]
    Unauthorized,

    #[error("Rate limit exceeded")]
    RateLimited,

    #[error("Voting is locked until the next round opens")]
    VotingLocked,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Suggestion {id} is {status} and cannot receive votes")]
    NotVotable {
        id: String,
        status: SuggestionStatus,
    },

    #[error("Another voting round is already active or finalized")]
    RoundConflict,

    #[error("No active voting round")]
    NoActiveRound,

    #[error("No finalized voting round to reset")]
    NoFinalizedRound,

    #[error("No pending suggestions to pick winners from")]
    NoCandidates,

    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Already suggested ({match_type} match with {existing_id})")]
    DuplicateSuggestion {
        match_type: MatchType,
        existing_id: String,
    },

    #[error("Storage error: {0}")]
    Storage(StorageError),
}

pub type VotingResult<T> = Result<T, VotingError>;

impl VotingError {
    /// Worth retrying once: another writer won the race or the store blipped.
    /// Finalize/reset retries still re-run their precondition checks.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::RoundConflict | Self::StoreUnavailable(_))
    }
}

impl From<StorageError> for VotingError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Sqlx(e) => classify_sqlx(e),
            StorageError::NotFound => VotingError::NotFound("record".to_string()),
            other => VotingError::Storage(other),
        }
    }
}

impl From<sqlx::Error> for VotingError {
    fn from(err: sqlx::Error) -> Self {
        classify_sqlx(err)
    }
}

fn classify_sqlx(err: sqlx::Error) -> VotingError {
    if matches!(
        err,
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_)
    ) {
        return VotingError::StoreUnavailable(err.to_string());
    }

    if let sqlx::Error::Database(db) = &err {
        // Both the single-live-round index and the round_number key live on voting_rounds
        if db.is_unique_violation() && db.message().contains("voting_rounds") {
            return VotingError::RoundConflict;
        }

        let primary_code = db
            .code()
            .and_then(|code| code.parse::<i32>().ok())
            .map(|code| code & 0xff);
        if matches!(primary_code, Some(SQLITE_BUSY) | Some(SQLITE_LOCKED)) {
            return VotingError::StoreUnavailable(db.message().to_string());
        }
    }

    VotingError::Storage(StorageError::Sqlx(err))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_timeout_is_store_unavailable() {
        let err: VotingError = sqlx::Error::PoolTimedOut.into();
        assert!(matches!(err, VotingError::StoreUnavailable(_)));
        assert!(err.is_retryable());
    }

    #[test]
    fn test_row_not_found_stays_storage_error() {
        let err: VotingError = StorageError::Sqlx(sqlx::Error::RowNotFound).into();
        assert!(matches!(err, VotingError::Storage(_)));
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_precondition_failures_are_not_retryable() {
        assert!(!VotingError::NoActiveRound.is_retryable());
        assert!(!VotingError::NoCandidates.is_retryable());
        assert!(!VotingError::VotingLocked.is_retryable());
        assert!(VotingError::RoundConflict.is_retryable());
    }
}
