// ABOUTME: Vote ledger: the toggle-vote transaction
// ABOUTME: Adds or removes one voter from one suggestion's vote set, gated on the active round

use bookclub_core::{RoundStatus, SuggestionStatus};
use bookclub_storage::StorageError;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{VotingError, VotingResult};
use crate::rounds;
use crate::suggestions;
use crate::types::VoteOutcome;

/// Toggle `voter_id`'s vote on `suggestion_id`.
///
/// The transaction opens with the DELETE so SQLite hands it the write lock
/// before anything is read. The round gate and the suggestion status are then
/// checked against state no finalize or reset can change until this commits.
/// Any failure after the DELETE rolls it back.
pub async fn toggle_vote(
    pool: &SqlitePool,
    voter_id: &str,
    suggestion_id: &str,
    now: DateTime<Utc>,
) -> VotingResult<VoteOutcome> {
    let mut tx = pool.begin().await?;

    let removed = sqlx::query(
        "DELETE FROM suggestion_votes WHERE suggestion_id = ? AND voter_id = ?",
    )
    .bind(suggestion_id)
    .bind(voter_id)
    .execute(&mut *tx)
    .await?
    .rows_affected()
        > 0;

    let status = suggestions::status_of(&mut tx, suggestion_id)
        .await?
        .ok_or_else(|| VotingError::NotFound(format!("suggestion {}", suggestion_id)))?;

    if rounds::live_status(&mut tx).await? != Some(RoundStatus::Active) {
        debug!(
            "Vote by {} on {} rejected: voting is locked",
            voter_id, suggestion_id
        );
        tx.rollback().await?;
        return Err(VotingError::VotingLocked);
    }

    if status != SuggestionStatus::Pending {
        tx.rollback().await?;
        return Err(VotingError::NotVotable {
            id: suggestion_id.to_string(),
            status,
        });
    }

    if !removed {
        // The (suggestion_id, voter_id) key makes a double insert impossible
        sqlx::query(
            "INSERT INTO suggestion_votes (suggestion_id, voter_id, voted_at) VALUES (?, ?, ?)",
        )
        .bind(suggestion_id)
        .bind(voter_id)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(StorageError::Sqlx)?;
    }

    let vote_count = suggestions::count_votes(&mut tx, suggestion_id).await?;

    tx.commit().await?;

    debug!(
        "Voter {} {} suggestion {} (now {} votes)",
        voter_id,
        if removed { "un-voted" } else { "voted for" },
        suggestion_id,
        vote_count
    );

    Ok(VoteOutcome {
        voted: !removed,
        vote_count,
    })
}
