// ABOUTME: Reset transaction: finalized round -> completed, next round opened
// ABOUTME: Clears pending vote sets; winners keep their placement history

use bookclub_core::RoundStatus;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::info;

use crate::error::{VotingError, VotingResult};
use crate::types::ResetOutcome;
use crate::{rounds, suggestions};

pub async fn reset_round(
    pool: &SqlitePool,
    admin_id: &str,
    now: DateTime<Utc>,
) -> VotingResult<ResetOutcome> {
    let mut tx = pool.begin().await?;

    let finished = rounds::complete_finalized(&mut tx, now)
        .await?
        .ok_or(VotingError::NoFinalizedRound)?;

    let cleared = suggestions::clear_pending_votes(&mut tx).await?;

    let next = rounds::insert_round(
        &mut tx,
        finished.round_number + 1,
        RoundStatus::Active,
        now,
    )
    .await?;

    tx.commit().await?;

    info!(
        "Round #{} completed by {}; cleared {} votes, round #{} is now open",
        finished.round_number, admin_id, cleared, next.round_number
    );

    Ok(ResetOutcome {
        round_number: next.round_number,
    })
}
