// ABOUTME: One-time import of winners recorded before voting rounds existed
// ABOUTME: Gathers placed-but-unlinked suggestions under a completed round #0

use bookclub_core::constants::LEGACY_ROUND_NUMBER;
use bookclub_core::{RoundStatus, RoundWinner};
use bookclub_storage::StorageError;
use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool};
use std::collections::HashSet;
use tracing::{debug, info};

use crate::error::VotingResult;
use crate::rounds;

/// Returns the number of suggestions linked to round #0, or None when there was nothing to do
pub async fn migrate_legacy_winners(
    pool: &SqlitePool,
    now: DateTime<Utc>,
) -> VotingResult<Option<u64>> {
    let mut tx = pool.begin().await?;

    // Takes the write lock first so two starting servers cannot both import
    let already_imported = sqlx::query_scalar::<_, i64>(
        "UPDATE voting_rounds SET round_number = round_number WHERE round_number = ? RETURNING 1",
    )
    .bind(LEGACY_ROUND_NUMBER)
    .fetch_optional(&mut *tx)
    .await?
    .is_some();

    let legacy_rows = sqlx::query(
        r#"
        SELECT s.id, s.placement,
            (SELECT COUNT(*) FROM suggestion_votes v WHERE v.suggestion_id = s.id) AS vote_count
        FROM suggestions s
        WHERE s.placement IS NOT NULL AND s.voting_round_id IS NULL
        ORDER BY s.won_at DESC, s.updated_at DESC
        "#,
    )
    .fetch_all(&mut *tx)
    .await?;

    if already_imported || legacy_rows.is_empty() {
        debug!("No legacy winners to import");
        tx.rollback().await?;
        return Ok(None);
    }

    let round = rounds::insert_round(&mut tx, LEGACY_ROUND_NUMBER, RoundStatus::Completed, now).await?;

    // Several historical winners may share a placement; the most recent one represents it
    let mut placements_taken = HashSet::new();
    for row in &legacy_rows {
        let suggestion_id: String = row.try_get("id").map_err(StorageError::Sqlx)?;
        let placement: i64 = row.try_get("placement").map_err(StorageError::Sqlx)?;
        let vote_count: i64 = row.try_get("vote_count").map_err(StorageError::Sqlx)?;

        if placements_taken.insert(placement) {
            let winner = RoundWinner {
                suggestion_id,
                placement: placement as u8,
                vote_count_snapshot: vote_count,
                assigned_meeting_id: None,
                assigned_at: None,
            };
            rounds::insert_winner(&mut tx, &round.id, &winner).await?;
        }
    }

    let linked = sqlx::query(
        "UPDATE suggestions SET voting_round_id = ? WHERE placement IS NOT NULL AND voting_round_id IS NULL",
    )
    .bind(&round.id)
    .execute(&mut *tx)
    .await?
    .rows_affected();

    tx.commit().await?;

    info!("Imported {} legacy winners into round #0", linked);
    Ok(Some(linked))
}
