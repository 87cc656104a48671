// ABOUTME: Voting round registry backed by SQLite
// ABOUTME: Round reads plus the conditional transitions used inside finalize and reset transactions

use bookclub_core::constants::{FIRST_ROUND_NUMBER, LEGACY_ROUND_NUMBER, ROUND_ID_PREFIX};
use bookclub_core::{generate_id, RoundStatus, RoundWinner, VotingRound};
use bookclub_storage::{StorageError, StorageResult};
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection, SqlitePool};
use tracing::{debug, info};

/// Identity of a round claimed by a transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ClaimedRound {
    pub id: String,
    pub round_number: i64,
}

pub struct RoundStorage {
    pool: SqlitePool,
}

impl RoundStorage {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// The live round (active or finalized); when none is live, the most recent round
    pub async fn current_round(&self) -> StorageResult<Option<VotingRound>> {
        let mut conn = self.pool.acquire().await.map_err(StorageError::Sqlx)?;

        let row = sqlx::query(
            r#"
            SELECT * FROM voting_rounds
            ORDER BY CASE WHEN status IN ('active', 'finalized') THEN 0 ELSE 1 END,
                     round_number DESC
            LIMIT 1
            "#,
        )
        .fetch_optional(&mut *conn)
        .await
        .map_err(StorageError::Sqlx)?;

        match row {
            Some(row) => Ok(Some(load_round(&mut conn, &row).await?)),
            None => Ok(None),
        }
    }

    /// Every round, newest first, with winners
    pub async fn list_rounds(&self) -> StorageResult<Vec<VotingRound>> {
        let mut conn = self.pool.acquire().await.map_err(StorageError::Sqlx)?;

        let rows = sqlx::query("SELECT * FROM voting_rounds ORDER BY round_number DESC")
            .fetch_all(&mut *conn)
            .await
            .map_err(StorageError::Sqlx)?;

        let mut rounds = Vec::with_capacity(rows.len());
        for row in &rows {
            rounds.push(load_round(&mut conn, row).await?);
        }
        Ok(rounds)
    }

    pub async fn get_by_number(&self, round_number: i64) -> StorageResult<VotingRound> {
        let mut conn = self.pool.acquire().await.map_err(StorageError::Sqlx)?;

        let row = sqlx::query("SELECT * FROM voting_rounds WHERE round_number = ?")
            .bind(round_number)
            .fetch_optional(&mut *conn)
            .await
            .map_err(StorageError::Sqlx)?
            .ok_or(StorageError::NotFound)?;

        load_round(&mut conn, &row).await
    }

    /// Open round #1 if no regular round has ever existed. Returns the new round, if any.
    ///
    /// A single INSERT ... WHERE NOT EXISTS keeps this atomic; a racing caller
    /// trips the round_number key instead of creating a second round.
    pub async fn ensure_initial_round(
        &self,
        now: DateTime<Utc>,
    ) -> StorageResult<Option<VotingRound>> {
        let id = generate_id(ROUND_ID_PREFIX);

        let result = sqlx::query(
            r#"
            INSERT INTO voting_rounds (id, round_number, status, created_at)
            SELECT ?, ?, ?, ?
            WHERE NOT EXISTS (
                SELECT 1 FROM voting_rounds
                WHERE round_number > ? OR status IN ('active', 'finalized')
            )
            "#,
        )
        .bind(&id)
        .bind(FIRST_ROUND_NUMBER)
        .bind(RoundStatus::Active.as_str())
        .bind(now)
        .bind(LEGACY_ROUND_NUMBER)
        .execute(&self.pool)
        .await
        .map_err(StorageError::Sqlx)?;

        if result.rows_affected() == 0 {
            debug!("Voting rounds already initialized");
            return Ok(None);
        }

        info!("Opened initial voting round #{}", FIRST_ROUND_NUMBER);
        self.get_by_number(FIRST_ROUND_NUMBER).await.map(Some)
    }
}

// ==================== Transaction-scoped queries ====================

/// Status of the live round, if any
pub(crate) async fn live_status(conn: &mut SqliteConnection) -> StorageResult<Option<RoundStatus>> {
    let status: Option<String> = sqlx::query_scalar(
        "SELECT status FROM voting_rounds WHERE status IN ('active', 'finalized') LIMIT 1",
    )
    .fetch_optional(&mut *conn)
    .await
    .map_err(StorageError::Sqlx)?;

    status.map(|s| parse_status(&s)).transpose()
}

/// Flip the active round to finalized. This is the first write of the finalize
/// transaction, so it also takes the database write lock for the rest of it.
pub(crate) async fn claim_active_for_finalize(
    conn: &mut SqliteConnection,
    admin_id: &str,
    now: DateTime<Utc>,
) -> StorageResult<Option<ClaimedRound>> {
    let row = sqlx::query(
        r#"
        UPDATE voting_rounds
        SET status = ?, finalized_at = ?, finalized_by = ?
        WHERE status = ?
        RETURNING id, round_number
        "#,
    )
    .bind(RoundStatus::Finalized.as_str())
    .bind(now)
    .bind(admin_id)
    .bind(RoundStatus::Active.as_str())
    .fetch_optional(&mut *conn)
    .await
    .map_err(StorageError::Sqlx)?;

    row.map(|r| row_to_claimed(&r)).transpose()
}

/// Flip the finalized round to completed; first write of the reset transaction
pub(crate) async fn complete_finalized(
    conn: &mut SqliteConnection,
    now: DateTime<Utc>,
) -> StorageResult<Option<ClaimedRound>> {
    let row = sqlx::query(
        r#"
        UPDATE voting_rounds
        SET status = ?, completed_at = ?
        WHERE status = ?
        RETURNING id, round_number
        "#,
    )
    .bind(RoundStatus::Completed.as_str())
    .bind(now)
    .bind(RoundStatus::Finalized.as_str())
    .fetch_optional(&mut *conn)
    .await
    .map_err(StorageError::Sqlx)?;

    row.map(|r| row_to_claimed(&r)).transpose()
}

/// Insert a round. Live statuses are subject to the single-live-round index.
pub(crate) async fn insert_round(
    conn: &mut SqliteConnection,
    round_number: i64,
    status: RoundStatus,
    now: DateTime<Utc>,
) -> StorageResult<ClaimedRound> {
    let id = generate_id(ROUND_ID_PREFIX);

    let completed_at = (status == RoundStatus::Completed).then_some(now);

    sqlx::query(
        r#"
        INSERT INTO voting_rounds (id, round_number, status, completed_at, created_at)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(round_number)
    .bind(status.as_str())
    .bind(completed_at)
    .bind(now)
    .execute(&mut *conn)
    .await
    .map_err(StorageError::Sqlx)?;

    Ok(ClaimedRound { id, round_number })
}

pub(crate) async fn insert_winner(
    conn: &mut SqliteConnection,
    round_id: &str,
    winner: &RoundWinner,
) -> StorageResult<()> {
    sqlx::query(
        r#"
        INSERT INTO round_winners (
            round_id, suggestion_id, placement, vote_count_snapshot,
            assigned_meeting_id, assigned_at
        ) VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(round_id)
    .bind(&winner.suggestion_id)
    .bind(winner.placement as i64)
    .bind(winner.vote_count_snapshot)
    .bind(&winner.assigned_meeting_id)
    .bind(winner.assigned_at)
    .execute(&mut *conn)
    .await
    .map_err(StorageError::Sqlx)?;

    Ok(())
}

async fn load_round(conn: &mut SqliteConnection, row: &SqliteRow) -> StorageResult<VotingRound> {
    let id: String = row.try_get("id")?;

    let winner_rows = sqlx::query(
        "SELECT * FROM round_winners WHERE round_id = ? ORDER BY placement ASC",
    )
    .bind(&id)
    .fetch_all(&mut *conn)
    .await
    .map_err(StorageError::Sqlx)?;

    let winners = winner_rows
        .iter()
        .map(row_to_winner)
        .collect::<Result<Vec<_>, _>>()?;

    let status: String = row.try_get("status")?;

    Ok(VotingRound {
        id,
        round_number: row.try_get("round_number")?,
        status: parse_status(&status)?,
        winners,
        finalized_at: row.try_get("finalized_at")?,
        finalized_by: row.try_get("finalized_by")?,
        completed_at: row.try_get("completed_at")?,
        created_at: row.try_get("created_at")?,
    })
}

fn row_to_winner(row: &SqliteRow) -> StorageResult<RoundWinner> {
    let placement: i64 = row.try_get("placement")?;

    Ok(RoundWinner {
        suggestion_id: row.try_get("suggestion_id")?,
        placement: u8::try_from(placement)
            .map_err(|_| StorageError::Database(format!("Invalid placement: {}", placement)))?,
        vote_count_snapshot: row.try_get("vote_count_snapshot")?,
        assigned_meeting_id: row.try_get("assigned_meeting_id")?,
        assigned_at: row.try_get("assigned_at")?,
    })
}

fn row_to_claimed(row: &SqliteRow) -> StorageResult<ClaimedRound> {
    Ok(ClaimedRound {
        id: row.try_get("id")?,
        round_number: row.try_get("round_number")?,
    })
}

fn parse_status(value: &str) -> StorageResult<RoundStatus> {
    value
        .parse()
        .map_err(|e| StorageError::Database(format!("Invalid round status: {}", e)))
}
