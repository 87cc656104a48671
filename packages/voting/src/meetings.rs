// ABOUTME: Meeting storage layer using SQLite
// ABOUTME: Meetings are consumed by finalization as targets for winning books

use bookclub_core::constants::MEETING_ID_PREFIX;
use bookclub_core::{generate_id, Meeting, MeetingCreateInput};
use bookclub_storage::{StorageError, StorageResult};
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection, SqlitePool};
use tracing::debug;

pub struct MeetingStorage {
    pool: SqlitePool,
}

impl MeetingStorage {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create_meeting(&self, input: MeetingCreateInput) -> StorageResult<Meeting> {
        let id = generate_id(MEETING_ID_PREFIX);

        debug!("Creating meeting: {} on {}", id, input.date);

        sqlx::query(
            r#"
            INSERT INTO meetings (id, meeting_date, meeting_time, location, auto_assigned, created_at)
            VALUES (?, ?, ?, ?, 0, ?)
            "#,
        )
        .bind(&id)
        .bind(input.date)
        .bind(input.time.trim())
        .bind(input.location.trim())
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(StorageError::Sqlx)?;

        self.get_meeting(&id).await
    }

    pub async fn get_meeting(&self, id: &str) -> StorageResult<Meeting> {
        let row = sqlx::query("SELECT * FROM meetings WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(StorageError::Sqlx)?
            .ok_or(StorageError::NotFound)?;

        row_to_meeting(&row)
    }

    /// Meetings on or after `today`, earliest first
    pub async fn list_upcoming(&self, today: NaiveDate) -> StorageResult<Vec<Meeting>> {
        let rows = sqlx::query(
            r#"
            SELECT * FROM meetings
            WHERE meeting_date >= ?
            ORDER BY meeting_date ASC, meeting_time ASC, id ASC
            "#,
        )
        .bind(today)
        .fetch_all(&self.pool)
        .await
        .map_err(StorageError::Sqlx)?;

        rows.iter().map(row_to_meeting).collect()
    }
}

// ==================== Transaction-scoped queries ====================

/// Future meetings that finalization may fill, earliest first
pub(crate) async fn eligible_targets(
    conn: &mut SqliteConnection,
    today: NaiveDate,
    limit: usize,
) -> StorageResult<Vec<Meeting>> {
    let rows = sqlx::query(
        r#"
        SELECT * FROM meetings
        WHERE meeting_date >= ? AND auto_assigned = 0
        ORDER BY meeting_date ASC, meeting_time ASC, id ASC
        LIMIT ?
        "#,
    )
    .bind(today)
    .bind(limit as i64)
    .fetch_all(&mut *conn)
    .await
    .map_err(StorageError::Sqlx)?;

    rows.iter().map(row_to_meeting).collect()
}

/// Put a winning book into a meeting's slot and flag it as auto-assigned
pub(crate) async fn assign_book(
    conn: &mut SqliteConnection,
    meeting_id: &str,
    suggestion_id: &str,
    title: &str,
) -> StorageResult<()> {
    let result = sqlx::query(
        r#"
        UPDATE meetings
        SET book_suggestion_id = ?, book_title = ?, auto_assigned = 1
        WHERE id = ? AND auto_assigned = 0
        "#,
    )
    .bind(suggestion_id)
    .bind(title)
    .bind(meeting_id)
    .execute(&mut *conn)
    .await
    .map_err(StorageError::Sqlx)?;

    if result.rows_affected() != 1 {
        return Err(StorageError::Database(format!(
            "Meeting {} is no longer available for assignment",
            meeting_id
        )));
    }
    Ok(())
}

fn row_to_meeting(row: &SqliteRow) -> StorageResult<Meeting> {
    let created_at: DateTime<Utc> = row.try_get("created_at")?;

    Ok(Meeting {
        id: row.try_get("id")?,
        date: row.try_get("meeting_date")?,
        time: row.try_get("meeting_time")?,
        location: row.try_get("location")?,
        book_suggestion_id: row.try_get("book_suggestion_id")?,
        book_title: row.try_get("book_title")?,
        auto_assigned: row.try_get("auto_assigned")?,
        created_at,
    })
}
