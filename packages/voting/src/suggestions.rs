// ABOUTME: Suggestion storage layer using SQLite
// ABOUTME: CRUD for suggestions plus the transaction-scoped queries used by finalize and reset

use bookclub_core::constants::SUGGESTION_ID_PREFIX;
use bookclub_core::{generate_id, match_key, Suggestion, SuggestionCreateInput, SuggestionStatus};
use bookclub_storage::{StorageError, StorageResult};
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection, SqlitePool};
use tracing::debug;

use crate::ranking::{standing_order, Candidate};

const SELECT_WITH_VOTES: &str = r#"
    SELECT s.*,
        (SELECT COUNT(*) FROM suggestion_votes v WHERE v.suggestion_id = s.id) AS vote_count
    FROM suggestions s
"#;

pub struct SuggestionStorage {
    pool: SqlitePool,
}

impl SuggestionStorage {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a new pending suggestion. `input` is expected to be validated already.
    pub async fn create_suggestion(
        &self,
        suggested_by: &str,
        input: SuggestionCreateInput,
    ) -> StorageResult<Suggestion> {
        let id = generate_id(SUGGESTION_ID_PREFIX);
        let now = Utc::now();

        debug!("Creating suggestion: {} ({})", id, input.title);

        sqlx::query(
            r#"
            INSERT INTO suggestions (
                id, title, author, description, isbn, external_id,
                title_key, author_key, suggested_by, status, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(&input.title)
        .bind(&input.author)
        .bind(&input.description)
        .bind(&input.isbn)
        .bind(&input.external_id)
        .bind(match_key(&input.title))
        .bind(match_key(&input.author))
        .bind(suggested_by)
        .bind(SuggestionStatus::Pending.as_str())
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(StorageError::Sqlx)?;

        self.get_suggestion(&id).await
    }

    /// Get a single suggestion by ID
    pub async fn get_suggestion(&self, id: &str) -> StorageResult<Suggestion> {
        debug!("Fetching suggestion: {}", id);

        let row = sqlx::query(&format!("{} WHERE s.id = ?", SELECT_WITH_VOTES))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(StorageError::Sqlx)?
            .ok_or(StorageError::NotFound)?;

        row_to_suggestion(&row)
    }

    /// List suggestions, optionally filtered by status, in standing order
    pub async fn list_suggestions(
        &self,
        status: Option<SuggestionStatus>,
    ) -> StorageResult<Vec<Suggestion>> {
        debug!("Listing suggestions (status: {:?})", status);

        let rows = match status {
            Some(status) => {
                sqlx::query(&format!("{} WHERE s.status = ?", SELECT_WITH_VOTES))
                    .bind(status.as_str())
                    .fetch_all(&self.pool)
                    .await
            }
            None => sqlx::query(SELECT_WITH_VOTES).fetch_all(&self.pool).await,
        }
        .map_err(StorageError::Sqlx)?;

        let mut suggestions = rows
            .iter()
            .map(row_to_suggestion)
            .collect::<Result<Vec<_>, _>>()?;

        suggestions.sort_by(|a, b| {
            standing_order(
                a.vote_count,
                &a.created_at,
                &a.id,
                b.vote_count,
                &b.created_at,
                &b.id,
            )
        });

        Ok(suggestions)
    }

    /// Oldest non-rejected suggestion with this (normalized) ISBN
    pub async fn find_by_isbn(&self, isbn: &str) -> StorageResult<Option<Suggestion>> {
        self.find_blocking("s.isbn = ?", &[isbn]).await
    }

    /// Oldest non-rejected suggestion with this catalog ID
    pub async fn find_by_external_id(&self, external_id: &str) -> StorageResult<Option<Suggestion>> {
        self.find_blocking("s.external_id = ?", &[external_id]).await
    }

    /// Oldest non-rejected suggestion whose title and author match ignoring case and padding
    pub async fn find_by_title_author(
        &self,
        title: &str,
        author: &str,
    ) -> StorageResult<Option<Suggestion>> {
        let (title_key, author_key) = (match_key(title), match_key(author));
        self.find_blocking(
            "s.title_key = ? AND s.author_key = ?",
            &[title_key.as_str(), author_key.as_str()],
        )
        .await
    }

    // Rejected suggestions never block a resubmission
    async fn find_blocking(
        &self,
        condition: &str,
        values: &[&str],
    ) -> StorageResult<Option<Suggestion>> {
        let sql = format!(
            "{} WHERE {} AND s.status != ? ORDER BY s.created_at ASC, s.id ASC LIMIT 1",
            SELECT_WITH_VOTES, condition
        );

        let mut query = sqlx::query(&sql);
        for value in values {
            query = query.bind(*value);
        }

        let row = query
            .bind(SuggestionStatus::Rejected.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(StorageError::Sqlx)?;

        row.as_ref().map(row_to_suggestion).transpose()
    }

    /// Change a suggestion's status. Finalization metadata is left untouched.
    pub async fn set_status(&self, id: &str, status: SuggestionStatus) -> StorageResult<Suggestion> {
        debug!("Setting suggestion {} status to {}", id, status);

        let result = sqlx::query("UPDATE suggestions SET status = ?, updated_at = ? WHERE id = ?")
            .bind(status.as_str())
            .bind(Utc::now())
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(StorageError::Sqlx)?;

        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }

        self.get_suggestion(id).await
    }

    /// Voter IDs currently in a suggestion's vote set
    pub async fn list_voters(&self, id: &str) -> StorageResult<Vec<String>> {
        sqlx::query_scalar(
            "SELECT voter_id FROM suggestion_votes WHERE suggestion_id = ? ORDER BY voted_at ASC",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await
        .map_err(StorageError::Sqlx)
    }
}

// ==================== Transaction-scoped queries ====================

pub(crate) async fn status_of(
    conn: &mut SqliteConnection,
    id: &str,
) -> StorageResult<Option<SuggestionStatus>> {
    let status: Option<String> = sqlx::query_scalar("SELECT status FROM suggestions WHERE id = ?")
        .bind(id)
        .fetch_optional(&mut *conn)
        .await
        .map_err(StorageError::Sqlx)?;

    status.map(|s| parse_status(&s)).transpose()
}

pub(crate) async fn count_votes(conn: &mut SqliteConnection, id: &str) -> StorageResult<i64> {
    sqlx::query_scalar("SELECT COUNT(*) FROM suggestion_votes WHERE suggestion_id = ?")
        .bind(id)
        .fetch_one(&mut *conn)
        .await
        .map_err(StorageError::Sqlx)
}

/// Every pending suggestion with its vote count at this point in the transaction
pub(crate) async fn pending_candidates(
    conn: &mut SqliteConnection,
) -> StorageResult<Vec<Candidate>> {
    let rows = sqlx::query(
        r#"
        SELECT s.id, s.title, s.created_at, COUNT(v.voter_id) AS vote_count
        FROM suggestions s
        LEFT JOIN suggestion_votes v ON v.suggestion_id = s.id
        WHERE s.status = ?
        GROUP BY s.id
        "#,
    )
    .bind(SuggestionStatus::Pending.as_str())
    .fetch_all(&mut *conn)
    .await
    .map_err(StorageError::Sqlx)?;

    rows.iter()
        .map(|row| {
            Ok(Candidate {
                suggestion_id: row.try_get("id")?,
                title: row.try_get("title")?,
                vote_count: row.try_get("vote_count")?,
                created_at: row.try_get("created_at")?,
            })
        })
        .collect::<Result<Vec<_>, sqlx::Error>>()
        .map_err(StorageError::Sqlx)
}

/// Mark a pending suggestion as a round winner
pub(crate) async fn stamp_winner(
    conn: &mut SqliteConnection,
    id: &str,
    placement: u8,
    round_id: &str,
    won_at: DateTime<Utc>,
) -> StorageResult<()> {
    let result = sqlx::query(
        r#"
        UPDATE suggestions
        SET status = ?, placement = ?, voting_round_id = ?, won_at = ?, updated_at = ?
        WHERE id = ? AND status = ?
        "#,
    )
    .bind(SuggestionStatus::Read.as_str())
    .bind(placement as i64)
    .bind(round_id)
    .bind(won_at)
    .bind(won_at)
    .bind(id)
    .bind(SuggestionStatus::Pending.as_str())
    .execute(&mut *conn)
    .await
    .map_err(StorageError::Sqlx)?;

    if result.rows_affected() != 1 {
        return Err(StorageError::Database(format!(
            "Suggestion {} is no longer pending",
            id
        )));
    }
    Ok(())
}

/// Empty the vote sets of all pending suggestions; returns the number of votes removed
pub(crate) async fn clear_pending_votes(conn: &mut SqliteConnection) -> StorageResult<u64> {
    let result = sqlx::query(
        r#"
        DELETE FROM suggestion_votes
        WHERE suggestion_id IN (SELECT id FROM suggestions WHERE status = ?)
        "#,
    )
    .bind(SuggestionStatus::Pending.as_str())
    .execute(&mut *conn)
    .await
    .map_err(StorageError::Sqlx)?;

    Ok(result.rows_affected())
}

fn parse_status(value: &str) -> StorageResult<SuggestionStatus> {
    value
        .parse()
        .map_err(|e| StorageError::Database(format!("Invalid suggestion status: {}", e)))
}

pub(crate) fn row_to_suggestion(row: &SqliteRow) -> StorageResult<Suggestion> {
    let status: String = row.try_get("status")?;
    let placement: Option<i64> = row.try_get("placement")?;
    let placement = placement
        .map(|p| {
            u8::try_from(p)
                .map_err(|_| StorageError::Database(format!("Invalid placement: {}", p)))
        })
        .transpose()?;

    Ok(Suggestion {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        author: row.try_get("author")?,
        description: row.try_get("description")?,
        isbn: row.try_get("isbn")?,
        external_id: row.try_get("external_id")?,
        suggested_by: row.try_get("suggested_by")?,
        status: parse_status(&status)?,
        vote_count: row.try_get("vote_count")?,
        placement,
        voting_round_id: row.try_get("voting_round_id")?,
        won_at: row.try_get("won_at")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}
