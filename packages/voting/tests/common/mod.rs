// ABOUTME: Shared fixtures for voting integration tests
// ABOUTME: Seeds suggestions, votes, and meetings with controlled timestamps

#![allow(dead_code)]

use bookclub_core::{Meeting, MeetingCreateInput};
use bookclub_storage::{connect, connect_in_memory, StorageConfig};
use bookclub_voting::{MeetingStorage, StaticMemberDirectory, VotingService};
use chrono::{DateTime, Duration, TimeZone, Utc};
use sqlx::SqlitePool;
use std::sync::Arc;
use tempfile::TempDir;

pub const ADMIN: &str = "admin";
pub const MEMBERS: [&str; 4] = ["alice", "bob", "carol", "dave"];

pub fn members() -> Arc<StaticMemberDirectory> {
    let approved = MEMBERS
        .iter()
        .map(|m| m.to_string())
        .chain((0..16).map(|i| format!("voter-{}", i)));
    Arc::new(StaticMemberDirectory::new(approved, [ADMIN]))
}

/// In-memory pool with round #1 open
pub async fn service() -> (SqlitePool, VotingService) {
    let pool = connect_in_memory().await.unwrap();
    let service = VotingService::new(pool.clone(), members());
    service.initialize().await.unwrap();
    (pool, service)
}

/// File-backed pool so several connections really contend for the write lock
pub async fn file_service(dir: &TempDir) -> (SqlitePool, Arc<VotingService>) {
    let config = StorageConfig {
        path: dir.path().join("bookclub.db"),
        enable_wal: true,
        max_connections: 8,
        busy_timeout_seconds: 10,
    };
    let pool = connect(&config).await.unwrap();
    let service = VotingService::new(pool.clone(), members());
    service.initialize().await.unwrap();
    (pool, Arc::new(service))
}

pub fn minutes_ago(minutes: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, 1, 12, 0, 0).unwrap() - Duration::minutes(minutes)
}

/// Insert a suggestion directly so its creation time is fixed
pub async fn seed_suggestion(
    pool: &SqlitePool,
    id: &str,
    title: &str,
    status: &str,
    created_at: DateTime<Utc>,
) {
    sqlx::query(
        r#"
        INSERT INTO suggestions (
            id, title, author, title_key, author_key, suggested_by, status, created_at, updated_at
        ) VALUES (?, ?, 'Some Author', ?, 'some author', 'alice', ?, ?, ?)
        "#,
    )
    .bind(id)
    .bind(title)
    .bind(title.to_lowercase())
    .bind(status)
    .bind(created_at)
    .bind(created_at)
    .execute(pool)
    .await
    .unwrap();
}

/// Give a suggestion `count` votes from distinct seeded voters
pub async fn seed_votes(pool: &SqlitePool, suggestion_id: &str, count: usize) {
    for i in 0..count {
        sqlx::query(
            "INSERT INTO suggestion_votes (suggestion_id, voter_id, voted_at) VALUES (?, ?, ?)",
        )
        .bind(suggestion_id)
        .bind(format!("voter-{}", i))
        .bind(Utc::now())
        .execute(pool)
        .await
        .unwrap();
    }
}

pub async fn seed_meeting(pool: &SqlitePool, days_from_now: i64, time: &str) -> Meeting {
    MeetingStorage::new(pool.clone())
        .create_meeting(MeetingCreateInput {
            date: Utc::now().date_naive() + Duration::days(days_from_now),
            time: time.to_string(),
            location: "Library".to_string(),
        })
        .await
        .unwrap()
}

pub async fn live_round_count(pool: &SqlitePool) -> i64 {
    sqlx::query_scalar(
        "SELECT COUNT(*) FROM voting_rounds WHERE status IN ('active', 'finalized')",
    )
    .fetch_one(pool)
    .await
    .unwrap()
}
