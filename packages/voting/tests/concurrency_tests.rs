// ABOUTME: Concurrency tests against a file-backed SQLite database
// ABOUTME: Several pool connections race on finalize, reset, and vote toggles

mod common;

use bookclub_core::RoundStatus;
use bookclub_voting::VotingError;
use common::*;
use pretty_assertions::assert_eq;
use tempfile::TempDir;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_finalize_has_exactly_one_winner_set() {
    let dir = TempDir::new().unwrap();
    let (pool, service) = file_service(&dir).await;

    for (i, id) in ["a", "b", "c", "d"].iter().enumerate() {
        seed_suggestion(&pool, id, id, "pending", minutes_ago(i as i64)).await;
        seed_votes(&pool, id, 4 - i).await;
    }

    let first = tokio::spawn({
        let service = service.clone();
        async move { service.finalize(ADMIN).await }
    });
    let second = tokio::spawn({
        let service = service.clone();
        async move { service.finalize(ADMIN).await }
    });

    let results = [first.await.unwrap(), second.await.unwrap()];
    let succeeded = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(succeeded, 1);

    for result in &results {
        if let Err(e) = result {
            assert!(
                matches!(e, VotingError::NoActiveRound | VotingError::RoundConflict),
                "unexpected error: {:?}",
                e
            );
        }
    }

    let winner_rows: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM round_winners")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(winner_rows, 3);

    let stamped: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM suggestions WHERE placement IS NOT NULL")
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(stamped, 3);
    assert_eq!(live_round_count(&pool).await, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_reset_opens_one_next_round() {
    let dir = TempDir::new().unwrap();
    let (pool, service) = file_service(&dir).await;
    seed_suggestion(&pool, "a", "Book A", "pending", minutes_ago(1)).await;
    service.finalize(ADMIN).await.unwrap();

    let handles: Vec<_> = (0..3)
        .map(|_| {
            let service = service.clone();
            tokio::spawn(async move { service.reset(ADMIN).await })
        })
        .collect();

    let mut succeeded = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(outcome) => {
                succeeded += 1;
                assert_eq!(outcome.round_number, 2);
            }
            Err(e) => assert!(
                matches!(e, VotingError::NoFinalizedRound | VotingError::RoundConflict),
                "unexpected error: {:?}",
                e
            ),
        }
    }
    assert_eq!(succeeded, 1);

    let rounds = service.list_rounds().await.unwrap();
    let statuses: Vec<_> = rounds.iter().map(|r| (r.round_number, r.status)).collect();
    assert_eq!(
        statuses,
        vec![(2, RoundStatus::Active), (1, RoundStatus::Completed)]
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_voters_on_one_suggestion_are_all_counted() {
    let dir = TempDir::new().unwrap();
    let (pool, service) = file_service(&dir).await;
    seed_suggestion(&pool, "a", "Book A", "pending", minutes_ago(1)).await;

    let handles: Vec<_> = (0..12)
        .map(|i| {
            let service = service.clone();
            tokio::spawn(async move { service.toggle_vote(&format!("voter-{}", i), "a").await })
        })
        .collect();

    for handle in handles {
        assert!(handle.await.unwrap().unwrap().voted);
    }

    assert_eq!(service.get_suggestion("a").await.unwrap().vote_count, 12);
    assert_eq!(service.list_voters("a").await.unwrap().len(), 12);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_double_toggles_racing_leave_no_duplicates() {
    let dir = TempDir::new().unwrap();
    let (pool, service) = file_service(&dir).await;
    seed_suggestion(&pool, "a", "Book A", "pending", minutes_ago(1)).await;

    // Each voter toggles twice concurrently: net effect is zero
    let handles: Vec<_> = (0..6)
        .flat_map(|i| [i, i])
        .map(|i| {
            let service = service.clone();
            tokio::spawn(async move { service.toggle_vote(&format!("voter-{}", i), "a").await })
        })
        .collect();

    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    assert_eq!(service.get_suggestion("a").await.unwrap().vote_count, 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_votes_racing_finalize_are_never_half_applied() {
    let dir = TempDir::new().unwrap();
    let (pool, service) = file_service(&dir).await;
    seed_suggestion(&pool, "a", "Book A", "pending", minutes_ago(2)).await;
    for id in ["b", "c", "d"] {
        seed_suggestion(&pool, id, id, "pending", minutes_ago(1)).await;
    }

    let voters: Vec<_> = (0..8)
        .map(|i| {
            let service = service.clone();
            tokio::spawn(async move { service.toggle_vote(&format!("voter-{}", i), "d").await })
        })
        .collect();
    let finalize = tokio::spawn({
        let service = service.clone();
        async move { service.finalize(ADMIN).await }
    });

    let outcome = finalize.await.unwrap().unwrap();
    let mut accepted = 0;
    for handle in voters {
        match handle.await.unwrap() {
            Ok(_) => accepted += 1,
            Err(e) => assert!(matches!(e, VotingError::VotingLocked | VotingError::NotVotable { .. })),
        }
    }

    // Whatever votes landed before the lock are exactly what the ranking saw
    let d = service.get_suggestion("d").await.unwrap();
    assert_eq!(d.vote_count, accepted);
    if let Some(winner) = outcome.winners.iter().find(|w| w.suggestion_id == "d") {
        assert_eq!(winner.vote_count_snapshot, accepted);
    }
}
