// ABOUTME: Integration tests for suggestion submission, duplicate checks, meetings, and legacy import
// ABOUTME: Exercises the voting service against in-memory SQLite

mod common;

use bookclub_core::{
    MeetingCreateInput, RoundStatus, SuggestionCreateInput, SuggestionStatus, ValidationError,
};
use bookclub_storage::connect_in_memory;
use bookclub_voting::{DuplicateQuery, MatchType, VotingError, VotingService};
use chrono::{Duration, Utc};
use common::*;
use pretty_assertions::assert_eq;

fn dune() -> SuggestionCreateInput {
    SuggestionCreateInput {
        title: "  Dune ".to_string(),
        author: "Frank Herbert".to_string(),
        description: Some("   ".to_string()),
        isbn: Some("978-0-441-17271-9".to_string()),
        external_id: Some("OL893415W".to_string()),
    }
}

#[tokio::test]
async fn test_submit_creates_normalized_pending_suggestion() {
    let (_pool, service) = service().await;

    let created = service.submit_suggestion("alice", dune()).await.unwrap();

    assert_eq!(created.title, "Dune");
    assert_eq!(created.description, None);
    assert_eq!(created.isbn.as_deref(), Some("9780441172719"));
    assert_eq!(created.status, SuggestionStatus::Pending);
    assert_eq!(created.suggested_by, "alice");
    assert_eq!(created.vote_count, 0);
    assert!(created.id.starts_with("sug-"));
}

#[tokio::test]
async fn test_submit_requires_approved_member() {
    let (_pool, service) = service().await;

    let err = service.submit_suggestion("mallory", dune()).await.unwrap_err();

    assert!(matches!(err, VotingError::Unauthorized));
}

#[tokio::test]
async fn test_submit_rejects_invalid_input() {
    let (_pool, service) = service().await;

    let mut input = dune();
    input.title = "   ".to_string();
    let err = service.submit_suggestion("alice", input).await.unwrap_err();

    assert!(matches!(
        err,
        VotingError::Validation(ValidationError::EmptyField("title"))
    ));
}

#[tokio::test]
async fn test_submit_rejects_duplicates() {
    let (_pool, service) = service().await;
    let existing = service.submit_suggestion("alice", dune()).await.unwrap();

    let err = service
        .submit_suggestion(
            "bob",
            SuggestionCreateInput {
                title: "DUNE".to_string(),
                author: "frank herbert".to_string(),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();

    match err {
        VotingError::DuplicateSuggestion {
            match_type,
            existing_id,
        } => {
            assert_eq!(match_type, MatchType::TitleAuthor);
            assert_eq!(existing_id, existing.id);
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn test_check_duplicate_matches_isbn_despite_different_title() {
    let (_pool, service) = service().await;
    let existing = service.submit_suggestion("alice", dune()).await.unwrap();

    let check = service
        .check_duplicate(&DuplicateQuery {
            title: "Completely Different".to_string(),
            author: "Someone Else".to_string(),
            isbn: Some("9780441172719".to_string()),
            external_id: None,
        })
        .await;

    assert!(check.is_duplicate);
    assert_eq!(check.match_type, Some(MatchType::Isbn));
    assert_eq!(check.matched_suggestion.unwrap().id, existing.id);
}

#[tokio::test]
async fn test_isbn_match_takes_priority_over_title_match() {
    let (_pool, service) = service().await;
    let by_title = service
        .submit_suggestion(
            "alice",
            SuggestionCreateInput {
                title: "Dune".to_string(),
                author: "Frank Herbert".to_string(),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    let by_isbn = service
        .submit_suggestion(
            "bob",
            SuggestionCreateInput {
                title: "Dune (Deluxe Edition)".to_string(),
                author: "F. Herbert".to_string(),
                isbn: Some("9780441172719".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_ne!(by_title.id, by_isbn.id);

    let check = service
        .check_duplicate(&DuplicateQuery {
            title: "Dune".to_string(),
            author: "Frank Herbert".to_string(),
            isbn: Some("978-0-441-17271-9".to_string()),
            external_id: None,
        })
        .await;

    assert_eq!(check.match_type, Some(MatchType::Isbn));
    assert_eq!(check.matched_suggestion.unwrap().id, by_isbn.id);
}

#[tokio::test]
async fn test_check_duplicate_matches_external_id() {
    let (_pool, service) = service().await;
    let existing = service.submit_suggestion("alice", dune()).await.unwrap();

    let check = service
        .check_duplicate(&DuplicateQuery {
            title: "Other".to_string(),
            author: "Other".to_string(),
            isbn: None,
            external_id: Some(" OL893415W ".to_string()),
        })
        .await;

    assert_eq!(check.match_type, Some(MatchType::ExternalId));
    assert_eq!(check.matched_suggestion.unwrap().id, existing.id);
}

#[tokio::test]
async fn test_title_author_match_folds_non_ascii_case() {
    let (_pool, service) = service().await;
    let existing = service
        .submit_suggestion(
            "alice",
            SuggestionCreateInput {
                title: "Éducation sentimentale".to_string(),
                author: "Gustave Flaubert".to_string(),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let check = service
        .check_duplicate(&DuplicateQuery {
            title: "  ÉDUCATION SENTIMENTALE".to_string(),
            author: "gustave flaubert".to_string(),
            ..Default::default()
        })
        .await;
    assert_eq!(check.match_type, Some(MatchType::TitleAuthor));
    assert_eq!(check.matched_suggestion.unwrap().id, existing.id);

    let other_author = service
        .check_duplicate(&DuplicateQuery {
            title: "Éducation sentimentale".to_string(),
            author: "Someone Else".to_string(),
            ..Default::default()
        })
        .await;
    assert!(!other_author.is_duplicate);
}

#[tokio::test]
async fn test_non_ascii_isbn_is_rejected_without_panicking() {
    let (_pool, service) = service().await;
    service.submit_suggestion("alice", dune()).await.unwrap();

    let check = service
        .check_duplicate(&DuplicateQuery {
            title: "Something".to_string(),
            author: "Someone".to_string(),
            isbn: Some("12345678ä".to_string()),
            external_id: None,
        })
        .await;
    assert!(!check.is_duplicate);

    let mut input = dune();
    input.title = "Children of Dune".to_string();
    input.external_id = None;
    input.isbn = Some("12345678ä".to_string());
    let err = service.submit_suggestion("bob", input).await.unwrap_err();

    assert!(matches!(
        err,
        VotingError::Validation(ValidationError::InvalidIsbn(_))
    ));
}

#[tokio::test]
async fn test_rejected_suggestion_can_be_resubmitted() {
    let (_pool, service) = service().await;
    let first = service.submit_suggestion("alice", dune()).await.unwrap();

    service
        .set_suggestion_status(ADMIN, &first.id, SuggestionStatus::Rejected)
        .await
        .unwrap();

    let again = service.submit_suggestion("bob", dune()).await.unwrap();
    assert_ne!(again.id, first.id);
}

#[tokio::test]
async fn test_duplicate_check_fails_open_when_store_is_gone() {
    let (pool, service) = service().await;
    service.submit_suggestion("alice", dune()).await.unwrap();
    pool.close().await;

    let check = service
        .check_duplicate(&DuplicateQuery {
            title: "Dune".to_string(),
            author: "Frank Herbert".to_string(),
            ..Default::default()
        })
        .await;

    assert!(!check.is_duplicate);
    assert_eq!(check.match_type, None);
}

#[tokio::test]
async fn test_closed_store_surfaces_as_unavailable() {
    let (pool, service) = service().await;
    pool.close().await;

    let err = service.current_round().await.unwrap_err();

    assert!(matches!(err, VotingError::StoreUnavailable(_)));
    assert!(err.is_retryable());
}

#[tokio::test]
async fn test_status_changes_are_admin_only_and_keep_history() {
    let (pool, service) = service().await;
    seed_suggestion(&pool, "a", "Book A", "pending", minutes_ago(1)).await;
    service.finalize(ADMIN).await.unwrap();

    assert!(matches!(
        service
            .set_suggestion_status("alice", "a", SuggestionStatus::Approved)
            .await
            .unwrap_err(),
        VotingError::Unauthorized
    ));

    let updated = service
        .set_suggestion_status(ADMIN, "a", SuggestionStatus::CurrentlyReading)
        .await
        .unwrap();
    assert_eq!(updated.status, SuggestionStatus::CurrentlyReading);
    assert_eq!(updated.placement, Some(1));
    assert!(updated.voting_round_id.is_some());

    assert!(matches!(
        service
            .set_suggestion_status(ADMIN, "missing", SuggestionStatus::Read)
            .await
            .unwrap_err(),
        VotingError::NotFound(_)
    ));
}

#[tokio::test]
async fn test_list_suggestions_filters_and_ranks() {
    let (pool, service) = service().await;
    seed_suggestion(&pool, "old", "Old", "pending", minutes_ago(30)).await;
    seed_suggestion(&pool, "new", "New", "pending", minutes_ago(10)).await;
    seed_suggestion(&pool, "popular", "Popular", "pending", minutes_ago(5)).await;
    seed_suggestion(&pool, "gone", "Gone", "rejected", minutes_ago(40)).await;
    seed_votes(&pool, "popular", 2).await;

    let pending: Vec<_> = service
        .list_suggestions(Some(SuggestionStatus::Pending))
        .await
        .unwrap()
        .into_iter()
        .map(|s| s.id)
        .collect();
    assert_eq!(pending, vec!["popular", "old", "new"]);

    assert_eq!(service.list_suggestions(None).await.unwrap().len(), 4);
}

#[tokio::test]
async fn test_meetings_are_admin_created_and_listed_by_date() {
    let (pool, service) = service().await;
    seed_meeting(&pool, 10, "18:00").await;
    seed_meeting(&pool, 3, "19:00").await;
    seed_meeting(&pool, -3, "19:00").await;

    let input = MeetingCreateInput {
        date: Utc::now().date_naive() + Duration::days(3),
        time: "17:00".to_string(),
        location: "Cafe".to_string(),
    };
    assert!(matches!(
        service.create_meeting("alice", input.clone()).await.unwrap_err(),
        VotingError::Unauthorized
    ));
    let created = service.create_meeting(ADMIN, input).await.unwrap();
    assert!(!created.auto_assigned);

    let upcoming = service.list_upcoming_meetings().await.unwrap();
    let slots: Vec<_> = upcoming.iter().map(|m| m.time.as_str()).collect();
    assert_eq!(slots, vec!["17:00", "19:00", "18:00"]);

    let blank = MeetingCreateInput {
        date: Utc::now().date_naive(),
        time: "19:00".to_string(),
        location: " ".to_string(),
    };
    assert!(matches!(
        service.create_meeting(ADMIN, blank).await.unwrap_err(),
        VotingError::Validation(ValidationError::EmptyField("location"))
    ));
}

#[tokio::test]
async fn test_legacy_winners_are_imported_into_round_zero() {
    let pool = connect_in_memory().await.unwrap();

    seed_suggestion(&pool, "old-1", "Old One", "read", minutes_ago(300)).await;
    seed_suggestion(&pool, "old-2", "Old Two", "read", minutes_ago(200)).await;
    seed_suggestion(&pool, "fresh", "Fresh", "pending", minutes_ago(100)).await;
    for (id, placement) in [("old-1", 1), ("old-2", 2)] {
        sqlx::query("UPDATE suggestions SET placement = ?, won_at = ? WHERE id = ?")
            .bind(placement)
            .bind(minutes_ago(150))
            .bind(id)
            .execute(&pool)
            .await
            .unwrap();
    }

    let service = VotingService::new(pool.clone(), members());
    service.initialize().await.unwrap();
    service.initialize().await.unwrap();

    let legacy = service.get_round(0).await.unwrap();
    assert_eq!(legacy.status, RoundStatus::Completed);
    let placements: Vec<_> = legacy
        .winners
        .iter()
        .map(|w| (w.suggestion_id.as_str(), w.placement))
        .collect();
    assert_eq!(placements, vec![("old-1", 1), ("old-2", 2)]);

    let old = service.get_suggestion("old-1").await.unwrap();
    assert_eq!(old.voting_round_id.as_deref(), Some(legacy.id.as_str()));

    let current = service.current_round().await.unwrap();
    assert!(current.is_active);
    assert_eq!(current.round.unwrap().round_number, 1);
    assert_eq!(service.list_rounds().await.unwrap().len(), 2);
}
