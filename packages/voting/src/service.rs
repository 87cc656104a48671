// ABOUTME: Voting service facade used by the HTTP API and the CLI
// ABOUTME: Applies membership, admin, and rate-limit gates and bounds every store call with a timeout

use bookclub_core::{
    validate_suggestion_input, Meeting, MeetingCreateInput, RoundStatus, Suggestion,
    SuggestionCreateInput, SuggestionStatus, VotingRound,
};
use bookclub_storage::StorageError;
use chrono::Utc;
use sqlx::SqlitePool;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::access::{MemberDirectory, NoRateLimit, VoteRateLimiter};
use crate::duplicates::DuplicateDetector;
use crate::error::{VotingError, VotingResult};
use crate::meetings::MeetingStorage;
use crate::rounds::RoundStorage;
use crate::suggestions::SuggestionStorage;
use crate::types::{
    CurrentRound, DuplicateCheck, DuplicateQuery, FinalizeOutcome, ResetOutcome, VoteOutcome,
};
use crate::{finalize, ledger, legacy, reset};

pub const DEFAULT_STORE_TIMEOUT: Duration = Duration::from_secs(10);

pub struct VotingService {
    pool: SqlitePool,
    suggestions: SuggestionStorage,
    rounds: RoundStorage,
    meetings: MeetingStorage,
    duplicates: DuplicateDetector,
    members: Arc<dyn MemberDirectory>,
    rate_limiter: Arc<dyn VoteRateLimiter>,
    store_timeout: Duration,
}

impl VotingService {
    pub fn new(pool: SqlitePool, members: Arc<dyn MemberDirectory>) -> Self {
        Self {
            suggestions: SuggestionStorage::new(pool.clone()),
            rounds: RoundStorage::new(pool.clone()),
            meetings: MeetingStorage::new(pool.clone()),
            duplicates: DuplicateDetector::new(pool.clone()),
            pool,
            members,
            rate_limiter: Arc::new(NoRateLimit),
            store_timeout: DEFAULT_STORE_TIMEOUT,
        }
    }

    pub fn with_rate_limiter(mut self, rate_limiter: Arc<dyn VoteRateLimiter>) -> Self {
        self.rate_limiter = rate_limiter;
        self
    }

    pub fn with_store_timeout(mut self, store_timeout: Duration) -> Self {
        self.store_timeout = store_timeout;
        self
    }

    pub fn members(&self) -> &dyn MemberDirectory {
        self.members.as_ref()
    }

    /// Startup housekeeping: import legacy winners, then make sure a first round exists.
    /// Safe to run from several processes at once.
    pub async fn initialize(&self) -> VotingResult<()> {
        let now = Utc::now();

        self.bounded("legacy import", legacy::migrate_legacy_winners(&self.pool, now))
            .await?;

        let opened = self
            .bounded("initial round", async {
                self.rounds.ensure_initial_round(now).await.map_err(VotingError::from)
            })
            .await;

        match opened {
            Ok(_) => Ok(()),
            // Someone else opened it first
            Err(VotingError::RoundConflict) => {
                debug!("Initial round created concurrently");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    // ==================== Votes ====================

    pub async fn toggle_vote(&self, voter_id: &str, suggestion_id: &str) -> VotingResult<VoteOutcome> {
        if !self.members.is_approved(voter_id) {
            return Err(VotingError::Unauthorized);
        }
        if !self.rate_limiter.check(voter_id) {
            debug!("Vote rate limit hit for {}", voter_id);
            return Err(VotingError::RateLimited);
        }

        self.bounded(
            "toggle vote",
            ledger::toggle_vote(&self.pool, voter_id, suggestion_id, Utc::now()),
        )
        .await
    }

    // ==================== Rounds ====================

    pub async fn finalize(&self, admin_id: &str) -> VotingResult<FinalizeOutcome> {
        self.require_admin(admin_id)?;
        self.bounded(
            "finalize round",
            finalize::finalize_round(&self.pool, admin_id, Utc::now()),
        )
        .await
    }

    pub async fn reset(&self, admin_id: &str) -> VotingResult<ResetOutcome> {
        self.require_admin(admin_id)?;
        self.bounded(
            "reset round",
            reset::reset_round(&self.pool, admin_id, Utc::now()),
        )
        .await
    }

    /// Read-only; callers use `is_active` to decide whether to offer voting
    pub async fn current_round(&self) -> VotingResult<CurrentRound> {
        let round = self
            .bounded("current round", async {
                self.rounds.current_round().await.map_err(VotingError::from)
            })
            .await?;

        let is_active = round
            .as_ref()
            .map(|r| r.status == RoundStatus::Active)
            .unwrap_or(false);

        Ok(CurrentRound { round, is_active })
    }

    pub async fn list_rounds(&self) -> VotingResult<Vec<VotingRound>> {
        self.bounded("list rounds", async {
            self.rounds.list_rounds().await.map_err(VotingError::from)
        })
        .await
    }

    pub async fn get_round(&self, round_number: i64) -> VotingResult<VotingRound> {
        self.bounded("get round", async {
            self.rounds
                .get_by_number(round_number)
                .await
                .map_err(|e| not_found_as(e, format!("round #{}", round_number)))
        })
        .await
    }

    // ==================== Suggestions ====================

    pub async fn check_duplicate(&self, query: &DuplicateQuery) -> DuplicateCheck {
        match tokio::time::timeout(self.store_timeout, self.duplicates.check(query)).await {
            Ok(check) => check,
            Err(_) => {
                warn!("Duplicate check timed out, allowing submission");
                DuplicateCheck::not_duplicate()
            }
        }
    }

    pub async fn submit_suggestion(
        &self,
        user_id: &str,
        input: SuggestionCreateInput,
    ) -> VotingResult<Suggestion> {
        if !self.members.is_approved(user_id) {
            return Err(VotingError::Unauthorized);
        }

        let input = validate_suggestion_input(input)?;

        let check = self
            .check_duplicate(&DuplicateQuery {
                title: input.title.clone(),
                author: input.author.clone(),
                isbn: input.isbn.clone(),
                external_id: input.external_id.clone(),
            })
            .await;

        if let (Some(match_type), Some(existing)) = (check.match_type, check.matched_suggestion) {
            return Err(VotingError::DuplicateSuggestion {
                match_type,
                existing_id: existing.id,
            });
        }

        let created = self
            .bounded("create suggestion", async {
                self.suggestions
                    .create_suggestion(user_id, input)
                    .await
                    .map_err(VotingError::from)
            })
            .await?;

        info!("Suggestion {} added by {}: {}", created.id, user_id, created.title);
        Ok(created)
    }

    pub async fn list_suggestions(
        &self,
        status: Option<SuggestionStatus>,
    ) -> VotingResult<Vec<Suggestion>> {
        self.bounded("list suggestions", async {
            self.suggestions.list_suggestions(status).await.map_err(VotingError::from)
        })
        .await
    }

    pub async fn get_suggestion(&self, id: &str) -> VotingResult<Suggestion> {
        self.bounded("get suggestion", async {
            self.suggestions
                .get_suggestion(id)
                .await
                .map_err(|e| not_found_as(e, format!("suggestion {}", id)))
        })
        .await
    }

    pub async fn list_voters(&self, suggestion_id: &str) -> VotingResult<Vec<String>> {
        self.get_suggestion(suggestion_id).await?;
        self.bounded("list voters", async {
            self.suggestions
                .list_voters(suggestion_id)
                .await
                .map_err(VotingError::from)
        })
        .await
    }

    pub async fn set_suggestion_status(
        &self,
        admin_id: &str,
        id: &str,
        status: SuggestionStatus,
    ) -> VotingResult<Suggestion> {
        self.require_admin(admin_id)?;

        let updated = self
            .bounded("set suggestion status", async {
                self.suggestions
                    .set_status(id, status)
                    .await
                    .map_err(|e| not_found_as(e, format!("suggestion {}", id)))
            })
            .await?;

        info!("Suggestion {} set to {} by {}", id, status, admin_id);
        Ok(updated)
    }

    // ==================== Meetings ====================

    pub async fn create_meeting(
        &self,
        admin_id: &str,
        input: MeetingCreateInput,
    ) -> VotingResult<Meeting> {
        self.require_admin(admin_id)?;

        if input.location.trim().is_empty() {
            return Err(bookclub_core::ValidationError::EmptyField("location").into());
        }
        if input.time.trim().is_empty() {
            return Err(bookclub_core::ValidationError::EmptyField("time").into());
        }

        let meeting = self
            .bounded("create meeting", async {
                self.meetings.create_meeting(input).await.map_err(VotingError::from)
            })
            .await?;

        info!("Meeting {} scheduled for {} by {}", meeting.id, meeting.date, admin_id);
        Ok(meeting)
    }

    pub async fn list_upcoming_meetings(&self) -> VotingResult<Vec<Meeting>> {
        let today = Utc::now().date_naive();
        self.bounded("list meetings", async {
            self.meetings.list_upcoming(today).await.map_err(VotingError::from)
        })
        .await
    }

    // ==================== Helpers ====================

    fn require_admin(&self, user_id: &str) -> VotingResult<()> {
        if self.members.is_admin(user_id) {
            Ok(())
        } else {
            Err(VotingError::Unauthorized)
        }
    }

    /// Runs `fut` under the store timeout. A timed-out transaction is dropped, which rolls it back.
    async fn bounded<T, F>(&self, operation: &str, fut: F) -> VotingResult<T>
    where
        F: Future<Output = VotingResult<T>>,
    {
        match tokio::time::timeout(self.store_timeout, fut).await {
            Ok(result) => result,
            Err(_) => {
                warn!("{} timed out after {:?}", operation, self.store_timeout);
                Err(VotingError::StoreUnavailable(format!(
                    "{} timed out after {:?}",
                    operation, self.store_timeout
                )))
            }
        }
    }
}

fn not_found_as(err: StorageError, what: String) -> VotingError {
    match err {
        StorageError::NotFound => VotingError::NotFound(what),
        other => other.into(),
    }
}
