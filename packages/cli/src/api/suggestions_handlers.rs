// ABOUTME: HTTP request handlers for book suggestions and votes
// ABOUTME: Listing, submission with duplicate checks, status changes, and vote toggling

use axum::{
    extract::{Path, Query, State},
    response::Response,
    Json,
};
use bookclub_core::{SuggestionCreateInput, SuggestionStatus};
use bookclub_voting::{DuplicateQuery, VotingError};
use serde::Deserialize;
use tracing::info;

use super::identity::CallerId;
use super::response::{created, ok};
use super::AppState;
use crate::error::{ApiResult, AppError};

#[derive(Deserialize)]
pub struct ListSuggestionsQuery {
    pub status: Option<String>,
}

/// List suggestions in standing order, optionally filtered by status
pub async fn list_suggestions(
    State(state): State<AppState>,
    Query(params): Query<ListSuggestionsQuery>,
) -> ApiResult<Response> {
    let status = params
        .status
        .as_deref()
        .map(str::parse::<SuggestionStatus>)
        .transpose()
        .map_err(VotingError::from)?;

    let suggestions = state.service.list_suggestions(status).await?;
    Ok(ok(suggestions))
}

pub async fn get_suggestion(
    State(state): State<AppState>,
    Path(suggestion_id): Path<String>,
) -> ApiResult<Response> {
    let suggestion = state.service.get_suggestion(&suggestion_id).await?;
    Ok(ok(suggestion))
}

/// Submit a new book suggestion
pub async fn create_suggestion(
    State(state): State<AppState>,
    CallerId(user_id): CallerId,
    Json(request): Json<SuggestionCreateInput>,
) -> ApiResult<Response> {
    info!("Suggestion submitted by {}: {}", user_id, request.title);

    let suggestion = state.service.submit_suggestion(&user_id, request).await?;
    Ok(created(suggestion))
}

/// Report whether a book has already been suggested. Never fails on store errors.
pub async fn check_duplicate(
    State(state): State<AppState>,
    Json(query): Json<DuplicateQuery>,
) -> ApiResult<Response> {
    let check = state.service.check_duplicate(&query).await;
    Ok(ok(check))
}

pub async fn list_voters(
    State(state): State<AppState>,
    Path(suggestion_id): Path<String>,
) -> ApiResult<Response> {
    let voters = state.service.list_voters(&suggestion_id).await?;
    Ok(ok(voters))
}

/// Add or remove the caller's vote
pub async fn toggle_vote(
    State(state): State<AppState>,
    CallerId(voter_id): CallerId,
    Path(suggestion_id): Path<String>,
) -> ApiResult<Response> {
    match state.service.toggle_vote(&voter_id, &suggestion_id).await {
        Ok(outcome) => Ok(ok(outcome)),
        Err(VotingError::RateLimited) => Err(AppError::rate_limited(state.vote_retry_after)),
        Err(e) => Err(e.into()),
    }
}

#[derive(Deserialize)]
pub struct UpdateStatusRequest {
    pub status: String,
}

/// Move a suggestion to another status (admin only)
pub async fn update_status(
    State(state): State<AppState>,
    CallerId(admin_id): CallerId,
    Path(suggestion_id): Path<String>,
    Json(request): Json<UpdateStatusRequest>,
) -> ApiResult<Response> {
    let status = request
        .status
        .parse::<SuggestionStatus>()
        .map_err(VotingError::from)?;

    info!(
        "Status change for {} to {} requested by {}",
        suggestion_id, status, admin_id
    );

    let suggestion = state
        .service
        .set_suggestion_status(&admin_id, &suggestion_id, status)
        .await?;
    Ok(ok(suggestion))
}
