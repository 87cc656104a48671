// ABOUTME: HTTP API router and shared handler state
// ABOUTME: Routes under /api/rounds, /api/suggestions, and /api/meetings

use axum::{
    routing::{get, post, put},
    Router,
};
use bookclub_voting::VotingService;
use std::sync::Arc;

pub mod health;
pub mod identity;
pub mod meetings_handlers;
pub mod response;
pub mod rounds_handlers;
pub mod suggestions_handlers;

/// State shared by every handler
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<VotingService>,
    /// Retry-After sent to throttled voters
    pub vote_retry_after: u64,
}

pub fn create_router(state: AppState) -> Router {
    let rounds_router = Router::new()
        .route("/", get(rounds_handlers::list_rounds))
        .route("/current", get(rounds_handlers::get_current_round))
        .route("/finalize", post(rounds_handlers::finalize_round))
        .route("/reset", post(rounds_handlers::reset_round))
        .route("/{round_number}", get(rounds_handlers::get_round));

    let suggestions_router = Router::new()
        .route(
            "/",
            get(suggestions_handlers::list_suggestions).post(suggestions_handlers::create_suggestion),
        )
        .route(
            "/check-duplicate",
            post(suggestions_handlers::check_duplicate),
        )
        .route("/{suggestion_id}", get(suggestions_handlers::get_suggestion))
        .route(
            "/{suggestion_id}/voters",
            get(suggestions_handlers::list_voters),
        )
        .route("/{suggestion_id}/vote", post(suggestions_handlers::toggle_vote))
        .route(
            "/{suggestion_id}/status",
            put(suggestions_handlers::update_status),
        );

    let meetings_router = Router::new().route(
        "/",
        get(meetings_handlers::list_meetings).post(meetings_handlers::create_meeting),
    );

    Router::new()
        .route("/api/health", get(health::health_check))
        .nest("/api/rounds", rounds_router)
        .nest("/api/suggestions", suggestions_router)
        .nest("/api/meetings", meetings_router)
        .with_state(state)
}
