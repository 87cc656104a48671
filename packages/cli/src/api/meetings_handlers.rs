// ABOUTME: HTTP request handlers for meetings
// ABOUTME: Upcoming meeting list and admin scheduling

use axum::{extract::State, response::Response, Json};
use bookclub_core::MeetingCreateInput;
use tracing::info;

use super::identity::CallerId;
use super::response::{created, ok};
use super::AppState;
use crate::error::ApiResult;

/// Meetings from today on, earliest first
pub async fn list_meetings(State(state): State<AppState>) -> ApiResult<Response> {
    let meetings = state.service.list_upcoming_meetings().await?;
    Ok(ok(meetings))
}

pub async fn create_meeting(
    State(state): State<AppState>,
    CallerId(admin_id): CallerId,
    Json(request): Json<MeetingCreateInput>,
) -> ApiResult<Response> {
    info!("Meeting on {} requested by {}", request.date, admin_id);

    let meeting = state.service.create_meeting(&admin_id, request).await?;
    Ok(created(meeting))
}
