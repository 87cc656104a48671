// ABOUTME: HTTP request handlers for voting rounds
// ABOUTME: Current round, history, and the admin finalize and reset transitions

use axum::{
    extract::{Path, State},
    response::Response,
};
use tracing::info;

use super::identity::CallerId;
use super::response::ok;
use super::AppState;
use crate::error::ApiResult;

/// Current round and whether votes are being accepted
pub async fn get_current_round(State(state): State<AppState>) -> ApiResult<Response> {
    let current = state.service.current_round().await?;
    Ok(ok(current))
}

/// Round history, newest first
pub async fn list_rounds(State(state): State<AppState>) -> ApiResult<Response> {
    let rounds = state.service.list_rounds().await?;
    Ok(ok(rounds))
}

pub async fn get_round(
    State(state): State<AppState>,
    Path(round_number): Path<i64>,
) -> ApiResult<Response> {
    let round = state.service.get_round(round_number).await?;
    Ok(ok(round))
}

/// Close voting and pick winners
pub async fn finalize_round(
    State(state): State<AppState>,
    CallerId(admin_id): CallerId,
) -> ApiResult<Response> {
    info!("Finalize requested by {}", admin_id);

    let outcome = state.service.finalize(&admin_id).await?;
    Ok(ok(outcome))
}

/// Archive the finalized round and open the next one
pub async fn reset_round(
    State(state): State<AppState>,
    CallerId(admin_id): CallerId,
) -> ApiResult<Response> {
    info!("Reset requested by {}", admin_id);

    let outcome = state.service.reset(&admin_id).await?;
    Ok(ok(outcome))
}
