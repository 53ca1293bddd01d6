//! Handlers for a position's live requirement list.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;

use competency_core::requirement::RequirementPatch;
use competency_core::types::DbId;

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// GET /positions/{id}/requirements
// ---------------------------------------------------------------------------

pub async fn list_requirements(
    _auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let requirements = state.engine.requirements().list(id).await?;
    Ok(Json(DataResponse { data: requirements }))
}

// ---------------------------------------------------------------------------
// PUT /positions/{id}/requirements/{requirement_id}
// ---------------------------------------------------------------------------

/// Patch one requirement. Sending `expected_modified_at` turns a concurrent
/// edit into a 409 `STALE` instead of a silent overwrite.
pub async fn update_requirement(
    auth: AuthUser,
    State(state): State<AppState>,
    Path((id, requirement_id)): Path<(DbId, DbId)>,
    Json(patch): Json<RequirementPatch>,
) -> AppResult<impl IntoResponse> {
    let user = auth.acting_user()?;
    let updated = state
        .engine
        .requirements()
        .update(id, requirement_id, &patch, user)
        .await?;
    Ok(Json(DataResponse { data: updated }))
}

// ---------------------------------------------------------------------------
// DELETE /positions/{id}/requirements/{requirement_id}
// ---------------------------------------------------------------------------

pub async fn remove_requirement(
    auth: AuthUser,
    State(state): State<AppState>,
    Path((id, requirement_id)): Path<(DbId, DbId)>,
) -> AppResult<impl IntoResponse> {
    let user = auth.acting_user()?;
    state
        .engine
        .requirements()
        .remove(id, requirement_id, user)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// GET /positions/{id}/fully-applied-sets
// ---------------------------------------------------------------------------

/// Every active set visible to the caller, flagged with whether its minimum
/// bar is met on the position.
pub async fn fully_applied_sets(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let coverage = state
        .engine
        .drift()
        .fully_applied_sets(id, auth.user_id)
        .await?;
    Ok(Json(DataResponse { data: coverage }))
}
