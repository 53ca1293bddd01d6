//! Handlers for linking positions to a set, inspecting drift, and applying
//! or syncing the set onto positions.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;

use competency_core::assignment::{AssignPositionsRequest, SyncAssignmentsRequest};
use competency_core::types::DbId;

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// GET /competency-sets/{id}/assignments
// ---------------------------------------------------------------------------

/// Linked positions with their computed sync state.
pub async fn list_assignments(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let statuses = state
        .engine
        .tracker()
        .list_assignments(id, auth.user_id)
        .await?;
    tracing::debug!(set_id = id, count = statuses.len(), "Listed assignments");
    Ok(Json(DataResponse { data: statuses }))
}

// ---------------------------------------------------------------------------
// POST /competency-sets/{id}/assignments
// ---------------------------------------------------------------------------

/// Link positions to the set, optionally merging its items right away.
pub async fn assign_positions(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<AssignPositionsRequest>,
) -> AppResult<impl IntoResponse> {
    let user = auth.acting_user()?;
    let assignments = state
        .engine
        .tracker()
        .assign(id, &input.position_ids, input.copy_items, user)
        .await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: assignments })))
}

// ---------------------------------------------------------------------------
// DELETE /competency-sets/{id}/assignments/{assignment_id}
// ---------------------------------------------------------------------------

/// Remove the link only. Requirements stay on the position.
pub async fn remove_assignment(
    auth: AuthUser,
    State(state): State<AppState>,
    Path((id, assignment_id)): Path<(DbId, DbId)>,
) -> AppResult<impl IntoResponse> {
    let user = auth.acting_user()?;
    state
        .engine
        .tracker()
        .unassign(id, assignment_id, user)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// GET /competency-sets/{id}/available-positions
// ---------------------------------------------------------------------------

pub async fn list_available_positions(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let positions = state
        .engine
        .tracker()
        .list_available_positions(id, auth.user_id)
        .await?;
    Ok(Json(DataResponse { data: positions }))
}

// ---------------------------------------------------------------------------
// GET /competency-sets/{id}/positions/{position_id}/changes
// ---------------------------------------------------------------------------

/// Per-competency drift between the set and one position.
pub async fn get_changes(
    auth: AuthUser,
    State(state): State<AppState>,
    Path((id, position_id)): Path<(DbId, DbId)>,
) -> AppResult<impl IntoResponse> {
    let changes = state
        .engine
        .drift()
        .diff(id, position_id, auth.user_id)
        .await?;
    Ok(Json(DataResponse { data: changes }))
}

// ---------------------------------------------------------------------------
// POST /competency-sets/{id}/positions/{position_id}/apply
// ---------------------------------------------------------------------------

/// Merge the set's items onto the position. Partial failures answer 207.
pub async fn apply_set(
    auth: AuthUser,
    State(state): State<AppState>,
    Path((id, position_id)): Path<(DbId, DbId)>,
) -> AppResult<impl IntoResponse> {
    let user = auth.acting_user()?;
    let result = state.engine.merge().apply_set(id, position_id, user).await?;
    Ok(Json(DataResponse { data: result }))
}

// ---------------------------------------------------------------------------
// POST /competency-sets/{id}/sync
// ---------------------------------------------------------------------------

/// Re-apply the set to the selected assignments.
pub async fn sync_assignments(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<SyncAssignmentsRequest>,
) -> AppResult<impl IntoResponse> {
    let user = auth.acting_user()?;
    let results = state
        .engine
        .sync()
        .sync(id, &input.assignment_ids, user)
        .await?;
    Ok(Json(DataResponse { data: results }))
}
