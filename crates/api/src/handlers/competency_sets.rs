//! Handlers for competency sets and their ordered item lists.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;

use competency_core::competency_set::{
    CreateCompetencySet, MoveItemRequest, SetItemInput, UpdateCompetencySet, UpdateSetItem,
};
use competency_core::store::SetListFilter;
use competency_core::types::DbId;
use competency_engine::DeleteOutcome;

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::query::SetListParams;
use crate::response::DataResponse;
use crate::state::AppState;

/// Body of `DELETE /competency-sets/{id}`.
#[derive(Debug, Serialize)]
pub struct DeleteSetResponse {
    pub id: DbId,
    pub outcome: DeleteOutcome,
}

// ---------------------------------------------------------------------------
// GET /competency-sets
// ---------------------------------------------------------------------------

/// List sets visible to the authenticated user.
pub async fn list_sets(
    auth: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<SetListParams>,
) -> AppResult<impl IntoResponse> {
    let filter = SetListFilter {
        visibility: params.visibility,
        viewer_id: auth.user_id,
        include_inactive: params.include_inactive,
    };
    let sets = state.engine.catalog().list(&filter).await?;
    Ok(Json(DataResponse { data: sets }))
}

// ---------------------------------------------------------------------------
// POST /competency-sets
// ---------------------------------------------------------------------------

pub async fn create_set(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<CreateCompetencySet>,
) -> AppResult<impl IntoResponse> {
    let user = auth.acting_user()?;
    let created = state.engine.catalog().create(&input, user).await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: created })))
}

// ---------------------------------------------------------------------------
// GET /competency-sets/{id}
// ---------------------------------------------------------------------------

/// A set with its items. Private sets of other users are reported as 404.
pub async fn get_set(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let set = state.engine.catalog().get(id, auth.user_id).await?;
    Ok(Json(DataResponse { data: set }))
}

// ---------------------------------------------------------------------------
// PUT /competency-sets/{id}
// ---------------------------------------------------------------------------

/// Update metadata; an `items` array replaces the item list.
pub async fn update_set(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateCompetencySet>,
) -> AppResult<impl IntoResponse> {
    let user = auth.acting_user()?;
    let updated = state.engine.catalog().update(id, &input, user).await?;
    Ok(Json(DataResponse { data: updated }))
}

// ---------------------------------------------------------------------------
// DELETE /competency-sets/{id}
// ---------------------------------------------------------------------------

/// Delete the set, or deactivate it when positions are still assigned.
pub async fn delete_set(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let user = auth.acting_user()?;
    let outcome = state.engine.catalog().delete(id, user).await?;
    Ok(Json(DataResponse {
        data: DeleteSetResponse { id, outcome },
    }))
}

// ---------------------------------------------------------------------------
// GET /competency-sets/{id}/items
// ---------------------------------------------------------------------------

pub async fn list_items(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let set = state.engine.catalog().get(id, auth.user_id).await?;
    Ok(Json(DataResponse { data: set.items }))
}

// ---------------------------------------------------------------------------
// POST /competency-sets/{id}/items
// ---------------------------------------------------------------------------

/// Append one item to the end of the set.
pub async fn add_item(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<SetItemInput>,
) -> AppResult<impl IntoResponse> {
    let user = auth.acting_user()?;
    let item = state.engine.catalog().add_item(id, &input, user).await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: item })))
}

// ---------------------------------------------------------------------------
// PUT /competency-sets/{id}/items/{item_id}
// ---------------------------------------------------------------------------

pub async fn update_item(
    auth: AuthUser,
    State(state): State<AppState>,
    Path((id, item_id)): Path<(DbId, DbId)>,
    Json(input): Json<UpdateSetItem>,
) -> AppResult<impl IntoResponse> {
    let user = auth.acting_user()?;
    let item = state
        .engine
        .catalog()
        .update_item(id, item_id, &input, user)
        .await?;
    Ok(Json(DataResponse { data: item }))
}

// ---------------------------------------------------------------------------
// DELETE /competency-sets/{id}/items/{item_id}
// ---------------------------------------------------------------------------

/// Remove one item. Returns the renumbered remaining items.
pub async fn remove_item(
    auth: AuthUser,
    State(state): State<AppState>,
    Path((id, item_id)): Path<(DbId, DbId)>,
) -> AppResult<impl IntoResponse> {
    let user = auth.acting_user()?;
    let items = state.engine.catalog().remove_item(id, item_id, user).await?;
    Ok(Json(DataResponse { data: items }))
}

// ---------------------------------------------------------------------------
// POST /competency-sets/{id}/items/{item_id}/move
// ---------------------------------------------------------------------------

/// Swap an item with its neighbour (`{"direction": "up" | "down"}`).
pub async fn move_item(
    auth: AuthUser,
    State(state): State<AppState>,
    Path((id, item_id)): Path<(DbId, DbId)>,
    Json(input): Json<MoveItemRequest>,
) -> AppResult<impl IntoResponse> {
    let user = auth.acting_user()?;
    let items = state
        .engine
        .catalog()
        .move_item(id, item_id, input.direction, user)
        .await?;
    Ok(Json(DataResponse { data: items }))
}
