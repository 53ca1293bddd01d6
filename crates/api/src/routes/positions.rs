//! Route definitions for position requirements.
//!
//! Mounted at `/positions` in the API route tree.
//!
//! ```text
//! GET    /{id}/requirements                    list_requirements
//! PUT    /{id}/requirements/{requirement_id}   update_requirement
//! DELETE /{id}/requirements/{requirement_id}   remove_requirement
//! GET    /{id}/fully-applied-sets              fully_applied_sets
//! ```

use axum::routing::{get, put};
use axum::Router;

use crate::handlers::positions;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/{id}/requirements", get(positions::list_requirements))
        .route(
            "/{id}/requirements/{requirement_id}",
            put(positions::update_requirement).delete(positions::remove_requirement),
        )
        .route(
            "/{id}/fully-applied-sets",
            get(positions::fully_applied_sets),
        )
}
