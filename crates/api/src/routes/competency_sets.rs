//! Route definitions for competency sets.
//!
//! Mounted at `/competency-sets` in the API route tree.
//!
//! ```text
//! GET    /                                       list_sets
//! POST   /                                       create_set
//! GET    /{id}                                   get_set
//! PUT    /{id}                                   update_set
//! DELETE /{id}                                   delete_set
//! GET    /{id}/items                             list_items
//! POST   /{id}/items                             add_item
//! PUT    /{id}/items/{item_id}                   update_item
//! DELETE /{id}/items/{item_id}                   remove_item
//! POST   /{id}/items/{item_id}/move              move_item
//! GET    /{id}/assignments                       list_assignments
//! POST   /{id}/assignments                       assign_positions
//! DELETE /{id}/assignments/{assignment_id}       remove_assignment
//! GET    /{id}/available-positions               list_available_positions
//! GET    /{id}/positions/{position_id}/changes   get_changes
//! POST   /{id}/positions/{position_id}/apply     apply_set
//! POST   /{id}/sync                              sync_assignments
//! ```

use axum::routing::{delete, get, post, put};
use axum::Router;

use crate::handlers::{assignments, competency_sets};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(competency_sets::list_sets).post(competency_sets::create_set),
        )
        .route(
            "/{id}",
            get(competency_sets::get_set)
                .put(competency_sets::update_set)
                .delete(competency_sets::delete_set),
        )
        .route(
            "/{id}/items",
            get(competency_sets::list_items).post(competency_sets::add_item),
        )
        .route(
            "/{id}/items/{item_id}",
            put(competency_sets::update_item).delete(competency_sets::remove_item),
        )
        .route(
            "/{id}/items/{item_id}/move",
            post(competency_sets::move_item),
        )
        .route(
            "/{id}/assignments",
            get(assignments::list_assignments).post(assignments::assign_positions),
        )
        .route(
            "/{id}/assignments/{assignment_id}",
            delete(assignments::remove_assignment),
        )
        .route(
            "/{id}/available-positions",
            get(assignments::list_available_positions),
        )
        .route(
            "/{id}/positions/{position_id}/changes",
            get(assignments::get_changes),
        )
        .route(
            "/{id}/positions/{position_id}/apply",
            post(assignments::apply_set),
        )
        .route("/{id}/sync", post(assignments::sync_assignments))
}
