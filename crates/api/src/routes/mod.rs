pub mod competency_sets;
pub mod health;
pub mod positions;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /competency-sets                                          list, create
/// /competency-sets/{id}                                     get, update, delete
/// /competency-sets/{id}/items                               list, add
/// /competency-sets/{id}/items/{item_id}                     update, remove
/// /competency-sets/{id}/items/{item_id}/move                move up/down (POST)
/// /competency-sets/{id}/assignments                         list, assign positions
/// /competency-sets/{id}/assignments/{assignment_id}         unassign (DELETE)
/// /competency-sets/{id}/available-positions                 unlinked positions
/// /competency-sets/{id}/positions/{position_id}/changes     drift (GET)
/// /competency-sets/{id}/positions/{position_id}/apply       merge (POST)
/// /competency-sets/{id}/sync                                sync selected (POST)
///
/// /positions/{id}/requirements                              list
/// /positions/{id}/requirements/{requirement_id}             update (PUT), remove (DELETE)
/// /positions/{id}/fully-applied-sets                        coverage (GET)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/competency-sets", competency_sets::router())
        .nest("/positions", positions::router())
}
