//! Shared query parameter types for API handlers.

use serde::Deserialize;

use competency_core::competency_set::VisibilityFilter;

/// Query parameters for `GET /competency-sets` (`?visibility=&include_inactive=`).
#[derive(Debug, Default, Deserialize)]
pub struct SetListParams {
    #[serde(default)]
    pub visibility: VisibilityFilter,
    #[serde(default)]
    pub include_inactive: bool,
}
