//! Request handlers.
//!
//! Each submodule provides async handler functions for one resource. Handlers
//! resolve the acting user from [`AuthUser`](crate::middleware::auth::AuthUser),
//! delegate to the [`CompetencyEngine`](competency_engine::CompetencyEngine) and
//! map errors via [`AppError`](crate::error::AppError).

pub mod assignments;
pub mod competency_sets;
pub mod positions;
