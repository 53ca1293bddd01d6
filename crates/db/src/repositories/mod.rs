//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async CRUD methods
//! that accept `&PgPool` as the first argument.

pub mod assignment_repo;
pub mod competency_set_repo;
pub mod reference_repo;
pub mod requirement_repo;

pub use assignment_repo::AssignmentRepo;
pub use competency_set_repo::{CompetencySetRepo, SetItemRepo};
pub use reference_repo::ReferenceRepo;
pub use requirement_repo::RequirementRepo;
