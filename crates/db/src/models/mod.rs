//! Row structs for the competency tables.
//!
//! Each submodule contains a `FromRow` struct matching the selected columns
//! and a conversion into the `competency-core` domain type.

pub mod assignment;
pub mod competency_set;
pub mod reference;
pub mod requirement;
