//! Domain types, validation rules and reconciliation algorithms for
//! competency sets and the position requirements they seed.
//!
//! Everything in this crate is free of I/O except the [`store::CompetencyStore`]
//! port, which the database and in-memory adapters implement.

pub mod actor;
pub mod assignment;
pub mod competency_set;
pub mod drift;
pub mod error;
pub mod level;
pub mod merge;
pub mod reference;
pub mod requirement;
pub mod store;
pub mod types;
