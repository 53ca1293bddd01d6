//! Read-only reference entities owned by the surrounding HR system.
//!
//! Competencies and positions are created and stored elsewhere; the engine
//! only looks them up.

use serde::Serialize;

use crate::types::DbId;

/// A named, assessable skill.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Competency {
    pub id: DbId,
    pub name: String,
    pub category: Option<String>,
}

/// A job role that owns its own list of competency requirements.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Position {
    pub id: DbId,
    pub title: String,
    pub department: Option<String>,
}
