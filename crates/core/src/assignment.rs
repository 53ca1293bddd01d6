//! Position-set assignments: the association between a set and the
//! positions it has been linked to.

use serde::{Deserialize, Serialize};

use crate::types::{DbId, Timestamp};

/// A stored `(set, position)` link.
///
/// `source_competency_ids` is the set's competency list as of the last merge.
/// The drift detector uses it to tell a competency the set stopped providing
/// apart from one the position added on its own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PositionSetAssignment {
    pub id: DbId,
    pub set_id: DbId,
    pub position_id: DbId,
    pub assigned_by: DbId,
    pub assigned_at: Timestamp,
    /// `None` until the set's items are first merged into the position.
    pub last_synced_at: Option<Timestamp>,
    pub source_competency_ids: Vec<DbId>,
}

/// Insert payload for an assignment row.
#[derive(Debug, Clone)]
pub struct NewAssignment {
    pub set_id: DbId,
    pub position_id: DbId,
    pub assigned_by: DbId,
    pub source_competency_ids: Vec<DbId>,
    pub synced_at: Option<Timestamp>,
}

/// Update written after a merge touches an assignment.
///
/// `synced_at = None` keeps the previous `last_synced_at`, which is what a
/// partially failed merge records.
#[derive(Debug, Clone)]
pub struct SyncRecord {
    pub source_competency_ids: Vec<DbId>,
    pub synced_at: Option<Timestamp>,
}

/// An assignment annotated with its computed sync state.
#[derive(Debug, Clone, Serialize)]
pub struct AssignmentStatus {
    #[serde(flatten)]
    pub assignment: PositionSetAssignment,
    pub position_title: String,
    pub is_synced: bool,
    pub pending_changes: usize,
}

/// Request body for linking positions to a set.
#[derive(Debug, Clone, Deserialize)]
pub struct AssignPositionsRequest {
    pub position_ids: Vec<DbId>,
    /// Merge the set's items immediately instead of only linking.
    #[serde(default)]
    pub copy_items: bool,
}

/// Request body for syncing a caller-selected subset of assignments.
#[derive(Debug, Clone, Deserialize)]
pub struct SyncAssignmentsRequest {
    pub assignment_ids: Vec<DbId>,
}
