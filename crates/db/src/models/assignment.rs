//! Position-set assignment rows.

use sqlx::FromRow;

use competency_core::assignment::PositionSetAssignment;
use competency_core::types::{DbId, Timestamp};

/// A row from `position_set_assignments`.
#[derive(Debug, Clone, FromRow)]
pub struct AssignmentRow {
    pub id: DbId,
    pub set_id: DbId,
    pub position_id: DbId,
    pub assigned_by: DbId,
    pub assigned_at: Timestamp,
    pub last_synced_at: Option<Timestamp>,
    pub source_competency_ids: Vec<DbId>,
}

impl From<AssignmentRow> for PositionSetAssignment {
    fn from(row: AssignmentRow) -> Self {
        PositionSetAssignment {
            id: row.id,
            set_id: row.set_id,
            position_id: row.position_id,
            assigned_by: row.assigned_by,
            assigned_at: row.assigned_at,
            last_synced_at: row.last_synced_at,
            source_competency_ids: row.source_competency_ids,
        }
    }
}
