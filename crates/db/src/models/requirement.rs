//! Position competency requirement rows.

use sqlx::FromRow;

use competency_core::requirement::PositionCompetencyRequirement;
use competency_core::types::{DbId, Level, Timestamp};

/// A row from `position_competency_requirements` joined with the competency name.
#[derive(Debug, Clone, FromRow)]
pub struct RequirementRow {
    pub id: DbId,
    pub position_id: DbId,
    pub competency_id: DbId,
    pub competency_name: String,
    pub required_level: Level,
    pub is_mandatory: bool,
    pub modified_by: Option<DbId>,
    pub modified_at: Timestamp,
    pub created_at: Timestamp,
}

impl From<RequirementRow> for PositionCompetencyRequirement {
    fn from(row: RequirementRow) -> Self {
        PositionCompetencyRequirement {
            id: row.id,
            position_id: row.position_id,
            competency_id: row.competency_id,
            competency_name: row.competency_name,
            required_level: row.required_level,
            is_mandatory: row.is_mandatory,
            modified_by: row.modified_by,
            modified_at: row.modified_at,
            created_at: row.created_at,
        }
    }
}
