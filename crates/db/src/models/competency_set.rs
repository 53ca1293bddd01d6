//! Competency set and set item rows.

use sqlx::FromRow;

use competency_core::competency_set::{CompetencySet, CompetencySetItem, Visibility};
use competency_core::error::CoreError;
use competency_core::types::{DbId, Level, Timestamp};

/* --------------------------------------------------------------------------
Competency Set
-------------------------------------------------------------------------- */

/// A row from `competency_sets` with its derived item count.
#[derive(Debug, Clone, FromRow)]
pub struct CompetencySetRow {
    pub id: DbId,
    pub name: String,
    pub description: Option<String>,
    pub visibility: String,
    pub owner_id: DbId,
    pub is_active: bool,
    pub competency_count: i64,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl TryFrom<CompetencySetRow> for CompetencySet {
    type Error = CoreError;

    fn try_from(row: CompetencySetRow) -> Result<Self, Self::Error> {
        Ok(CompetencySet {
            id: row.id,
            name: row.name,
            description: row.description,
            visibility: row.visibility.parse::<Visibility>()?,
            owner_id: row.owner_id,
            is_active: row.is_active,
            competency_count: row.competency_count,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/* --------------------------------------------------------------------------
Competency Set Item
-------------------------------------------------------------------------- */

/// A row from `competency_set_items` joined with the competency name.
#[derive(Debug, Clone, FromRow)]
pub struct SetItemRow {
    pub id: DbId,
    pub set_id: DbId,
    pub competency_id: DbId,
    pub competency_name: String,
    pub required_level: Level,
    pub is_mandatory: bool,
    pub display_order: i32,
}

impl From<SetItemRow> for CompetencySetItem {
    fn from(row: SetItemRow) -> Self {
        CompetencySetItem {
            id: row.id,
            set_id: row.set_id,
            competency_id: row.competency_id,
            competency_name: row.competency_name,
            required_level: row.required_level,
            is_mandatory: row.is_mandatory,
            display_order: row.display_order,
        }
    }
}
