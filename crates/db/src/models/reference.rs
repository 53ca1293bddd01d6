//! Competency and position reference rows.

use sqlx::FromRow;

use competency_core::reference::{Competency, Position};
use competency_core::types::DbId;

#[derive(Debug, Clone, FromRow)]
pub struct CompetencyRow {
    pub id: DbId,
    pub name: String,
    pub category: Option<String>,
}

impl From<CompetencyRow> for Competency {
    fn from(row: CompetencyRow) -> Self {
        Competency {
            id: row.id,
            name: row.name,
            category: row.category,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct PositionRow {
    pub id: DbId,
    pub title: String,
    pub department: Option<String>,
}

impl From<PositionRow> for Position {
    fn from(row: PositionRow) -> Self {
        Position {
            id: row.id,
            title: row.title,
            department: row.department,
        }
    }
}
