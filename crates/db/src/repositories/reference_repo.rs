//! Read-only access to the `competencies` and `positions` tables.

use sqlx::PgPool;

use competency_core::types::DbId;

use crate::models::reference::{CompetencyRow, PositionRow};

pub struct ReferenceRepo;

impl ReferenceRepo {
    /// The competencies among `ids` that exist.
    pub async fn find_competencies(
        pool: &PgPool,
        ids: &[DbId],
    ) -> Result<Vec<CompetencyRow>, sqlx::Error> {
        sqlx::query_as::<_, CompetencyRow>(
            "SELECT id, name, category FROM competencies WHERE id = ANY($1) ORDER BY id",
        )
        .bind(ids)
        .fetch_all(pool)
        .await
    }

    pub async fn find_position(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<PositionRow>, sqlx::Error> {
        sqlx::query_as::<_, PositionRow>(
            "SELECT id, title, department FROM positions WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    pub async fn list_positions(pool: &PgPool) -> Result<Vec<PositionRow>, sqlx::Error> {
        sqlx::query_as::<_, PositionRow>(
            "SELECT id, title, department FROM positions ORDER BY title ASC, id ASC",
        )
        .fetch_all(pool)
        .await
    }
}
