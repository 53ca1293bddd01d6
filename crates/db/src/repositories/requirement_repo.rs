//! Repository for the `position_competency_requirements` table.

use sqlx::PgPool;

use competency_core::requirement::{RequirementPatch, RequirementUpsert};
use competency_core::types::DbId;

use crate::models::requirement::RequirementRow;

/// Requirement columns joined with the competency name. Expects `r` and `c` aliases.
const REQ_COLUMNS: &str = "r.id, r.position_id, r.competency_id, c.name AS competency_name, \
     r.required_level, r.is_mandatory, r.modified_by, r.modified_at, r.created_at";

/// Provides CRUD operations for position requirements.
pub struct RequirementRepo;

impl RequirementRepo {
    /// List a position's requirements ordered by competency name.
    pub async fn list_by_position(
        pool: &PgPool,
        position_id: DbId,
    ) -> Result<Vec<RequirementRow>, sqlx::Error> {
        let query = format!(
            "SELECT {REQ_COLUMNS} FROM position_competency_requirements r \
             JOIN competencies c ON c.id = r.competency_id \
             WHERE r.position_id = $1 \
             ORDER BY c.name ASC, r.id ASC"
        );
        sqlx::query_as::<_, RequirementRow>(&query)
            .bind(position_id)
            .fetch_all(pool)
            .await
    }

    /// Find a requirement by ID.
    pub async fn find_by_id(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<RequirementRow>, sqlx::Error> {
        let query = format!(
            "SELECT {REQ_COLUMNS} FROM position_competency_requirements r \
             JOIN competencies c ON c.id = r.competency_id \
             WHERE r.id = $1"
        );
        sqlx::query_as::<_, RequirementRow>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Insert, or overwrite level and flag on the existing
    /// `(position_id, competency_id)` row keeping its id and `created_at`.
    pub async fn upsert(
        pool: &PgPool,
        position_id: DbId,
        input: &RequirementUpsert,
        modified_by: DbId,
    ) -> Result<RequirementRow, sqlx::Error> {
        let query = format!(
            "WITH r AS ( \
                INSERT INTO position_competency_requirements \
                    (position_id, competency_id, required_level, is_mandatory, modified_by) \
                VALUES ($1, $2, $3, $4, $5) \
                ON CONFLICT ON CONSTRAINT uq_position_requirements_position_competency \
                DO UPDATE SET \
                    required_level = EXCLUDED.required_level, \
                    is_mandatory = EXCLUDED.is_mandatory, \
                    modified_by = EXCLUDED.modified_by, \
                    modified_at = NOW() \
                RETURNING * \
             ) \
             SELECT {REQ_COLUMNS} FROM r JOIN competencies c ON c.id = r.competency_id"
        );
        sqlx::query_as::<_, RequirementRow>(&query)
            .bind(position_id)
            .bind(input.competency_id)
            .bind(input.required_level)
            .bind(input.is_mandatory)
            .bind(modified_by)
            .fetch_one(pool)
            .await
    }

    /// Patch a requirement.
    ///
    /// Returns `None` when the row is missing or, if `expected_modified_at`
    /// is set, when the row changed after that instant.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        patch: &RequirementPatch,
        modified_by: DbId,
    ) -> Result<Option<RequirementRow>, sqlx::Error> {
        let query = format!(
            "WITH r AS ( \
                UPDATE position_competency_requirements SET \
                    required_level = COALESCE($2, required_level), \
                    is_mandatory = COALESCE($3, is_mandatory), \
                    modified_by = $4, \
                    modified_at = NOW() \
                WHERE id = $1 AND ($5::timestamptz IS NULL OR modified_at = $5) \
                RETURNING * \
             ) \
             SELECT {REQ_COLUMNS} FROM r JOIN competencies c ON c.id = r.competency_id"
        );
        sqlx::query_as::<_, RequirementRow>(&query)
            .bind(id)
            .bind(patch.required_level)
            .bind(patch.is_mandatory)
            .bind(modified_by)
            .bind(patch.expected_modified_at)
            .fetch_optional(pool)
            .await
    }

    /// Delete a requirement. Returns `true` if a row was removed.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM position_competency_requirements WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
