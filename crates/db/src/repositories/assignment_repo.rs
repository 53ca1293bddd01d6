//! Repository for the `position_set_assignments` table.

use sqlx::PgPool;

use competency_core::assignment::{NewAssignment, SyncRecord};
use competency_core::types::DbId;

use crate::models::assignment::AssignmentRow;

const ASSIGNMENT_COLUMNS: &str = "id, set_id, position_id, assigned_by, assigned_at, \
     last_synced_at, source_competency_ids";

/// Provides CRUD operations for set-to-position assignments.
pub struct AssignmentRepo;

impl AssignmentRepo {
    /// List a set's assignments in creation order.
    pub async fn list_by_set(
        pool: &PgPool,
        set_id: DbId,
    ) -> Result<Vec<AssignmentRow>, sqlx::Error> {
        let query = format!(
            "SELECT {ASSIGNMENT_COLUMNS} FROM position_set_assignments \
             WHERE set_id = $1 \
             ORDER BY id ASC"
        );
        sqlx::query_as::<_, AssignmentRow>(&query)
            .bind(set_id)
            .fetch_all(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<AssignmentRow>, sqlx::Error> {
        let query =
            format!("SELECT {ASSIGNMENT_COLUMNS} FROM position_set_assignments WHERE id = $1");
        sqlx::query_as::<_, AssignmentRow>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find the assignment for a set and position (unique constraint).
    pub async fn find_by_set_and_position(
        pool: &PgPool,
        set_id: DbId,
        position_id: DbId,
    ) -> Result<Option<AssignmentRow>, sqlx::Error> {
        let query = format!(
            "SELECT {ASSIGNMENT_COLUMNS} FROM position_set_assignments \
             WHERE set_id = $1 AND position_id = $2"
        );
        sqlx::query_as::<_, AssignmentRow>(&query)
            .bind(set_id)
            .bind(position_id)
            .fetch_optional(pool)
            .await
    }

    /// Insert a new assignment, returning the created row.
    pub async fn create(
        pool: &PgPool,
        input: &NewAssignment,
    ) -> Result<AssignmentRow, sqlx::Error> {
        let query = format!(
            "INSERT INTO position_set_assignments \
                (set_id, position_id, assigned_by, source_competency_ids, last_synced_at) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {ASSIGNMENT_COLUMNS}"
        );
        sqlx::query_as::<_, AssignmentRow>(&query)
            .bind(input.set_id)
            .bind(input.position_id)
            .bind(input.assigned_by)
            .bind(&input.source_competency_ids)
            .bind(input.synced_at)
            .fetch_one(pool)
            .await
    }

    /// Replace the source snapshot and, when given, the sync timestamp.
    pub async fn record_sync(
        pool: &PgPool,
        id: DbId,
        input: &SyncRecord,
    ) -> Result<Option<AssignmentRow>, sqlx::Error> {
        let query = format!(
            "UPDATE position_set_assignments SET \
                source_competency_ids = $2, \
                last_synced_at = COALESCE($3, last_synced_at) \
             WHERE id = $1 \
             RETURNING {ASSIGNMENT_COLUMNS}"
        );
        sqlx::query_as::<_, AssignmentRow>(&query)
            .bind(id)
            .bind(&input.source_competency_ids)
            .bind(input.synced_at)
            .fetch_optional(pool)
            .await
    }

    /// Delete an assignment. Returns `true` if a row was removed.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM position_set_assignments WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Count assignments referencing a set.
    pub async fn count_by_set(pool: &PgPool, set_id: DbId) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM position_set_assignments WHERE set_id = $1")
            .bind(set_id)
            .fetch_one(pool)
            .await
    }
}
