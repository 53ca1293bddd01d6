//! Repository for the `competency_sets` and `competency_set_items` tables.

use sqlx::PgPool;

use competency_core::competency_set::{
    NewCompetencySet, NewSetItem, SetItemUpdate, SetMetadataUpdate, VisibilityFilter,
};
use competency_core::store::SetListFilter;
use competency_core::types::DbId;

use crate::models::competency_set::{CompetencySetRow, SetItemRow};

/* --------------------------------------------------------------------------
CompetencySetRepo
-------------------------------------------------------------------------- */

/// Set columns with the derived item count. Expects the table aliased as `s`.
const SET_COLUMNS: &str = "s.id, s.name, s.description, s.visibility, s.owner_id, s.is_active, \
     (SELECT COUNT(*) FROM competency_set_items ci WHERE ci.set_id = s.id) AS competency_count, \
     s.created_at, s.updated_at";

/// Provides CRUD operations for competency sets.
pub struct CompetencySetRepo;

impl CompetencySetRepo {
    /// List sets matching `filter`, ordered by name.
    pub async fn list(
        pool: &PgPool,
        filter: &SetListFilter,
    ) -> Result<Vec<CompetencySetRow>, sqlx::Error> {
        let visibility_clause = match filter.visibility {
            VisibilityFilter::Public => "s.visibility = 'public'",
            VisibilityFilter::Private => "s.visibility = 'private' AND s.owner_id = $2",
            VisibilityFilter::All => "(s.visibility = 'public' OR s.owner_id = $2)",
        };
        let query = format!(
            "SELECT {SET_COLUMNS} FROM competency_sets s \
             WHERE ($1 OR s.is_active) AND {visibility_clause} \
             ORDER BY s.name ASC, s.id ASC"
        );
        sqlx::query_as::<_, CompetencySetRow>(&query)
            .bind(filter.include_inactive)
            .bind(filter.viewer_id)
            .fetch_all(pool)
            .await
    }

    /// Find a set by ID regardless of visibility or active state.
    pub async fn find_by_id(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<CompetencySetRow>, sqlx::Error> {
        let query = format!("SELECT {SET_COLUMNS} FROM competency_sets s WHERE s.id = $1");
        sqlx::query_as::<_, CompetencySetRow>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Insert a new set, returning the created row.
    pub async fn create(
        pool: &PgPool,
        input: &NewCompetencySet,
    ) -> Result<CompetencySetRow, sqlx::Error> {
        let query = format!(
            "INSERT INTO competency_sets AS s (name, description, visibility, owner_id) \
             VALUES ($1, $2, $3, $4) \
             RETURNING {SET_COLUMNS}"
        );
        sqlx::query_as::<_, CompetencySetRow>(&query)
            .bind(&input.name)
            .bind(&input.description)
            .bind(input.visibility.as_str())
            .bind(input.owner_id)
            .fetch_one(pool)
            .await
    }

    /// Update set metadata. Only non-`None` fields in `input` are applied; an
    /// empty description is stored as NULL.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &SetMetadataUpdate,
    ) -> Result<Option<CompetencySetRow>, sqlx::Error> {
        let query = format!(
            "UPDATE competency_sets AS s SET \
                name = COALESCE($2, s.name), \
                description = CASE WHEN $3::TEXT IS NULL THEN s.description \
                                   ELSE NULLIF($3, '') END, \
                visibility = COALESCE($4, s.visibility), \
                updated_at = NOW() \
             WHERE s.id = $1 \
             RETURNING {SET_COLUMNS}"
        );
        sqlx::query_as::<_, CompetencySetRow>(&query)
            .bind(id)
            .bind(&input.name)
            .bind(&input.description)
            .bind(input.visibility.map(|v| v.as_str()))
            .fetch_optional(pool)
            .await
    }

    /// Delete a set and, by cascade, its items. Returns `true` if a row was removed.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM competency_sets WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Mark an active set inactive. Returns `true` if the row changed.
    pub async fn deactivate(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE competency_sets SET is_active = false, updated_at = NOW() \
             WHERE id = $1 AND is_active",
        )
        .bind(id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}

/* --------------------------------------------------------------------------
SetItemRepo
-------------------------------------------------------------------------- */

/// Item columns joined with the competency name. Expects `i` and `c` aliases.
const ITEM_COLUMNS: &str = "i.id, i.set_id, i.competency_id, c.name AS competency_name, \
     i.required_level, i.is_mandatory, i.display_order";

/// Provides CRUD operations for competency set items.
pub struct SetItemRepo;

impl SetItemRepo {
    /// List a set's items ordered by `display_order`.
    pub async fn list_by_set(pool: &PgPool, set_id: DbId) -> Result<Vec<SetItemRow>, sqlx::Error> {
        let query = format!(
            "SELECT {ITEM_COLUMNS} FROM competency_set_items i \
             JOIN competencies c ON c.id = i.competency_id \
             WHERE i.set_id = $1 \
             ORDER BY i.display_order ASC, i.id ASC"
        );
        sqlx::query_as::<_, SetItemRow>(&query)
            .bind(set_id)
            .fetch_all(pool)
            .await
    }

    /// Insert an item, returning the created row.
    pub async fn create(
        pool: &PgPool,
        set_id: DbId,
        input: &NewSetItem,
    ) -> Result<SetItemRow, sqlx::Error> {
        let query = format!(
            "WITH i AS ( \
                INSERT INTO competency_set_items \
                    (set_id, competency_id, required_level, is_mandatory, display_order) \
                VALUES ($1, $2, $3, $4, $5) \
                RETURNING * \
             ) \
             SELECT {ITEM_COLUMNS} FROM i JOIN competencies c ON c.id = i.competency_id"
        );
        sqlx::query_as::<_, SetItemRow>(&query)
            .bind(set_id)
            .bind(input.competency_id)
            .bind(input.required_level)
            .bind(input.is_mandatory)
            .bind(input.display_order)
            .fetch_one(pool)
            .await
    }

    /// Update an item. Only non-`None` fields in `input` are applied.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &SetItemUpdate,
    ) -> Result<Option<SetItemRow>, sqlx::Error> {
        let query = format!(
            "WITH i AS ( \
                UPDATE competency_set_items SET \
                    required_level = COALESCE($2, required_level), \
                    is_mandatory = COALESCE($3, is_mandatory), \
                    display_order = COALESCE($4, display_order) \
                WHERE id = $1 \
                RETURNING * \
             ) \
             SELECT {ITEM_COLUMNS} FROM i JOIN competencies c ON c.id = i.competency_id"
        );
        sqlx::query_as::<_, SetItemRow>(&query)
            .bind(id)
            .bind(input.required_level)
            .bind(input.is_mandatory)
            .bind(input.display_order)
            .fetch_optional(pool)
            .await
    }

    /// Delete an item. Returns `true` if a row was removed.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM competency_set_items WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
