//! [`CompetencyStore`] adapter over the Postgres repositories.

use async_trait::async_trait;
use sqlx::PgPool;

use competency_core::assignment::{NewAssignment, PositionSetAssignment, SyncRecord};
use competency_core::competency_set::{
    CompetencySet, CompetencySetItem, NewCompetencySet, NewSetItem, SetItemUpdate,
    SetMetadataUpdate,
};
use competency_core::error::CoreError;
use competency_core::reference::{Competency, Position};
use competency_core::requirement::{
    self, PositionCompetencyRequirement, RequirementPatch, RequirementUpsert,
};
use competency_core::store::{CompetencyStore, SetListFilter, StoreResult};
use competency_core::types::DbId;

use crate::repositories::{
    AssignmentRepo, CompetencySetRepo, ReferenceRepo, RequirementRepo, SetItemRepo,
};

/// Postgres-backed store. Each call runs as its own statement on the pool.
#[derive(Clone)]
pub struct PgCompetencyStore {
    pool: PgPool,
}

impl PgCompetencyStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Map a sqlx error into the domain error.
///
/// Unique violations become [`CoreError::Conflict`] naming the constraint,
/// foreign-key violations become [`CoreError::Validation`], and everything
/// else is passed through unchanged as [`CoreError::Store`].
pub fn map_sqlx_error(err: sqlx::Error) -> CoreError {
    if let sqlx::Error::Database(db_err) = &err {
        let constraint = db_err.constraint().unwrap_or("unknown").to_string();
        match db_err.code().as_deref() {
            Some("23505") => {
                return CoreError::Conflict(format!("Duplicate value violates {constraint}"));
            }
            Some("23503") => {
                return CoreError::Validation(format!(
                    "Referenced row does not exist ({constraint})"
                ));
            }
            _ => {}
        }
    }
    tracing::error!(error = %err, "Database error");
    CoreError::store(err)
}

fn rows<R, T: From<R>>(rows: Vec<R>) -> Vec<T> {
    rows.into_iter().map(T::from).collect()
}

#[async_trait]
impl CompetencyStore for PgCompetencyStore {
    async fn health_check(&self) -> StoreResult<()> {
        crate::health_check(&self.pool).await.map_err(map_sqlx_error)
    }

    /* ---- Sets ---- */

    async fn list_sets(&self, filter: &SetListFilter) -> StoreResult<Vec<CompetencySet>> {
        CompetencySetRepo::list(&self.pool, filter)
            .await
            .map_err(map_sqlx_error)?
            .into_iter()
            .map(CompetencySet::try_from)
            .collect()
    }

    async fn find_set(&self, set_id: DbId) -> StoreResult<Option<CompetencySet>> {
        CompetencySetRepo::find_by_id(&self.pool, set_id)
            .await
            .map_err(map_sqlx_error)?
            .map(CompetencySet::try_from)
            .transpose()
    }

    async fn create_set(&self, input: &NewCompetencySet) -> StoreResult<CompetencySet> {
        CompetencySetRepo::create(&self.pool, input)
            .await
            .map_err(map_sqlx_error)?
            .try_into()
    }

    async fn update_set(
        &self,
        set_id: DbId,
        input: &SetMetadataUpdate,
    ) -> StoreResult<Option<CompetencySet>> {
        CompetencySetRepo::update(&self.pool, set_id, input)
            .await
            .map_err(map_sqlx_error)?
            .map(CompetencySet::try_from)
            .transpose()
    }

    async fn delete_set(&self, set_id: DbId) -> StoreResult<bool> {
        CompetencySetRepo::delete(&self.pool, set_id)
            .await
            .map_err(map_sqlx_error)
    }

    async fn deactivate_set(&self, set_id: DbId) -> StoreResult<bool> {
        CompetencySetRepo::deactivate(&self.pool, set_id)
            .await
            .map_err(map_sqlx_error)
    }

    /* ---- Items ---- */

    async fn list_items(&self, set_id: DbId) -> StoreResult<Vec<CompetencySetItem>> {
        SetItemRepo::list_by_set(&self.pool, set_id)
            .await
            .map(rows)
            .map_err(map_sqlx_error)
    }

    async fn create_item(
        &self,
        set_id: DbId,
        input: &NewSetItem,
    ) -> StoreResult<CompetencySetItem> {
        SetItemRepo::create(&self.pool, set_id, input)
            .await
            .map(CompetencySetItem::from)
            .map_err(|err| match map_sqlx_error(err) {
                CoreError::Conflict(_) => CoreError::DuplicateItem {
                    competency_id: input.competency_id,
                },
                other => other,
            })
    }

    async fn update_item(
        &self,
        item_id: DbId,
        input: &SetItemUpdate,
    ) -> StoreResult<Option<CompetencySetItem>> {
        SetItemRepo::update(&self.pool, item_id, input)
            .await
            .map(|row| row.map(CompetencySetItem::from))
            .map_err(map_sqlx_error)
    }

    async fn delete_item(&self, item_id: DbId) -> StoreResult<bool> {
        SetItemRepo::delete(&self.pool, item_id)
            .await
            .map_err(map_sqlx_error)
    }

    /* ---- Reference data ---- */

    async fn find_competencies(&self, ids: &[DbId]) -> StoreResult<Vec<Competency>> {
        ReferenceRepo::find_competencies(&self.pool, ids)
            .await
            .map(rows)
            .map_err(map_sqlx_error)
    }

    async fn find_position(&self, position_id: DbId) -> StoreResult<Option<Position>> {
        ReferenceRepo::find_position(&self.pool, position_id)
            .await
            .map(|row| row.map(Position::from))
            .map_err(map_sqlx_error)
    }

    async fn list_positions(&self) -> StoreResult<Vec<Position>> {
        ReferenceRepo::list_positions(&self.pool)
            .await
            .map(rows)
            .map_err(map_sqlx_error)
    }

    /* ---- Requirements ---- */

    async fn list_requirements(
        &self,
        position_id: DbId,
    ) -> StoreResult<Vec<PositionCompetencyRequirement>> {
        RequirementRepo::list_by_position(&self.pool, position_id)
            .await
            .map(rows)
            .map_err(map_sqlx_error)
    }

    async fn find_requirement(
        &self,
        requirement_id: DbId,
    ) -> StoreResult<Option<PositionCompetencyRequirement>> {
        RequirementRepo::find_by_id(&self.pool, requirement_id)
            .await
            .map(|row| row.map(PositionCompetencyRequirement::from))
            .map_err(map_sqlx_error)
    }

    async fn upsert_requirement(
        &self,
        position_id: DbId,
        input: &RequirementUpsert,
        modified_by: DbId,
    ) -> StoreResult<PositionCompetencyRequirement> {
        RequirementRepo::upsert(&self.pool, position_id, input, modified_by)
            .await
            .map(PositionCompetencyRequirement::from)
            .map_err(map_sqlx_error)
    }

    async fn update_requirement(
        &self,
        requirement_id: DbId,
        patch: &RequirementPatch,
        modified_by: DbId,
    ) -> StoreResult<Option<PositionCompetencyRequirement>> {
        let updated = RequirementRepo::update(&self.pool, requirement_id, patch, modified_by)
            .await
            .map_err(map_sqlx_error)?;
        if let Some(row) = updated {
            return Ok(Some(row.into()));
        }
        // No row matched: either it is gone or the optimistic check failed.
        match self.find_requirement(requirement_id).await? {
            Some(current) => {
                requirement::ensure_not_stale(&current, patch.expected_modified_at)?;
                Err(CoreError::ConflictStale(format!(
                    "Requirement {requirement_id} changed concurrently"
                )))
            }
            None => Ok(None),
        }
    }

    async fn delete_requirement(&self, requirement_id: DbId) -> StoreResult<bool> {
        RequirementRepo::delete(&self.pool, requirement_id)
            .await
            .map_err(map_sqlx_error)
    }

    /* ---- Assignments ---- */

    async fn list_assignments(&self, set_id: DbId) -> StoreResult<Vec<PositionSetAssignment>> {
        AssignmentRepo::list_by_set(&self.pool, set_id)
            .await
            .map(rows)
            .map_err(map_sqlx_error)
    }

    async fn find_assignment(
        &self,
        assignment_id: DbId,
    ) -> StoreResult<Option<PositionSetAssignment>> {
        AssignmentRepo::find_by_id(&self.pool, assignment_id)
            .await
            .map(|row| row.map(PositionSetAssignment::from))
            .map_err(map_sqlx_error)
    }

    async fn find_assignment_for(
        &self,
        set_id: DbId,
        position_id: DbId,
    ) -> StoreResult<Option<PositionSetAssignment>> {
        AssignmentRepo::find_by_set_and_position(&self.pool, set_id, position_id)
            .await
            .map(|row| row.map(PositionSetAssignment::from))
            .map_err(map_sqlx_error)
    }

    async fn create_assignment(
        &self,
        input: &NewAssignment,
    ) -> StoreResult<PositionSetAssignment> {
        AssignmentRepo::create(&self.pool, input)
            .await
            .map(PositionSetAssignment::from)
            .map_err(map_sqlx_error)
    }

    async fn record_sync(
        &self,
        assignment_id: DbId,
        input: &SyncRecord,
    ) -> StoreResult<Option<PositionSetAssignment>> {
        AssignmentRepo::record_sync(&self.pool, assignment_id, input)
            .await
            .map(|row| row.map(PositionSetAssignment::from))
            .map_err(map_sqlx_error)
    }

    async fn delete_assignment(&self, assignment_id: DbId) -> StoreResult<bool> {
        AssignmentRepo::delete(&self.pool, assignment_id)
            .await
            .map_err(map_sqlx_error)
    }

    async fn count_assignments(&self, set_id: DbId) -> StoreResult<i64> {
        AssignmentRepo::count_by_set(&self.pool, set_id)
            .await
            .map_err(map_sqlx_error)
    }
}
