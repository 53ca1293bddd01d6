//! Backing store port.
//!
//! The engine never talks to a database directly. Every read and write goes
//! through [`CompetencyStore`], implemented by the Postgres adapter in
//! `competency-db` and by the in-memory adapter in `competency-engine`.
//! Each method is a single independent call: there is no multi-call
//! transaction, and writes are last-write-wins per row.

use async_trait::async_trait;

use crate::assignment::{NewAssignment, PositionSetAssignment, SyncRecord};
use crate::competency_set::{
    CompetencySet, CompetencySetItem, NewCompetencySet, NewSetItem, SetItemUpdate,
    SetMetadataUpdate, VisibilityFilter,
};
use crate::error::CoreError;
use crate::reference::{Competency, Position};
use crate::requirement::{PositionCompetencyRequirement, RequirementPatch, RequirementUpsert};
use crate::types::DbId;

/// Result alias for store calls.
pub type StoreResult<T> = Result<T, CoreError>;

/// Which sets a listing returns.
///
/// `All` means public sets plus the viewer's own private sets; `Private`
/// means only the viewer's own private sets.
#[derive(Debug, Clone, Copy)]
pub struct SetListFilter {
    pub visibility: VisibilityFilter,
    pub viewer_id: DbId,
    pub include_inactive: bool,
}

#[async_trait]
pub trait CompetencyStore: Send + Sync {
    /// Verify the store is reachable.
    async fn health_check(&self) -> StoreResult<()>;

    // --- Sets ---

    async fn list_sets(&self, filter: &SetListFilter) -> StoreResult<Vec<CompetencySet>>;

    async fn find_set(&self, set_id: DbId) -> StoreResult<Option<CompetencySet>>;

    async fn create_set(&self, input: &NewCompetencySet) -> StoreResult<CompetencySet>;

    async fn update_set(
        &self,
        set_id: DbId,
        input: &SetMetadataUpdate,
    ) -> StoreResult<Option<CompetencySet>>;

    /// Hard delete; items cascade. Returns `true` if a row was removed.
    async fn delete_set(&self, set_id: DbId) -> StoreResult<bool>;

    /// Soft delete. Returns `true` if the set was active.
    async fn deactivate_set(&self, set_id: DbId) -> StoreResult<bool>;

    // --- Items ---

    /// Items of a set ordered by `display_order`.
    async fn list_items(&self, set_id: DbId) -> StoreResult<Vec<CompetencySetItem>>;

    async fn create_item(&self, set_id: DbId, input: &NewSetItem)
        -> StoreResult<CompetencySetItem>;

    async fn update_item(
        &self,
        item_id: DbId,
        input: &SetItemUpdate,
    ) -> StoreResult<Option<CompetencySetItem>>;

    async fn delete_item(&self, item_id: DbId) -> StoreResult<bool>;

    // --- Reference data ---

    /// The subset of `ids` that exist.
    async fn find_competencies(&self, ids: &[DbId]) -> StoreResult<Vec<Competency>>;

    async fn find_position(&self, position_id: DbId) -> StoreResult<Option<Position>>;

    async fn list_positions(&self) -> StoreResult<Vec<Position>>;

    // --- Requirements ---

    async fn list_requirements(
        &self,
        position_id: DbId,
    ) -> StoreResult<Vec<PositionCompetencyRequirement>>;

    async fn find_requirement(
        &self,
        requirement_id: DbId,
    ) -> StoreResult<Option<PositionCompetencyRequirement>>;

    /// Insert, or overwrite level and flag of the existing row for
    /// `(position_id, competency_id)` keeping its id and `created_at`.
    async fn upsert_requirement(
        &self,
        position_id: DbId,
        input: &RequirementUpsert,
        modified_by: DbId,
    ) -> StoreResult<PositionCompetencyRequirement>;

    /// Patch a row. Fails with [`CoreError::ConflictStale`] when
    /// `expected_modified_at` no longer matches.
    async fn update_requirement(
        &self,
        requirement_id: DbId,
        patch: &RequirementPatch,
        modified_by: DbId,
    ) -> StoreResult<Option<PositionCompetencyRequirement>>;

    async fn delete_requirement(&self, requirement_id: DbId) -> StoreResult<bool>;

    // --- Assignments ---

    async fn list_assignments(&self, set_id: DbId) -> StoreResult<Vec<PositionSetAssignment>>;

    async fn find_assignment(
        &self,
        assignment_id: DbId,
    ) -> StoreResult<Option<PositionSetAssignment>>;

    async fn find_assignment_for(
        &self,
        set_id: DbId,
        position_id: DbId,
    ) -> StoreResult<Option<PositionSetAssignment>>;

    async fn create_assignment(&self, input: &NewAssignment)
        -> StoreResult<PositionSetAssignment>;

    async fn record_sync(
        &self,
        assignment_id: DbId,
        input: &SyncRecord,
    ) -> StoreResult<Option<PositionSetAssignment>>;

    async fn delete_assignment(&self, assignment_id: DbId) -> StoreResult<bool>;

    async fn count_assignments(&self, set_id: DbId) -> StoreResult<i64>;
}
