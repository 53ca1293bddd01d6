//! In-memory [`CompetencyStore`] used by tests and by the API's `memory` backend.
//!
//! Mirrors the Postgres adapter's observable behaviour: unique keys,
//! cascading item deletes, derived `competency_count`, and the optimistic
//! check on requirement patches.

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use competency_core::assignment::{NewAssignment, PositionSetAssignment, SyncRecord};
use competency_core::competency_set::{
    CompetencySet, CompetencySetItem, NewCompetencySet, NewSetItem, SetItemUpdate,
    SetMetadataUpdate, Visibility, VisibilityFilter,
};
use competency_core::error::CoreError;
use competency_core::reference::{Competency, Position};
use competency_core::requirement::{
    self, PositionCompetencyRequirement, RequirementPatch, RequirementUpsert,
};
use competency_core::store::{CompetencyStore, SetListFilter, StoreResult};
use competency_core::types::DbId;

#[derive(Default)]
struct Tables {
    next_id: DbId,
    competencies: HashMap<DbId, Competency>,
    positions: HashMap<DbId, Position>,
    sets: HashMap<DbId, CompetencySet>,
    items: HashMap<DbId, CompetencySetItem>,
    requirements: HashMap<DbId, PositionCompetencyRequirement>,
    assignments: HashMap<DbId, PositionSetAssignment>,
}

impl Tables {
    fn next_id(&mut self) -> DbId {
        self.next_id += 1;
        self.next_id
    }

    fn competency_name(&self, competency_id: DbId) -> String {
        self.competencies
            .get(&competency_id)
            .map(|c| c.name.clone())
            .unwrap_or_default()
    }

    fn with_count(&self, set: &CompetencySet) -> CompetencySet {
        let count = self.items.values().filter(|i| i.set_id == set.id).count();
        CompetencySet {
            competency_count: count as i64,
            ..set.clone()
        }
    }
}

#[derive(Default)]
struct Faults {
    upsert_failures: HashSet<DbId>,
    latency: Option<Duration>,
}

/// Thread-safe in-process store.
#[derive(Default)]
pub struct InMemoryStore {
    tables: RwLock<Tables>,
    faults: RwLock<Faults>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a competency and return it.
    pub async fn add_competency(&self, name: &str, category: Option<&str>) -> Competency {
        let mut tables = self.tables.write().await;
        let competency = Competency {
            id: tables.next_id(),
            name: name.to_string(),
            category: category.map(str::to_string),
        };
        tables.competencies.insert(competency.id, competency.clone());
        competency
    }

    /// Seed a position and return it.
    pub async fn add_position(&self, title: &str, department: Option<&str>) -> Position {
        let mut tables = self.tables.write().await;
        let position = Position {
            id: tables.next_id(),
            title: title.to_string(),
            department: department.map(str::to_string),
        };
        tables.positions.insert(position.id, position.clone());
        position
    }

    /// Make every later requirement upsert for `competency_id` fail.
    pub async fn inject_upsert_failure(&self, competency_id: DbId) {
        self.faults
            .write()
            .await
            .upsert_failures
            .insert(competency_id);
    }

    /// Clear all injected upsert failures.
    pub async fn clear_upsert_failures(&self) {
        self.faults.write().await.upsert_failures.clear();
    }

    /// Delay every store call by `latency`.
    pub async fn set_latency(&self, latency: Duration) {
        self.faults.write().await.latency = Some(latency);
    }

    async fn delay(&self) {
        let latency = self.faults.read().await.latency;
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
    }
}

#[async_trait]
impl CompetencyStore for InMemoryStore {
    async fn health_check(&self) -> StoreResult<()> {
        self.delay().await;
        Ok(())
    }

    /* ---- Sets ---- */

    async fn list_sets(&self, filter: &SetListFilter) -> StoreResult<Vec<CompetencySet>> {
        self.delay().await;
        let tables = self.tables.read().await;
        let mut sets: Vec<CompetencySet> = tables
            .sets
            .values()
            .filter(|s| filter.include_inactive || s.is_active)
            .filter(|s| match filter.visibility {
                VisibilityFilter::Public => s.visibility == Visibility::Public,
                VisibilityFilter::Private => {
                    s.visibility == Visibility::Private && s.owner_id == filter.viewer_id
                }
                VisibilityFilter::All => s.is_visible_to(filter.viewer_id),
            })
            .map(|s| tables.with_count(s))
            .collect();
        sets.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(sets)
    }

    async fn find_set(&self, set_id: DbId) -> StoreResult<Option<CompetencySet>> {
        self.delay().await;
        let tables = self.tables.read().await;
        Ok(tables.sets.get(&set_id).map(|s| tables.with_count(s)))
    }

    async fn create_set(&self, input: &NewCompetencySet) -> StoreResult<CompetencySet> {
        self.delay().await;
        let mut tables = self.tables.write().await;
        let now = Utc::now();
        let set = CompetencySet {
            id: tables.next_id(),
            name: input.name.clone(),
            description: input.description.clone(),
            visibility: input.visibility,
            owner_id: input.owner_id,
            is_active: true,
            competency_count: 0,
            created_at: now,
            updated_at: now,
        };
        tables.sets.insert(set.id, set.clone());
        Ok(set)
    }

    async fn update_set(
        &self,
        set_id: DbId,
        input: &SetMetadataUpdate,
    ) -> StoreResult<Option<CompetencySet>> {
        self.delay().await;
        let mut tables = self.tables.write().await;
        let Some(set) = tables.sets.get_mut(&set_id) else {
            return Ok(None);
        };
        if let Some(name) = &input.name {
            set.name = name.clone();
        }
        if let Some(description) = &input.description {
            set.description = Some(description.clone()).filter(|d| !d.is_empty());
        }
        if let Some(visibility) = input.visibility {
            set.visibility = visibility;
        }
        set.updated_at = Utc::now();
        let set = set.clone();
        Ok(Some(tables.with_count(&set)))
    }

    async fn delete_set(&self, set_id: DbId) -> StoreResult<bool> {
        self.delay().await;
        let mut tables = self.tables.write().await;
        if tables.assignments.values().any(|a| a.set_id == set_id) {
            return Err(CoreError::Conflict(format!(
                "Competency set {set_id} is still assigned to positions"
            )));
        }
        let removed = tables.sets.remove(&set_id).is_some();
        tables.items.retain(|_, item| item.set_id != set_id);
        Ok(removed)
    }

    async fn deactivate_set(&self, set_id: DbId) -> StoreResult<bool> {
        self.delay().await;
        let mut tables = self.tables.write().await;
        match tables.sets.get_mut(&set_id) {
            Some(set) if set.is_active => {
                set.is_active = false;
                set.updated_at = Utc::now();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    /* ---- Items ---- */

    async fn list_items(&self, set_id: DbId) -> StoreResult<Vec<CompetencySetItem>> {
        self.delay().await;
        let tables = self.tables.read().await;
        let mut items: Vec<CompetencySetItem> = tables
            .items
            .values()
            .filter(|i| i.set_id == set_id)
            .cloned()
            .collect();
        items.sort_by_key(|i| (i.display_order, i.id));
        Ok(items)
    }

    async fn create_item(
        &self,
        set_id: DbId,
        input: &NewSetItem,
    ) -> StoreResult<CompetencySetItem> {
        self.delay().await;
        let mut tables = self.tables.write().await;
        if !tables.sets.contains_key(&set_id) {
            return Err(CoreError::NotFound {
                entity: "CompetencySet",
                id: set_id,
            });
        }
        if tables
            .items
            .values()
            .any(|i| i.set_id == set_id && i.competency_id == input.competency_id)
        {
            return Err(CoreError::DuplicateItem {
                competency_id: input.competency_id,
            });
        }
        let item = CompetencySetItem {
            id: tables.next_id(),
            set_id,
            competency_id: input.competency_id,
            competency_name: tables.competency_name(input.competency_id),
            required_level: input.required_level,
            is_mandatory: input.is_mandatory,
            display_order: input.display_order,
        };
        tables.items.insert(item.id, item.clone());
        Ok(item)
    }

    async fn update_item(
        &self,
        item_id: DbId,
        input: &SetItemUpdate,
    ) -> StoreResult<Option<CompetencySetItem>> {
        self.delay().await;
        let mut tables = self.tables.write().await;
        let Some(item) = tables.items.get_mut(&item_id) else {
            return Ok(None);
        };
        if let Some(level) = input.required_level {
            item.required_level = level;
        }
        if let Some(mandatory) = input.is_mandatory {
            item.is_mandatory = mandatory;
        }
        if let Some(order) = input.display_order {
            item.display_order = order;
        }
        Ok(Some(item.clone()))
    }

    async fn delete_item(&self, item_id: DbId) -> StoreResult<bool> {
        self.delay().await;
        let mut tables = self.tables.write().await;
        Ok(tables.items.remove(&item_id).is_some())
    }

    /* ---- Reference data ---- */

    async fn find_competencies(&self, ids: &[DbId]) -> StoreResult<Vec<Competency>> {
        self.delay().await;
        let tables = self.tables.read().await;
        Ok(ids
            .iter()
            .filter_map(|id| tables.competencies.get(id).cloned())
            .collect())
    }

    async fn find_position(&self, position_id: DbId) -> StoreResult<Option<Position>> {
        self.delay().await;
        Ok(self.tables.read().await.positions.get(&position_id).cloned())
    }

    async fn list_positions(&self) -> StoreResult<Vec<Position>> {
        self.delay().await;
        let tables = self.tables.read().await;
        let mut positions: Vec<Position> = tables.positions.values().cloned().collect();
        positions.sort_by(|a, b| a.title.cmp(&b.title).then(a.id.cmp(&b.id)));
        Ok(positions)
    }

    /* ---- Requirements ---- */

    async fn list_requirements(
        &self,
        position_id: DbId,
    ) -> StoreResult<Vec<PositionCompetencyRequirement>> {
        self.delay().await;
        let tables = self.tables.read().await;
        let mut requirements: Vec<PositionCompetencyRequirement> = tables
            .requirements
            .values()
            .filter(|r| r.position_id == position_id)
            .cloned()
            .collect();
        requirements.sort_by(|a, b| {
            a.competency_name
                .cmp(&b.competency_name)
                .then(a.id.cmp(&b.id))
        });
        Ok(requirements)
    }

    async fn find_requirement(
        &self,
        requirement_id: DbId,
    ) -> StoreResult<Option<PositionCompetencyRequirement>> {
        self.delay().await;
        Ok(self
            .tables
            .read()
            .await
            .requirements
            .get(&requirement_id)
            .cloned())
    }

    async fn upsert_requirement(
        &self,
        position_id: DbId,
        input: &RequirementUpsert,
        modified_by: DbId,
    ) -> StoreResult<PositionCompetencyRequirement> {
        self.delay().await;
        if self
            .faults
            .read()
            .await
            .upsert_failures
            .contains(&input.competency_id)
        {
            return Err(CoreError::store(format!(
                "injected failure for competency {}",
                input.competency_id
            )));
        }

        let mut tables = self.tables.write().await;
        let now = Utc::now();
        let existing = tables
            .requirements
            .values_mut()
            .find(|r| r.position_id == position_id && r.competency_id == input.competency_id);
        if let Some(row) = existing {
            row.required_level = input.required_level;
            row.is_mandatory = input.is_mandatory;
            row.modified_by = Some(modified_by);
            row.modified_at = now;
            return Ok(row.clone());
        }

        let row = PositionCompetencyRequirement {
            id: tables.next_id(),
            position_id,
            competency_id: input.competency_id,
            competency_name: tables.competency_name(input.competency_id),
            required_level: input.required_level,
            is_mandatory: input.is_mandatory,
            modified_by: Some(modified_by),
            modified_at: now,
            created_at: now,
        };
        tables.requirements.insert(row.id, row.clone());
        Ok(row)
    }

    async fn update_requirement(
        &self,
        requirement_id: DbId,
        patch: &RequirementPatch,
        modified_by: DbId,
    ) -> StoreResult<Option<PositionCompetencyRequirement>> {
        self.delay().await;
        let mut tables = self.tables.write().await;
        let Some(row) = tables.requirements.get_mut(&requirement_id) else {
            return Ok(None);
        };
        requirement::ensure_not_stale(row, patch.expected_modified_at)?;
        if let Some(level) = patch.required_level {
            row.required_level = level;
        }
        if let Some(mandatory) = patch.is_mandatory {
            row.is_mandatory = mandatory;
        }
        row.modified_by = Some(modified_by);
        row.modified_at = Utc::now();
        Ok(Some(row.clone()))
    }

    async fn delete_requirement(&self, requirement_id: DbId) -> StoreResult<bool> {
        self.delay().await;
        Ok(self
            .tables
            .write()
            .await
            .requirements
            .remove(&requirement_id)
            .is_some())
    }

    /* ---- Assignments ---- */

    async fn list_assignments(&self, set_id: DbId) -> StoreResult<Vec<PositionSetAssignment>> {
        self.delay().await;
        let tables = self.tables.read().await;
        let mut assignments: Vec<PositionSetAssignment> = tables
            .assignments
            .values()
            .filter(|a| a.set_id == set_id)
            .cloned()
            .collect();
        assignments.sort_by_key(|a| a.id);
        Ok(assignments)
    }

    async fn find_assignment(
        &self,
        assignment_id: DbId,
    ) -> StoreResult<Option<PositionSetAssignment>> {
        self.delay().await;
        Ok(self
            .tables
            .read()
            .await
            .assignments
            .get(&assignment_id)
            .cloned())
    }

    async fn find_assignment_for(
        &self,
        set_id: DbId,
        position_id: DbId,
    ) -> StoreResult<Option<PositionSetAssignment>> {
        self.delay().await;
        Ok(self
            .tables
            .read()
            .await
            .assignments
            .values()
            .find(|a| a.set_id == set_id && a.position_id == position_id)
            .cloned())
    }

    async fn create_assignment(
        &self,
        input: &NewAssignment,
    ) -> StoreResult<PositionSetAssignment> {
        self.delay().await;
        let mut tables = self.tables.write().await;
        if tables
            .assignments
            .values()
            .any(|a| a.set_id == input.set_id && a.position_id == input.position_id)
        {
            return Err(CoreError::Conflict(format!(
                "Position {} is already assigned to competency set {}",
                input.position_id, input.set_id
            )));
        }
        let assignment = PositionSetAssignment {
            id: tables.next_id(),
            set_id: input.set_id,
            position_id: input.position_id,
            assigned_by: input.assigned_by,
            assigned_at: Utc::now(),
            last_synced_at: input.synced_at,
            source_competency_ids: input.source_competency_ids.clone(),
        };
        tables.assignments.insert(assignment.id, assignment.clone());
        Ok(assignment)
    }

    async fn record_sync(
        &self,
        assignment_id: DbId,
        input: &SyncRecord,
    ) -> StoreResult<Option<PositionSetAssignment>> {
        self.delay().await;
        let mut tables = self.tables.write().await;
        let Some(assignment) = tables.assignments.get_mut(&assignment_id) else {
            return Ok(None);
        };
        assignment.source_competency_ids = input.source_competency_ids.clone();
        if let Some(synced_at) = input.synced_at {
            assignment.last_synced_at = Some(synced_at);
        }
        Ok(Some(assignment.clone()))
    }

    async fn delete_assignment(&self, assignment_id: DbId) -> StoreResult<bool> {
        self.delay().await;
        Ok(self
            .tables
            .write()
            .await
            .assignments
            .remove(&assignment_id)
            .is_some())
    }

    async fn count_assignments(&self, set_id: DbId) -> StoreResult<i64> {
        self.delay().await;
        let tables = self.tables.read().await;
        Ok(tables
            .assignments
            .values()
            .filter(|a| a.set_id == set_id)
            .count() as i64)
    }
}
