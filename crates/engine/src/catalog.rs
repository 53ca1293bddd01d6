//! Set catalog: competency-set definitions and their ordered item lists.

use serde::Serialize;

use competency_core::actor::ActingUser;
use competency_core::competency_set::{
    self, CompetencySet, CompetencySetItem, CompetencySetWithItems, CreateCompetencySet,
    MoveDirection, NewCompetencySet, NewSetItem, SetItemInput, SetItemUpdate, SetMetadataUpdate,
    UpdateCompetencySet, UpdateSetItem, Visibility,
};
use competency_core::error::CoreError;
use competency_core::store::SetListFilter;
use competency_core::types::DbId;

use crate::context::EngineContext;

/// What `delete` did to the set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeleteOutcome {
    /// No assignments referenced the set; it and its items are gone.
    Deleted,
    /// Assignments exist; the set was marked inactive instead.
    Deactivated,
}

pub struct SetCatalog {
    ctx: EngineContext,
}

impl SetCatalog {
    pub fn new(ctx: EngineContext) -> Self {
        Self { ctx }
    }

    /// Sets visible under `filter`.
    pub async fn list(&self, filter: &SetListFilter) -> Result<Vec<CompetencySet>, CoreError> {
        let sets = self
            .ctx
            .call("list_sets", self.ctx.store().list_sets(filter))
            .await?;
        tracing::debug!(count = sets.len(), viewer_id = filter.viewer_id, "Listed competency sets");
        Ok(sets)
    }

    /// A set with its items. Private sets of other owners are reported as missing.
    pub async fn get(
        &self,
        set_id: DbId,
        viewer_id: DbId,
    ) -> Result<CompetencySetWithItems, CoreError> {
        let set = self.ctx.require_visible_set(set_id, viewer_id).await?;
        let items = self.list_items(set_id).await?;
        Ok(CompetencySetWithItems { set, items })
    }

    /// Items of a set ordered by `display_order`.
    async fn list_items(&self, set_id: DbId) -> Result<Vec<CompetencySetItem>, CoreError> {
        self.ctx
            .call("list_items", self.ctx.store().list_items(set_id))
            .await
    }

    /// Create a set and its items. Items are numbered in request order.
    pub async fn create(
        &self,
        input: &CreateCompetencySet,
        user: ActingUser,
    ) -> Result<CompetencySetWithItems, CoreError> {
        let scale = self.ctx.config().level_scale;
        competency_set::validate_set_name(&input.name)?;
        competency_set::validate_description(input.description.as_deref())?;
        competency_set::validate_items(&input.items, &scale)?;
        self.ctx
            .require_competencies(&competency_ids(&input.items))
            .await?;

        let new_set = NewCompetencySet {
            name: input.name.trim().to_string(),
            description: input.description.clone(),
            visibility: input.visibility.unwrap_or(Visibility::Private),
            owner_id: user.id(),
        };
        let set = self
            .ctx
            .call("create_set", self.ctx.store().create_set(&new_set))
            .await?;

        let mut items = Vec::with_capacity(input.items.len());
        for (index, item) in input.items.iter().enumerate() {
            let new_item = NewSetItem {
                competency_id: item.competency_id,
                required_level: item.required_level,
                is_mandatory: item.is_mandatory,
                display_order: index as i32 + 1,
            };
            let created = self
                .ctx
                .call("create_item", self.ctx.store().create_item(set.id, &new_item))
                .await?;
            items.push(created);
        }

        tracing::info!(
            set_id = set.id,
            name = %set.name,
            items = items.len(),
            user_id = user.id(),
            "Competency set created"
        );

        let set = self.ctx.require_set(set.id).await?;
        Ok(CompetencySetWithItems { set, items })
    }

    /// Replace metadata and, when `input.items` is present, reconcile the
    /// item list by competency identity.
    pub async fn update(
        &self,
        set_id: DbId,
        input: &UpdateCompetencySet,
        user: ActingUser,
    ) -> Result<CompetencySetWithItems, CoreError> {
        let scale = self.ctx.config().level_scale;
        if let Some(name) = &input.name {
            competency_set::validate_set_name(name)?;
        }
        competency_set::validate_description(input.description.as_deref())?;
        if let Some(items) = &input.items {
            competency_set::validate_items(items, &scale)?;
        }

        self.ctx.require_visible_set(set_id, user.id()).await?;
        if let Some(items) = &input.items {
            self.ctx.require_competencies(&competency_ids(items)).await?;
        }

        let metadata = SetMetadataUpdate {
            name: input.name.as_ref().map(|n| n.trim().to_string()),
            description: input.description.as_ref().map(|d| d.trim().to_string()),
            visibility: input.visibility,
        };
        if metadata.name.is_some()
            || metadata.description.is_some()
            || metadata.visibility.is_some()
        {
            self.ctx
                .call("update_set", self.ctx.store().update_set(set_id, &metadata))
                .await?
                .ok_or(CoreError::NotFound {
                    entity: "CompetencySet",
                    id: set_id,
                })?;
        }

        if let Some(desired) = &input.items {
            let stored = self.list_items(set_id).await?;
            let plan = competency_set::plan_item_reconciliation(&stored, desired);
            tracing::debug!(
                set_id,
                deletes = plan.deletes.len(),
                updates = plan.updates.len(),
                inserts = plan.inserts.len(),
                "Reconciling competency set items"
            );

            for item_id in &plan.deletes {
                self.ctx
                    .call("delete_item", self.ctx.store().delete_item(*item_id))
                    .await?;
            }
            for planned in &plan.updates {
                self.ctx
                    .call(
                        "update_item",
                        self.ctx.store().update_item(planned.item_id, &planned.update),
                    )
                    .await?;
            }
            for new_item in &plan.inserts {
                self.ctx
                    .call("create_item", self.ctx.store().create_item(set_id, new_item))
                    .await?;
            }
        }

        tracing::info!(set_id, user_id = user.id(), "Competency set updated");

        let set = self.ctx.require_set(set_id).await?;
        let items = self.list_items(set_id).await?;
        Ok(CompetencySetWithItems { set, items })
    }

    /// Delete a set, or deactivate it when positions are still assigned.
    pub async fn delete(&self, set_id: DbId, user: ActingUser) -> Result<DeleteOutcome, CoreError> {
        self.ctx.require_visible_set(set_id, user.id()).await?;
        let assignments = self
            .ctx
            .call("count_assignments", self.ctx.store().count_assignments(set_id))
            .await?;

        let outcome = if assignments > 0 {
            self.ctx
                .call("deactivate_set", self.ctx.store().deactivate_set(set_id))
                .await?;
            DeleteOutcome::Deactivated
        } else {
            let deleted = self
                .ctx
                .call("delete_set", self.ctx.store().delete_set(set_id))
                .await?;
            if !deleted {
                return Err(CoreError::NotFound {
                    entity: "CompetencySet",
                    id: set_id,
                });
            }
            DeleteOutcome::Deleted
        };

        tracing::info!(
            set_id,
            assignments,
            ?outcome,
            user_id = user.id(),
            "Competency set removed"
        );
        Ok(outcome)
    }

    /// Append one item to the end of a set.
    pub async fn add_item(
        &self,
        set_id: DbId,
        input: &SetItemInput,
        user: ActingUser,
    ) -> Result<CompetencySetItem, CoreError> {
        self.ctx.config().level_scale.validate(input.required_level)?;
        self.ctx.require_visible_set(set_id, user.id()).await?;
        let stored = self.list_items(set_id).await?;
        if stored.iter().any(|i| i.competency_id == input.competency_id) {
            return Err(CoreError::DuplicateItem {
                competency_id: input.competency_id,
            });
        }
        self.ctx.require_competencies(&[input.competency_id]).await?;

        let new_item = NewSetItem {
            competency_id: input.competency_id,
            required_level: input.required_level,
            is_mandatory: input.is_mandatory,
            display_order: stored.len() as i32 + 1,
        };
        let item = self
            .ctx
            .call("create_item", self.ctx.store().create_item(set_id, &new_item))
            .await?;
        tracing::info!(set_id, item_id = item.id, user_id = user.id(), "Competency set item added");
        Ok(item)
    }

    /// Change level and/or mandatory flag of one item.
    pub async fn update_item(
        &self,
        set_id: DbId,
        item_id: DbId,
        input: &UpdateSetItem,
        user: ActingUser,
    ) -> Result<CompetencySetItem, CoreError> {
        if let Some(level) = input.required_level {
            self.ctx.config().level_scale.validate(level)?;
        }
        self.require_item(set_id, item_id, user.id()).await?;

        let update = SetItemUpdate {
            required_level: input.required_level,
            is_mandatory: input.is_mandatory,
            display_order: None,
        };
        let item = self
            .ctx
            .call("update_item", self.ctx.store().update_item(item_id, &update))
            .await?
            .ok_or(CoreError::NotFound {
                entity: "CompetencySetItem",
                id: item_id,
            })?;
        tracing::info!(set_id, item_id, user_id = user.id(), "Competency set item updated");
        Ok(item)
    }

    /// Remove one item and close the gap in `display_order`.
    pub async fn remove_item(
        &self,
        set_id: DbId,
        item_id: DbId,
        user: ActingUser,
    ) -> Result<Vec<CompetencySetItem>, CoreError> {
        self.require_item(set_id, item_id, user.id()).await?;
        self.ctx
            .call("delete_item", self.ctx.store().delete_item(item_id))
            .await?;

        let remaining = self.list_items(set_id).await?;
        self.write_orders(&competency_set::plan_dense_renumber(&remaining))
            .await?;
        tracing::info!(set_id, item_id, user_id = user.id(), "Competency set item removed");
        self.list_items(set_id).await
    }

    /// Swap an item with its neighbour. First-up and last-down are no-ops.
    pub async fn move_item(
        &self,
        set_id: DbId,
        item_id: DbId,
        direction: MoveDirection,
        user: ActingUser,
    ) -> Result<Vec<CompetencySetItem>, CoreError> {
        self.ctx.require_visible_set(set_id, user.id()).await?;
        let items = self.list_items(set_id).await?;
        let plan = competency_set::plan_item_move(&items, item_id, direction)?;
        if plan.is_empty() {
            return Ok(items);
        }
        self.write_orders(&plan).await?;
        tracing::debug!(
            set_id,
            item_id,
            ?direction,
            user_id = user.id(),
            "Competency set item moved"
        );
        self.list_items(set_id).await
    }

    async fn require_item(
        &self,
        set_id: DbId,
        item_id: DbId,
        viewer_id: DbId,
    ) -> Result<CompetencySetItem, CoreError> {
        self.ctx.require_visible_set(set_id, viewer_id).await?;
        self.list_items(set_id)
            .await?
            .into_iter()
            .find(|i| i.id == item_id)
            .ok_or(CoreError::NotFound {
                entity: "CompetencySetItem",
                id: item_id,
            })
    }

    async fn write_orders(&self, plan: &[(DbId, i32)]) -> Result<(), CoreError> {
        for (item_id, display_order) in plan {
            let update = SetItemUpdate {
                display_order: Some(*display_order),
                ..SetItemUpdate::default()
            };
            self.ctx
                .call("update_item", self.ctx.store().update_item(*item_id, &update))
                .await?;
        }
        Ok(())
    }
}

fn competency_ids(items: &[SetItemInput]) -> Vec<DbId> {
    items.iter().map(|i| i.competency_id).collect()
}
