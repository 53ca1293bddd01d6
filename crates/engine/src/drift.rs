//! Drift detector and "fully applied" evaluation.
//!
//! Read-only: nothing here writes to the store.

use serde::Serialize;

use competency_core::assignment::PositionSetAssignment;
use competency_core::competency_set::{CompetencySet, CompetencySetItem, VisibilityFilter};
use competency_core::drift::{self, CompetencyChange};
use competency_core::error::CoreError;
use competency_core::store::SetListFilter;
use competency_core::types::DbId;

use crate::context::EngineContext;
use crate::requirements::RequirementView;

/// Whether a visible set's minimum bar is met on a position.
#[derive(Debug, Clone, Serialize)]
pub struct SetCoverage {
    pub set: CompetencySet,
    pub fully_applied: bool,
}

pub struct DriftDetector {
    ctx: EngineContext,
}

impl DriftDetector {
    pub fn new(ctx: EngineContext) -> Self {
        Self { ctx }
    }

    /// Per-competency changes between the set's current items and the
    /// position's current requirements.
    pub async fn diff(
        &self,
        set_id: DbId,
        position_id: DbId,
        viewer_id: DbId,
    ) -> Result<Vec<CompetencyChange>, CoreError> {
        self.ctx.require_visible_set(set_id, viewer_id).await?;
        self.ctx.require_position(position_id).await?;

        let items = self
            .ctx
            .call("list_items", self.ctx.store().list_items(set_id))
            .await?;
        let assignment = self
            .ctx
            .call(
                "find_assignment_for",
                self.ctx.store().find_assignment_for(set_id, position_id),
            )
            .await?;
        let source_ids = assignment
            .map(|a| a.source_competency_ids)
            .unwrap_or_default();

        let requirements = RequirementView::new(self.ctx.clone())
            .list_unchecked(position_id)
            .await?;
        let changes = drift::detect_changes(&items, &requirements, &source_ids);
        tracing::debug!(set_id, position_id, changes = changes.len(), "Computed drift");
        Ok(changes)
    }

    /// Changes for an already-loaded assignment and set item list.
    pub(crate) async fn changes_for(
        &self,
        items: &[CompetencySetItem],
        assignment: &PositionSetAssignment,
    ) -> Result<Vec<CompetencyChange>, CoreError> {
        let requirements = RequirementView::new(self.ctx.clone())
            .list_unchecked(assignment.position_id)
            .await?;
        Ok(drift::detect_changes(
            items,
            &requirements,
            &assignment.source_competency_ids,
        ))
    }

    /// `true` iff [`diff`](Self::diff) is empty.
    pub async fn is_synced(
        &self,
        set_id: DbId,
        position_id: DbId,
        viewer_id: DbId,
    ) -> Result<bool, CoreError> {
        Ok(self.diff(set_id, position_id, viewer_id).await?.is_empty())
    }

    /// Whether every item of the set is met at or above its level on the position.
    pub async fn is_fully_applied(
        &self,
        set_id: DbId,
        position_id: DbId,
        viewer_id: DbId,
    ) -> Result<bool, CoreError> {
        self.ctx.require_visible_set(set_id, viewer_id).await?;
        self.ctx.require_position(position_id).await?;
        let items = self
            .ctx
            .call("list_items", self.ctx.store().list_items(set_id))
            .await?;
        let requirements = RequirementView::new(self.ctx.clone())
            .list_unchecked(position_id)
            .await?;
        Ok(drift::is_fully_applied(&items, &requirements))
    }

    /// Evaluate every active set visible to `viewer_id` against a position.
    pub async fn fully_applied_sets(
        &self,
        position_id: DbId,
        viewer_id: DbId,
    ) -> Result<Vec<SetCoverage>, CoreError> {
        self.ctx.require_position(position_id).await?;
        let requirements = RequirementView::new(self.ctx.clone())
            .list_unchecked(position_id)
            .await?;

        let filter = SetListFilter {
            visibility: VisibilityFilter::All,
            viewer_id,
            include_inactive: false,
        };
        let sets = self
            .ctx
            .call("list_sets", self.ctx.store().list_sets(&filter))
            .await?;

        let mut coverage = Vec::with_capacity(sets.len());
        for set in sets {
            let items = self
                .ctx
                .call("list_items", self.ctx.store().list_items(set.id))
                .await?;
            let fully_applied = drift::is_fully_applied(&items, &requirements);
            coverage.push(SetCoverage { set, fully_applied });
        }
        Ok(coverage)
    }
}
