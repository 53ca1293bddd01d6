//! Assignment tracker: which positions a set is linked to, and whether
//! each link is in sync.

use std::collections::HashSet;

use competency_core::actor::ActingUser;
use competency_core::assignment::{AssignmentStatus, NewAssignment, PositionSetAssignment};
use competency_core::error::{CoreError, FailedTarget, PartialApplyReport};
use competency_core::reference::Position;
use competency_core::types::DbId;

use crate::context::EngineContext;
use crate::drift::DriftDetector;
use crate::merge::MergeEngine;

pub struct AssignmentTracker {
    ctx: EngineContext,
}

impl AssignmentTracker {
    pub fn new(ctx: EngineContext) -> Self {
        Self { ctx }
    }

    /// Link positions to a set.
    ///
    /// With `copy_items = false` only the association is recorded and the
    /// first merge happens later. With `copy_items = true` each position is
    /// handed to the merge engine immediately. Positions that are already
    /// linked keep their existing row.
    ///
    /// All positions are checked for existence before anything is written.
    /// Per-position failures are aggregated into one
    /// [`CoreError::PartialApply`] keyed by position id. When every position
    /// fails, the first failure is returned as is.
    pub async fn assign(
        &self,
        set_id: DbId,
        position_ids: &[DbId],
        copy_items: bool,
        user: ActingUser,
    ) -> Result<Vec<PositionSetAssignment>, CoreError> {
        if position_ids.is_empty() {
            return Err(CoreError::Validation(
                "At least one position id is required".to_string(),
            ));
        }
        self.ctx.require_visible_set(set_id, user.id()).await?;

        let mut seen = HashSet::new();
        let unique: Vec<DbId> = position_ids
            .iter()
            .copied()
            .filter(|id| seen.insert(*id))
            .collect();
        for position_id in &unique {
            self.ctx.require_position(*position_id).await?;
        }

        let merge = MergeEngine::new(self.ctx.clone());
        let mut assignments = Vec::with_capacity(unique.len());
        let mut report = PartialApplyReport::new("position");
        let mut first_error = None;

        for position_id in unique {
            let outcome = if copy_items {
                merge
                    .apply_set(set_id, position_id, user)
                    .await
                    .map(|result| result.assignment)
            } else {
                self.link(set_id, position_id, user).await
            };
            match outcome {
                Ok(assignment) => {
                    report.succeeded.push(position_id);
                    assignments.push(assignment);
                }
                Err(err) => {
                    tracing::warn!(set_id, position_id, error = %err, "Position assignment failed");
                    report.failed.push(FailedTarget {
                        id: position_id,
                        reason: err.to_string(),
                    });
                    if first_error.is_none() {
                        first_error = Some(err);
                    }
                }
            }
        }

        if report.succeeded.is_empty() {
            if let Some(err) = first_error {
                return Err(err);
            }
        }
        if !report.is_complete() {
            return Err(report.into());
        }
        tracing::info!(
            set_id,
            count = assignments.len(),
            copy_items,
            user_id = user.id(),
            "Positions assigned to competency set"
        );
        Ok(assignments)
    }

    async fn link(
        &self,
        set_id: DbId,
        position_id: DbId,
        user: ActingUser,
    ) -> Result<PositionSetAssignment, CoreError> {
        let existing = self
            .ctx
            .call(
                "find_assignment_for",
                self.ctx.store().find_assignment_for(set_id, position_id),
            )
            .await?;
        if let Some(assignment) = existing {
            return Ok(assignment);
        }
        let input = NewAssignment {
            set_id,
            position_id,
            assigned_by: user.id(),
            source_competency_ids: Vec::new(),
            synced_at: None,
        };
        let created = self
            .ctx
            .call(
                "create_assignment",
                self.ctx.store().create_assignment(&input),
            )
            .await;
        match created {
            Err(CoreError::Conflict(reason)) => self
                .ctx
                .call(
                    "find_assignment_for",
                    self.ctx.store().find_assignment_for(set_id, position_id),
                )
                .await?
                .ok_or(CoreError::Conflict(reason)),
            other => other,
        }
    }

    /// Delete the association only. Requirements stay on the position.
    pub async fn unassign(
        &self,
        set_id: DbId,
        assignment_id: DbId,
        user: ActingUser,
    ) -> Result<(), CoreError> {
        self.ctx.require_visible_set(set_id, user.id()).await?;
        self.require_assignment(set_id, assignment_id).await?;
        let deleted = self
            .ctx
            .call(
                "delete_assignment",
                self.ctx.store().delete_assignment(assignment_id),
            )
            .await?;
        if !deleted {
            return Err(CoreError::NotFound {
                entity: "PositionSetAssignment",
                id: assignment_id,
            });
        }
        tracing::info!(set_id, assignment_id, user_id = user.id(), "Position unassigned");
        Ok(())
    }

    /// Linked positions annotated with their computed sync state.
    pub async fn list_assignments(
        &self,
        set_id: DbId,
        viewer_id: DbId,
    ) -> Result<Vec<AssignmentStatus>, CoreError> {
        self.ctx.require_visible_set(set_id, viewer_id).await?;
        let items = self
            .ctx
            .call("list_items", self.ctx.store().list_items(set_id))
            .await?;
        let assignments = self
            .ctx
            .call("list_assignments", self.ctx.store().list_assignments(set_id))
            .await?;

        let detector = DriftDetector::new(self.ctx.clone());
        let mut statuses = Vec::with_capacity(assignments.len());
        for assignment in assignments {
            let position_title = self
                .ctx
                .call(
                    "find_position",
                    self.ctx.store().find_position(assignment.position_id),
                )
                .await?
                .map(|p| p.title)
                .unwrap_or_default();
            let pending_changes = detector.changes_for(&items, &assignment).await?.len();
            statuses.push(AssignmentStatus {
                assignment,
                position_title,
                is_synced: pending_changes == 0,
                pending_changes,
            });
        }
        Ok(statuses)
    }

    /// Positions not yet linked to the set.
    pub async fn list_available_positions(
        &self,
        set_id: DbId,
        viewer_id: DbId,
    ) -> Result<Vec<Position>, CoreError> {
        self.ctx.require_visible_set(set_id, viewer_id).await?;
        let linked: HashSet<DbId> = self
            .ctx
            .call("list_assignments", self.ctx.store().list_assignments(set_id))
            .await?
            .into_iter()
            .map(|a| a.position_id)
            .collect();
        let positions = self
            .ctx
            .call("list_positions", self.ctx.store().list_positions())
            .await?;
        Ok(positions
            .into_iter()
            .filter(|p| !linked.contains(&p.id))
            .collect())
    }

    /// Load an assignment and check it belongs to `set_id`.
    pub async fn require_assignment(
        &self,
        set_id: DbId,
        assignment_id: DbId,
    ) -> Result<PositionSetAssignment, CoreError> {
        self.ctx
            .call(
                "find_assignment",
                self.ctx.store().find_assignment(assignment_id),
            )
            .await?
            .filter(|a| a.set_id == set_id)
            .ok_or(CoreError::NotFound {
                entity: "PositionSetAssignment",
                id: assignment_id,
            })
    }
}
