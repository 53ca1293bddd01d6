//! Merge engine: applies a set's items onto a position with union /
//! overwrite-duplicates semantics and records the assignment.

use chrono::Utc;
use tokio_util::sync::CancellationToken;

use competency_core::actor::ActingUser;
use competency_core::assignment::{NewAssignment, PositionSetAssignment, SyncRecord};
use competency_core::error::{CoreError, FailedTarget, PartialApplyReport};
use competency_core::merge::{self, MergeAction, MergeResult};
use competency_core::types::DbId;

use crate::context::EngineContext;
use crate::requirements::RequirementView;

pub struct MergeEngine {
    ctx: EngineContext,
}

impl MergeEngine {
    pub fn new(ctx: EngineContext) -> Self {
        Self { ctx }
    }

    /// Apply every item of `set_id` onto `position_id`.
    ///
    /// Idempotent: a second apply finds every requirement unchanged and
    /// reuses the existing assignment row.
    pub async fn apply_set(
        &self,
        set_id: DbId,
        position_id: DbId,
        user: ActingUser,
    ) -> Result<MergeResult, CoreError> {
        self.apply_set_with_cancel(set_id, position_id, user, &CancellationToken::new())
            .await
    }

    /// [`apply_set`](Self::apply_set) that stops before the next per-item
    /// write once `cancel` fires. Items already written stay written.
    ///
    /// Any failed or skipped item turns the result into
    /// [`CoreError::PartialApply`]. In that case the assignment still gains
    /// the competencies that were applied, but `last_synced_at` is left as is.
    pub async fn apply_set_with_cancel(
        &self,
        set_id: DbId,
        position_id: DbId,
        user: ActingUser,
        cancel: &CancellationToken,
    ) -> Result<MergeResult, CoreError> {
        let set = self.ctx.require_visible_set(set_id, user.id()).await?;
        if !set.is_active {
            return Err(CoreError::Validation(format!(
                "Competency set {set_id} is inactive and cannot be applied"
            )));
        }
        self.ctx.require_position(position_id).await?;

        let items = self
            .ctx
            .call("list_items", self.ctx.store().list_items(set_id))
            .await?;
        let scale = self.ctx.config().level_scale;
        for item in &items {
            scale.validate(item.required_level)?;
        }

        let view = RequirementView::new(self.ctx.clone());
        let requirements = view.list_unchecked(position_id).await?;
        let plan = merge::plan_merge(&items, &requirements);

        let mut created = Vec::new();
        let mut updated = Vec::new();
        let mut unchanged = Vec::new();
        let mut report = PartialApplyReport::new("competency");

        for step in &plan {
            let competency_id = step.upsert.competency_id;
            if cancel.is_cancelled() {
                report.not_processed.push(competency_id);
                continue;
            }
            if !step.needs_write() {
                unchanged.push(competency_id);
                report.succeeded.push(competency_id);
                continue;
            }
            match view.upsert(position_id, &step.upsert, user).await {
                Ok(_) => {
                    if step.action == MergeAction::Create {
                        created.push(competency_id);
                    } else {
                        updated.push(competency_id);
                    }
                    report.succeeded.push(competency_id);
                }
                Err(err) => {
                    tracing::warn!(
                        set_id,
                        position_id,
                        competency_id,
                        error = %err,
                        "Requirement upsert failed during apply"
                    );
                    report.failed.push(FailedTarget {
                        id: competency_id,
                        reason: err.to_string(),
                    });
                }
            }
        }

        let previous = self
            .ctx
            .call(
                "find_assignment_for",
                self.ctx.store().find_assignment_for(set_id, position_id),
            )
            .await?;

        if !report.is_complete() {
            if !report.succeeded.is_empty() || previous.is_some() {
                let prior_ids = previous
                    .as_ref()
                    .map(|a| a.source_competency_ids.clone())
                    .unwrap_or_default();
                let record = SyncRecord {
                    source_competency_ids: merge::union_ids(&prior_ids, &report.succeeded),
                    synced_at: None,
                };
                self.write_assignment(set_id, position_id, user, previous, &record)
                    .await?;
            }
            tracing::warn!(
                set_id,
                position_id,
                succeeded = report.succeeded.len(),
                failed = report.failed.len(),
                not_processed = report.not_processed.len(),
                "Competency set partially applied"
            );
            return Err(report.into());
        }

        let record = SyncRecord {
            source_competency_ids: merge::item_competency_ids(&items),
            synced_at: Some(Utc::now()),
        };
        let assignment = self
            .write_assignment(set_id, position_id, user, previous, &record)
            .await?;

        tracing::info!(
            set_id,
            position_id,
            assignment_id = assignment.id,
            created = created.len(),
            updated = updated.len(),
            unchanged = unchanged.len(),
            user_id = user.id(),
            "Competency set applied to position"
        );

        Ok(MergeResult {
            set_id,
            position_id,
            created,
            updated,
            unchanged,
            assignment,
        })
    }

    async fn write_assignment(
        &self,
        set_id: DbId,
        position_id: DbId,
        user: ActingUser,
        previous: Option<PositionSetAssignment>,
        record: &SyncRecord,
    ) -> Result<PositionSetAssignment, CoreError> {
        let existing = match previous {
            Some(existing) => existing,
            None => {
                let input = NewAssignment {
                    set_id,
                    position_id,
                    assigned_by: user.id(),
                    source_competency_ids: record.source_competency_ids.clone(),
                    synced_at: record.synced_at,
                };
                let created = self
                    .ctx
                    .call(
                        "create_assignment",
                        self.ctx.store().create_assignment(&input),
                    )
                    .await;
                match created {
                    Err(CoreError::Conflict(reason)) => {
                        // A concurrent apply inserted the row first.
                        tracing::debug!(
                            set_id,
                            position_id,
                            %reason,
                            "Assignment created concurrently, recording sync on it"
                        );
                        self.ctx
                            .call(
                                "find_assignment_for",
                                self.ctx.store().find_assignment_for(set_id, position_id),
                            )
                            .await?
                            .ok_or(CoreError::Conflict(reason))?
                    }
                    other => return other,
                }
            }
        };
        self.ctx
            .call(
                "record_sync",
                self.ctx.store().record_sync(existing.id, record),
            )
            .await?
            .ok_or(CoreError::NotFound {
                entity: "PositionSetAssignment",
                id: existing.id,
            })
    }
}
