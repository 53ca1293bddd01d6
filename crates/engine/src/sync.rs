//! Sync executor: re-applies a set to an explicit, caller-selected subset
//! of its assignments.
//!
//! There is deliberately no "sync everything out of date" entry point; the
//! caller reviews the drift first and picks assignments.

use std::collections::HashSet;

use tokio_util::sync::CancellationToken;

use competency_core::actor::ActingUser;
use competency_core::error::{CoreError, FailedTarget, PartialApplyReport};
use competency_core::merge::MergeResult;
use competency_core::types::DbId;

use crate::context::EngineContext;
use crate::merge::MergeEngine;
use crate::tracker::AssignmentTracker;

pub struct SyncExecutor {
    ctx: EngineContext,
}

impl SyncExecutor {
    pub fn new(ctx: EngineContext) -> Self {
        Self { ctx }
    }

    /// Re-run the merge for each selected assignment of `set_id`.
    pub async fn sync(
        &self,
        set_id: DbId,
        assignment_ids: &[DbId],
        user: ActingUser,
    ) -> Result<Vec<MergeResult>, CoreError> {
        self.sync_with_cancel(set_id, assignment_ids, user, &CancellationToken::new())
            .await
    }

    /// [`sync`](Self::sync) that stops before the next assignment once
    /// `cancel` fires. Assignments already synced are kept.
    ///
    /// Mixed outcomes become [`CoreError::PartialApply`] keyed by assignment
    /// id. When every assignment fails, the first failure is returned as is.
    pub async fn sync_with_cancel(
        &self,
        set_id: DbId,
        assignment_ids: &[DbId],
        user: ActingUser,
        cancel: &CancellationToken,
    ) -> Result<Vec<MergeResult>, CoreError> {
        if assignment_ids.is_empty() {
            return Err(CoreError::Validation(
                "At least one assignment id is required".to_string(),
            ));
        }
        self.ctx.require_visible_set(set_id, user.id()).await?;

        let tracker = AssignmentTracker::new(self.ctx.clone());
        let mut seen = HashSet::new();
        let mut assignments = Vec::new();
        for assignment_id in assignment_ids {
            if seen.insert(*assignment_id) {
                assignments.push(tracker.require_assignment(set_id, *assignment_id).await?);
            }
        }

        let merge = MergeEngine::new(self.ctx.clone());
        let mut results = Vec::with_capacity(assignments.len());
        let mut report = PartialApplyReport::new("assignment");
        let mut first_error = None;

        for assignment in assignments {
            if cancel.is_cancelled() {
                report.not_processed.push(assignment.id);
                continue;
            }
            match merge
                .apply_set_with_cancel(set_id, assignment.position_id, user, cancel)
                .await
            {
                Ok(result) => {
                    report.succeeded.push(assignment.id);
                    results.push(result);
                }
                Err(err) => {
                    tracing::warn!(
                        set_id,
                        assignment_id = assignment.id,
                        position_id = assignment.position_id,
                        error = %err,
                        "Assignment sync failed"
                    );
                    report.failed.push(FailedTarget {
                        id: assignment.id,
                        reason: err.to_string(),
                    });
                    if first_error.is_none() {
                        first_error = Some(err);
                    }
                }
            }
        }

        if report.succeeded.is_empty() && report.not_processed.is_empty() {
            if let Some(err) = first_error {
                return Err(err);
            }
        }
        if !report.is_complete() {
            return Err(report.into());
        }
        tracing::info!(
            set_id,
            synced = results.len(),
            user_id = user.id(),
            "Assignments synced"
        );
        Ok(results)
    }
}
