//! Sync executor, including the full create/assign/edit/diff/sync flow.

mod common;

use assert_matches::assert_matches;
use tokio_util::sync::CancellationToken;

use common::{fixture, item};
use competency_core::actor::ActingUser;
use competency_core::competency_set::{UpdateCompetencySet, UpdateSetItem};
use competency_core::drift::ChangeType;
use competency_core::error::CoreError;
use competency_engine::DeleteOutcome;

// ---------------------------------------------------------------------------
// End to end
// ---------------------------------------------------------------------------

/// Create, assign, edit, diff, sync: the diff is empty afterwards.
#[tokio::test]
async fn core_leadership_round_trip() {
    let f = fixture().await;
    let set = f.core_leadership().await;

    let assignments = f
        .engine
        .tracker()
        .assign(set.set.id, &[f.manager.id], true, f.user)
        .await
        .expect("assign should succeed");
    let reqs = f.engine.requirements().list(f.manager.id).await.expect("list");
    let rows: Vec<_> = reqs
        .iter()
        .map(|r| (r.competency_id, r.required_level, r.is_mandatory))
        .collect();
    assert_eq!(
        rows,
        vec![(f.communication.id, 3, true), (f.delegation.id, 2, false)]
    );

    let delegation_item = set
        .items
        .iter()
        .find(|i| i.competency_id == f.delegation.id)
        .expect("delegation item");
    f.engine
        .catalog()
        .update_item(
            set.set.id,
            delegation_item.id,
            &UpdateSetItem {
                required_level: Some(4),
                is_mandatory: None,
            },
            f.user,
        )
        .await
        .expect("item update should succeed");

    let changes = f
        .engine
        .drift()
        .diff(set.set.id, f.manager.id, f.user.id())
        .await
        .expect("diff should succeed");
    assert_eq!(changes.len(), 1);
    assert_eq!(changes[0].competency_name, "Delegation");
    assert_eq!(changes[0].change_type, ChangeType::Modified);
    assert_eq!((changes[0].old_level, changes[0].new_level), (Some(2), Some(4)));

    let results = f
        .engine
        .sync()
        .sync(set.set.id, &[assignments[0].id], f.user)
        .await
        .expect("sync should succeed");
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].updated, vec![f.delegation.id]);

    assert!(f
        .engine
        .drift()
        .diff(set.set.id, f.manager.id, f.user.id())
        .await
        .expect("diff should succeed")
        .is_empty());
}

// ---------------------------------------------------------------------------
// Convergence
// ---------------------------------------------------------------------------

/// Sync acknowledges removed competencies without deleting their requirements.
#[tokio::test]
async fn sync_converges_after_item_removal() {
    let f = fixture().await;
    let set = f.core_leadership().await;
    let assignments = f
        .engine
        .tracker()
        .assign(set.set.id, &[f.manager.id], true, f.user)
        .await
        .expect("assign should succeed");

    f.engine
        .catalog()
        .update(
            set.set.id,
            &UpdateCompetencySet {
                items: Some(vec![item(f.delegation.id, 2, false)]),
                ..Default::default()
            },
            f.user,
        )
        .await
        .expect("update should succeed");

    let drift = f.engine.drift();
    let changes = drift.diff(set.set.id, f.manager.id, f.user.id()).await.expect("diff");
    assert_eq!(changes.len(), 1);
    assert_eq!(changes[0].change_type, ChangeType::Removed);

    f.engine
        .sync()
        .sync(set.set.id, &[assignments[0].id], f.user)
        .await
        .expect("sync should succeed");

    assert!(drift.diff(set.set.id, f.manager.id, f.user.id()).await.expect("diff").is_empty());
    let assignment = f
        .assignment_for(set.set.id, f.manager.id)
        .await
        .expect("assignment exists");
    assert_eq!(assignment.source_competency_ids, vec![f.delegation.id]);
    assert_eq!(f.engine.requirements().list(f.manager.id).await.expect("list").len(), 2);
}

/// Only the selected assignments are touched.
#[tokio::test]
async fn sync_only_touches_selected_assignments() {
    let f = fixture().await;
    let set = f.core_leadership().await;
    let assignments = f
        .engine
        .tracker()
        .assign(set.set.id, &[f.manager.id, f.analyst.id], false, f.user)
        .await
        .expect("assign should succeed");
    let manager_assignment = assignments
        .iter()
        .find(|a| a.position_id == f.manager.id)
        .expect("manager assignment");

    f.engine
        .sync()
        .sync(set.set.id, &[manager_assignment.id], f.user)
        .await
        .expect("sync should succeed");

    assert_eq!(f.engine.requirements().list(f.manager.id).await.expect("list").len(), 2);
    assert!(f.engine.requirements().list(f.analyst.id).await.expect("list").is_empty());
}

// ---------------------------------------------------------------------------
// Validation and failure reporting
// ---------------------------------------------------------------------------

#[tokio::test]
async fn sync_requires_assignment_ids() {
    let f = fixture().await;
    let set = f.core_leadership().await;
    assert_matches!(
        f.engine.sync().sync(set.set.id, &[], f.user).await,
        Err(CoreError::Validation(_))
    );
}

/// An assignment of another set is reported as missing before anything runs.
#[tokio::test]
async fn sync_rejects_foreign_assignment() {
    let f = fixture().await;
    let leadership = f.core_leadership().await;
    let other = f.create_set("Planning", vec![item(f.planning.id, 3, true)]).await;
    let foreign = f
        .engine
        .tracker()
        .assign(other.set.id, &[f.manager.id], false, f.user)
        .await
        .expect("assign should succeed");

    let result = f
        .engine
        .sync()
        .sync(leadership.set.id, &[foreign[0].id], f.user)
        .await;
    assert_matches!(
        result,
        Err(CoreError::NotFound { entity: "PositionSetAssignment", .. })
    );
    assert!(f.engine.requirements().list(f.manager.id).await.expect("list").is_empty());
}

/// When every assignment fails, the first assignment's own failure is returned.
#[tokio::test]
async fn sync_with_every_assignment_failing_returns_first_failure() {
    let f = fixture().await;
    let set = f.core_leadership().await;
    let assignments = f
        .engine
        .tracker()
        .assign(set.set.id, &[f.manager.id, f.analyst.id], false, f.user)
        .await
        .expect("assign should succeed");
    f.store.inject_upsert_failure(f.communication.id).await;

    let ids: Vec<_> = assignments.iter().map(|a| a.id).collect();
    let err = f
        .engine
        .sync()
        .sync(set.set.id, &ids, f.user)
        .await
        .expect_err("sync should report failures");
    let report = assert_matches!(err, CoreError::PartialApply(report) => report);
    assert_eq!(report.target, "competency");
    assert_eq!(report.succeeded, vec![f.delegation.id]);
    assert_eq!(report.failed[0].id, f.communication.id);

    // Every assignment was still attempted; delegation landed on both positions.
    for position_id in [f.manager.id, f.analyst.id] {
        let reqs = f.engine.requirements().list(position_id).await.expect("list");
        assert_eq!(reqs.len(), 1);
        assert_eq!(reqs[0].competency_id, f.delegation.id);
    }
}

/// Syncing a deactivated set fails outright instead of reporting a partial run.
#[tokio::test]
async fn sync_of_inactive_set_is_rejected() {
    let f = fixture().await;
    let set = f.core_leadership().await;
    let assignments = f
        .engine
        .tracker()
        .assign(set.set.id, &[f.manager.id, f.analyst.id], false, f.user)
        .await
        .expect("assign should succeed");
    let outcome = f
        .engine
        .catalog()
        .delete(set.set.id, f.user)
        .await
        .expect("delete");
    assert_eq!(outcome, DeleteOutcome::Deactivated);

    let ids: Vec<_> = assignments.iter().map(|a| a.id).collect();
    let err = f
        .engine
        .sync()
        .sync(set.set.id, &ids, f.user)
        .await
        .expect_err("inactive set cannot be synced");
    assert_matches!(err, CoreError::Validation(_));

    let err = f
        .engine
        .tracker()
        .assign(set.set.id, &[f.manager.id, f.analyst.id], true, f.user)
        .await
        .expect_err("inactive set cannot be copied");
    assert_matches!(err, CoreError::Validation(_));
}

/// Cancelling before the run leaves every assignment unprocessed.
#[tokio::test]
async fn cancelled_sync_skips_remaining_assignments() {
    let f = fixture().await;
    let set = f.core_leadership().await;
    let assignments = f
        .engine
        .tracker()
        .assign(set.set.id, &[f.manager.id, f.analyst.id], false, f.user)
        .await
        .expect("assign should succeed");
    let ids: Vec<_> = assignments.iter().map(|a| a.id).collect();
    let cancel = CancellationToken::new();
    cancel.cancel();

    let err = f
        .engine
        .sync()
        .sync_with_cancel(set.set.id, &ids, f.user, &cancel)
        .await
        .expect_err("cancelled sync should not complete");
    let report = assert_matches!(err, CoreError::PartialApply(report) => report);
    assert_eq!(report.not_processed, ids);
}

/// Mutations need a real acting user.
#[test]
fn acting_user_must_be_positive() {
    assert_matches!(ActingUser::new(0), Err(CoreError::PreconditionFailed(_)));
    assert_matches!(ActingUser::require(None), Err(CoreError::PreconditionFailed(_)));
}
