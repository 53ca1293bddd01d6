//! Drift detection, "fully applied" evaluation and assignment status.

mod common;

use assert_matches::assert_matches;

use common::{fixture, item};
use competency_core::competency_set::{UpdateCompetencySet, UpdateSetItem};
use competency_core::drift::ChangeType;
use competency_core::error::CoreError;
use competency_core::requirement::RequirementPatch;

// ---------------------------------------------------------------------------
// diff
// ---------------------------------------------------------------------------

/// Before any apply every item is reported as added.
#[tokio::test]
async fn unapplied_set_reports_every_item_added() {
    let f = fixture().await;
    let set = f.core_leadership().await;

    let changes = f
        .engine
        .drift()
        .diff(set.set.id, f.manager.id, f.user.id())
        .await
        .expect("diff should succeed");
    assert_eq!(changes.len(), 2);
    assert!(changes.iter().all(|c| c.change_type == ChangeType::Added));
    assert_eq!(changes[0].competency_name, "Communication");
    assert_eq!(changes[0].new_level, Some(3));
    assert_eq!(changes[0].old_level, None);
}

/// Added, modified and removed are each classified, in that order.
#[tokio::test]
async fn diff_classifies_every_kind_of_change() {
    let f = fixture().await;
    let set = f.core_leadership().await;
    f.engine
        .merge()
        .apply_set(set.set.id, f.manager.id, f.user)
        .await
        .expect("apply should succeed");

    f.engine
        .catalog()
        .update(
            set.set.id,
            &UpdateCompetencySet {
                items: Some(vec![
                    item(f.delegation.id, 4, false),
                    item(f.coaching.id, 2, true),
                ]),
                ..Default::default()
            },
            f.user,
        )
        .await
        .expect("update should succeed");

    let changes = f
        .engine
        .drift()
        .diff(set.set.id, f.manager.id, f.user.id())
        .await
        .expect("diff should succeed");
    let summary: Vec<_> = changes
        .iter()
        .map(|c| (c.change_type, c.competency_name.as_str(), c.old_level, c.new_level))
        .collect();
    assert_eq!(
        summary,
        vec![
            (ChangeType::Added, "Coaching", None, Some(2)),
            (ChangeType::Modified, "Delegation", Some(2), Some(4)),
            (ChangeType::Removed, "Communication", Some(3), None),
        ]
    );
    // Only the level differs for Delegation.
    assert_eq!(changes[1].old_is_mandatory, None);
}

/// Requirements the position added on its own never show up as removed.
#[tokio::test]
async fn position_only_requirement_is_not_drift() {
    let f = fixture().await;
    let set = f.core_leadership().await;
    f.engine
        .merge()
        .apply_set(set.set.id, f.manager.id, f.user)
        .await
        .expect("apply should succeed");
    f.engine
        .requirements()
        .upsert(
            f.manager.id,
            &competency_core::requirement::RequirementUpsert {
                competency_id: f.planning.id,
                required_level: 2,
                is_mandatory: false,
            },
            f.user,
        )
        .await
        .expect("upsert should succeed");

    let drift = f.engine.drift();
    assert!(drift
        .diff(set.set.id, f.manager.id, f.user.id())
        .await
        .expect("diff should succeed")
        .is_empty());
    assert!(drift
        .is_synced(set.set.id, f.manager.id, f.user.id())
        .await
        .expect("is_synced should succeed"));
}

// ---------------------------------------------------------------------------
// Fully applied vs synced
// ---------------------------------------------------------------------------

/// Raising a level on the position keeps the set fully applied but out of sync.
#[tokio::test]
async fn higher_position_level_is_fully_applied_but_drifted() {
    let f = fixture().await;
    let set = f.core_leadership().await;
    f.engine
        .merge()
        .apply_set(set.set.id, f.manager.id, f.user)
        .await
        .expect("apply should succeed");

    let reqs = f.engine.requirements().list(f.manager.id).await.expect("list");
    let delegation = reqs
        .iter()
        .find(|r| r.competency_id == f.delegation.id)
        .expect("delegation applied");
    f.engine
        .requirements()
        .update(
            f.manager.id,
            delegation.id,
            &RequirementPatch {
                required_level: Some(5),
                ..Default::default()
            },
            f.user,
        )
        .await
        .expect("patch should succeed");

    let drift = f.engine.drift();
    assert!(drift
        .is_fully_applied(set.set.id, f.manager.id, f.user.id())
        .await
        .expect("evaluation should succeed"));
    let changes = drift.diff(set.set.id, f.manager.id, f.user.id()).await.expect("diff");
    assert_eq!(changes.len(), 1);
    assert_eq!(changes[0].change_type, ChangeType::Modified);
    assert_eq!(changes[0].old_level, Some(5));
    assert_eq!(changes[0].new_level, Some(2));
}

/// Coverage lists every visible active set with its evaluation.
#[tokio::test]
async fn fully_applied_sets_evaluates_each_visible_set() {
    let f = fixture().await;
    let leadership = f.core_leadership().await;
    let planning = f.create_set("Planning", vec![item(f.planning.id, 3, true)]).await;
    f.engine
        .merge()
        .apply_set(leadership.set.id, f.manager.id, f.user)
        .await
        .expect("apply should succeed");

    let coverage = f
        .engine
        .drift()
        .fully_applied_sets(f.manager.id, f.user.id())
        .await
        .expect("coverage should succeed");
    let rows: Vec<_> = coverage
        .iter()
        .map(|c| (c.set.id, c.fully_applied))
        .collect();
    assert_eq!(rows, vec![(leadership.set.id, true), (planning.set.id, false)]);
}

// ---------------------------------------------------------------------------
// Assignment status
// ---------------------------------------------------------------------------

/// Status reflects pending changes after the set is edited.
#[tokio::test]
async fn assignment_status_tracks_pending_changes() {
    let f = fixture().await;
    let set = f.core_leadership().await;
    let tracker = f.engine.tracker();
    tracker
        .assign(set.set.id, &[f.manager.id, f.analyst.id], true, f.user)
        .await
        .expect("assign should succeed");

    let statuses = tracker.list_assignments(set.set.id, f.user.id()).await.expect("list");
    assert_eq!(statuses.len(), 2);
    assert!(statuses.iter().all(|s| s.is_synced));

    f.engine
        .catalog()
        .update_item(
            set.set.id,
            set.items[0].id,
            &UpdateSetItem {
                required_level: None,
                is_mandatory: Some(false),
            },
            f.user,
        )
        .await
        .expect("item update should succeed");

    let statuses = tracker.list_assignments(set.set.id, f.user.id()).await.expect("list");
    assert!(statuses.iter().all(|s| !s.is_synced && s.pending_changes == 1));
    let titles: Vec<_> = statuses.iter().map(|s| s.position_title.as_str()).collect();
    assert_eq!(titles, vec!["Engineering Manager", "Data Analyst"]);
}

/// Assigning without copying records the link only.
#[tokio::test]
async fn assign_without_copy_leaves_requirements_alone() {
    let f = fixture().await;
    let set = f.core_leadership().await;
    let tracker = f.engine.tracker();

    let assignments = tracker
        .assign(set.set.id, &[f.manager.id, f.manager.id], false, f.user)
        .await
        .expect("assign should succeed");
    assert_eq!(assignments.len(), 1);
    assert!(assignments[0].last_synced_at.is_none());
    assert!(f.engine.requirements().list(f.manager.id).await.expect("list").is_empty());

    let available = tracker
        .list_available_positions(set.set.id, f.user.id())
        .await
        .expect("available should succeed");
    let ids: Vec<_> = available.iter().map(|p| p.id).collect();
    assert_eq!(ids, vec![f.analyst.id]);

    let statuses = tracker.list_assignments(set.set.id, f.user.id()).await.expect("list");
    assert_eq!(statuses[0].pending_changes, 2);
}

/// Unknown positions are rejected before any link is written.
#[tokio::test]
async fn assign_validates_all_positions_first() {
    let f = fixture().await;
    let set = f.core_leadership().await;
    let tracker = f.engine.tracker();

    let result = tracker
        .assign(set.set.id, &[f.manager.id, 9_999], false, f.user)
        .await;
    assert_matches!(result, Err(CoreError::NotFound { entity: "Position", id: 9_999 }));
    assert!(tracker.list_assignments(set.set.id, f.user.id()).await.expect("list").is_empty());
}

/// Unassigning removes the link but keeps the requirements.
#[tokio::test]
async fn unassign_keeps_requirements() {
    let f = fixture().await;
    let set = f.core_leadership().await;
    let tracker = f.engine.tracker();
    let assignments = tracker
        .assign(set.set.id, &[f.manager.id], true, f.user)
        .await
        .expect("assign should succeed");

    tracker
        .unassign(set.set.id, assignments[0].id, f.user)
        .await
        .expect("unassign should succeed");

    assert!(tracker.list_assignments(set.set.id, f.user.id()).await.expect("list").is_empty());
    assert_eq!(f.engine.requirements().list(f.manager.id).await.expect("list").len(), 2);
    assert_matches!(
        tracker.unassign(set.set.id, assignments[0].id, f.user).await,
        Err(CoreError::NotFound { entity: "PositionSetAssignment", .. })
    );
}
