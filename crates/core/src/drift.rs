//! Drift classification between a set's current items and the requirements
//! it seeded on a position, plus the looser "fully applied" predicate.
//!
//! Drift is strict: a requirement whose level is higher than the set's is
//! still reported as `modified`. "Fully applied" only asks whether every
//! item's minimum level is met, so a position can be fully applied and out
//! of sync at the same time.

use std::collections::{HashMap, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::competency_set::CompetencySetItem;
use crate::requirement::PositionCompetencyRequirement;
use crate::types::{DbId, Level};

/// How a competency differs between a set and a position.
///
/// - `Added`    -- in the set, not on the position.
/// - `Modified` -- on both, with a different level or mandatory flag.
/// - `Removed`  -- previously sourced from the set, gone from it, still on the position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeType {
    Added,
    Modified,
    Removed,
}

impl ChangeType {
    /// String representation for display and logging.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Added => "added",
            Self::Modified => "modified",
            Self::Removed => "removed",
        }
    }
}

impl fmt::Display for ChangeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single per-competency difference. Never persisted.
///
/// `old_*` values come from the position, `new_*` values from the set. For
/// `Modified`, only the fields that actually differ are populated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompetencyChange {
    pub competency_id: DbId,
    pub competency_name: String,
    pub change_type: ChangeType,
    pub old_level: Option<Level>,
    pub new_level: Option<Level>,
    pub old_is_mandatory: Option<bool>,
    pub new_is_mandatory: Option<bool>,
}

/// Diff a set's items against a position's requirements.
///
/// `source_competency_ids` is the set-membership history recorded on the
/// assignment. Only competencies in that list can be classified `Removed`;
/// requirements the position added independently are never reported.
///
/// Output is sorted by change type (added, modified, removed), then by
/// competency name.
pub fn detect_changes(
    items: &[CompetencySetItem],
    requirements: &[PositionCompetencyRequirement],
    source_competency_ids: &[DbId],
) -> Vec<CompetencyChange> {
    let on_position: HashMap<DbId, &PositionCompetencyRequirement> =
        requirements.iter().map(|r| (r.competency_id, r)).collect();
    let in_set: HashSet<DbId> = items.iter().map(|i| i.competency_id).collect();

    let mut changes = Vec::new();

    for item in items {
        match on_position.get(&item.competency_id) {
            None => changes.push(CompetencyChange {
                competency_id: item.competency_id,
                competency_name: item.competency_name.clone(),
                change_type: ChangeType::Added,
                old_level: None,
                new_level: Some(item.required_level),
                old_is_mandatory: None,
                new_is_mandatory: Some(item.is_mandatory),
            }),
            Some(req) => {
                let level_differs = req.required_level != item.required_level;
                let mandatory_differs = req.is_mandatory != item.is_mandatory;
                if level_differs || mandatory_differs {
                    changes.push(CompetencyChange {
                        competency_id: item.competency_id,
                        competency_name: item.competency_name.clone(),
                        change_type: ChangeType::Modified,
                        old_level: level_differs.then_some(req.required_level),
                        new_level: level_differs.then_some(item.required_level),
                        old_is_mandatory: mandatory_differs.then_some(req.is_mandatory),
                        new_is_mandatory: mandatory_differs.then_some(item.is_mandatory),
                    });
                }
            }
        }
    }

    let mut seen_removed = HashSet::new();
    for competency_id in source_competency_ids {
        if in_set.contains(competency_id) || !seen_removed.insert(*competency_id) {
            continue;
        }
        if let Some(req) = on_position.get(competency_id) {
            changes.push(CompetencyChange {
                competency_id: *competency_id,
                competency_name: req.competency_name.clone(),
                change_type: ChangeType::Removed,
                old_level: Some(req.required_level),
                new_level: None,
                old_is_mandatory: Some(req.is_mandatory),
                new_is_mandatory: None,
            });
        }
    }

    changes.sort_by(|a, b| {
        a.change_type
            .cmp(&b.change_type)
            .then_with(|| a.competency_name.cmp(&b.competency_name))
            .then_with(|| a.competency_id.cmp(&b.competency_id))
    });
    changes
}

/// Whether every set item has a requirement at or above its level.
///
/// The mandatory flag is ignored. An empty set is trivially fully applied.
pub fn is_fully_applied(
    items: &[CompetencySetItem],
    requirements: &[PositionCompetencyRequirement],
) -> bool {
    let levels: HashMap<DbId, Level> = requirements
        .iter()
        .map(|r| (r.competency_id, r.required_level))
        .collect();
    items.iter().all(|item| {
        levels
            .get(&item.competency_id)
            .is_some_and(|level| *level >= item.required_level)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn item(competency_id: DbId, name: &str, level: Level, mandatory: bool) -> CompetencySetItem {
        CompetencySetItem {
            id: competency_id + 100,
            set_id: 1,
            competency_id,
            competency_name: name.to_string(),
            required_level: level,
            is_mandatory: mandatory,
            display_order: 1,
        }
    }

    fn req(
        competency_id: DbId,
        name: &str,
        level: Level,
        mandatory: bool,
    ) -> PositionCompetencyRequirement {
        let now = Utc::now();
        PositionCompetencyRequirement {
            id: competency_id + 500,
            position_id: 1,
            competency_id,
            competency_name: name.to_string(),
            required_level: level,
            is_mandatory: mandatory,
            modified_by: None,
            modified_at: now,
            created_at: now,
        }
    }

    #[test]
    fn identical_sides_produce_no_changes() {
        let items = vec![item(1, "A", 2, true)];
        let reqs = vec![req(1, "A", 2, true)];
        assert!(detect_changes(&items, &reqs, &[1]).is_empty());
    }

    #[test]
    fn diff_after_set_edit_reports_added_modified_removed() {
        // Set S = {A:2, B:3} was applied; set now S' = {A:4, C:1}.
        let items = vec![item(1, "A", 4, false), item(3, "C", 1, false)];
        let reqs = vec![
            req(1, "A", 2, false),
            req(2, "B", 3, false),
            req(9, "Independent", 5, true),
        ];
        let changes = detect_changes(&items, &reqs, &[1, 2]);

        assert_eq!(changes.len(), 3);

        assert_eq!(changes[0].competency_id, 3);
        assert_eq!(changes[0].change_type, ChangeType::Added);
        assert_eq!(changes[0].new_level, Some(1));
        assert_eq!(changes[0].old_level, None);

        assert_eq!(changes[1].competency_id, 1);
        assert_eq!(changes[1].change_type, ChangeType::Modified);
        assert_eq!((changes[1].old_level, changes[1].new_level), (Some(2), Some(4)));
        assert_eq!(changes[1].old_is_mandatory, None);

        assert_eq!(changes[2].competency_id, 2);
        assert_eq!(changes[2].change_type, ChangeType::Removed);
        assert_eq!(changes[2].old_level, Some(3));
        assert_eq!(changes[2].new_level, None);
    }

    #[test]
    fn independent_requirements_are_never_removed() {
        let items = vec![item(1, "A", 2, false)];
        let reqs = vec![req(1, "A", 2, false), req(2, "B", 3, false)];
        assert!(detect_changes(&items, &reqs, &[]).is_empty());
    }

    #[test]
    fn removed_competency_gone_from_position_is_not_reported() {
        let items = vec![item(1, "A", 2, false)];
        let reqs = vec![req(1, "A", 2, false)];
        assert!(detect_changes(&items, &reqs, &[1, 2]).is_empty());
    }

    #[test]
    fn mandatory_only_difference_populates_flag_fields() {
        let items = vec![item(1, "A", 2, true)];
        let reqs = vec![req(1, "A", 2, false)];
        let changes = detect_changes(&items, &reqs, &[1]);
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].old_level, None);
        assert_eq!(changes[0].old_is_mandatory, Some(false));
        assert_eq!(changes[0].new_is_mandatory, Some(true));
    }

    #[test]
    fn higher_position_level_is_fully_applied_but_drifted() {
        let items = vec![item(1, "A", 2, false)];
        let reqs = vec![req(1, "A", 4, false)];
        assert!(is_fully_applied(&items, &reqs));
        let changes = detect_changes(&items, &reqs, &[1]);
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].change_type, ChangeType::Modified);
    }

    #[test]
    fn lower_or_missing_level_is_not_fully_applied() {
        let items = vec![item(1, "A", 3, false), item(2, "B", 1, false)];
        assert!(!is_fully_applied(&items, &[req(1, "A", 2, false), req(2, "B", 1, false)]));
        assert!(!is_fully_applied(&items, &[req(1, "A", 3, false)]));
        assert!(is_fully_applied(&[], &[]));
    }

    #[test]
    fn change_type_serializes_snake_case() {
        assert_eq!(serde_json::to_string(&ChangeType::Removed).unwrap(), "\"removed\"");
        assert_eq!(ChangeType::Modified.to_string(), "modified");
    }
}
