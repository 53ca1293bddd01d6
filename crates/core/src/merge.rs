//! Union/overwrite merge planning for applying a set onto a position.
//!
//! Each set item either creates a requirement, overwrites the level and
//! mandatory flag of an existing one, or is already satisfied exactly.
//! Requirements for competencies outside the set are never touched.

use std::collections::{BTreeSet, HashMap};

use serde::Serialize;

use crate::assignment::PositionSetAssignment;
use crate::competency_set::CompetencySetItem;
use crate::requirement::{PositionCompetencyRequirement, RequirementUpsert};
use crate::types::DbId;

/// What applying one set item does to the position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeAction {
    Create,
    Overwrite { requirement_id: DbId },
    Unchanged { requirement_id: DbId },
}

/// One planned per-item step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedUpsert {
    pub upsert: RequirementUpsert,
    pub action: MergeAction,
}

impl PlannedUpsert {
    /// Whether this step needs a store write.
    pub fn needs_write(&self) -> bool {
        !matches!(self.action, MergeAction::Unchanged { .. })
    }
}

/// Outcome of a successful apply.
#[derive(Debug, Clone, Serialize)]
pub struct MergeResult {
    pub set_id: DbId,
    pub position_id: DbId,
    /// Competencies that got a brand-new requirement.
    pub created: Vec<DbId>,
    /// Competencies whose existing requirement was overwritten.
    pub updated: Vec<DbId>,
    /// Competencies whose requirement already matched the set exactly.
    pub unchanged: Vec<DbId>,
    pub assignment: PositionSetAssignment,
}

/// Plan the per-item upserts for applying `items` onto `requirements`,
/// in the set's display order.
pub fn plan_merge(
    items: &[CompetencySetItem],
    requirements: &[PositionCompetencyRequirement],
) -> Vec<PlannedUpsert> {
    let existing: HashMap<DbId, &PositionCompetencyRequirement> =
        requirements.iter().map(|r| (r.competency_id, r)).collect();

    let mut ordered: Vec<&CompetencySetItem> = items.iter().collect();
    ordered.sort_by_key(|i| (i.display_order, i.id));

    ordered
        .into_iter()
        .map(|item| {
            let action = match existing.get(&item.competency_id) {
                None => MergeAction::Create,
                Some(req)
                    if req.required_level == item.required_level
                        && req.is_mandatory == item.is_mandatory =>
                {
                    MergeAction::Unchanged {
                        requirement_id: req.id,
                    }
                }
                Some(req) => MergeAction::Overwrite {
                    requirement_id: req.id,
                },
            };
            PlannedUpsert {
                upsert: RequirementUpsert {
                    competency_id: item.competency_id,
                    required_level: item.required_level,
                    is_mandatory: item.is_mandatory,
                },
                action,
            }
        })
        .collect()
}

/// Sorted, de-duplicated union of two competency id lists.
pub fn union_ids(previous: &[DbId], added: &[DbId]) -> Vec<DbId> {
    previous
        .iter()
        .chain(added)
        .copied()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Sorted, de-duplicated competency ids of a set's items.
pub fn item_competency_ids(items: &[CompetencySetItem]) -> Vec<DbId> {
    union_ids(&[], &items.iter().map(|i| i.competency_id).collect::<Vec<_>>())
}
