//! Competency set types, validation helpers, item-list reconciliation and
//! reorder planning.
//!
//! A competency set is an ordered bundle of `(competency, required level,
//! mandatory)` triples. Item lists are reconciled by competency identity,
//! never by index, because callers may reorder freely between edits.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::level::LevelScale;
use crate::types::{DbId, Level, Timestamp};

/* --------------------------------------------------------------------------
   Validation limits
   -------------------------------------------------------------------------- */

/// Maximum length for a set name.
pub const MAX_SET_NAME_LEN: usize = 200;

/// Maximum length for a set description.
pub const MAX_DESCRIPTION_LEN: usize = 5000;

/* --------------------------------------------------------------------------
   Visibility
   -------------------------------------------------------------------------- */

/// Who can see a set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    /// Visible to every user.
    Public,
    /// Visible to its owner only.
    Private,
}

impl Visibility {
    /// String representation for display, logging, and database storage.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Public => "public",
            Self::Private => "private",
        }
    }
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Visibility {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "public" => Ok(Self::Public),
            "private" => Ok(Self::Private),
            other => Err(CoreError::Validation(format!(
                "Invalid visibility '{other}'. Must be one of: public, private"
            ))),
        }
    }
}

/// Listing filter over [`Visibility`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VisibilityFilter {
    Public,
    Private,
    #[default]
    All,
}

/* --------------------------------------------------------------------------
   Entities
   -------------------------------------------------------------------------- */

/// A stored competency set. `competency_count` is derived from its items.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompetencySet {
    pub id: DbId,
    pub name: String,
    pub description: Option<String>,
    pub visibility: Visibility,
    pub owner_id: DbId,
    pub is_active: bool,
    pub competency_count: i64,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl CompetencySet {
    /// Whether `viewer_id` may see this set.
    pub fn is_visible_to(&self, viewer_id: DbId) -> bool {
        self.visibility == Visibility::Public || self.owner_id == viewer_id
    }
}

/// One entry in a set's ordered item list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompetencySetItem {
    pub id: DbId,
    pub set_id: DbId,
    pub competency_id: DbId,
    pub competency_name: String,
    pub required_level: Level,
    pub is_mandatory: bool,
    /// Dense, 1-based position in the list.
    pub display_order: i32,
}

/// A set together with its items, ordered by `display_order`.
#[derive(Debug, Clone, Serialize)]
pub struct CompetencySetWithItems {
    #[serde(flatten)]
    pub set: CompetencySet,
    pub items: Vec<CompetencySetItem>,
}

/* --------------------------------------------------------------------------
   Request DTOs
   -------------------------------------------------------------------------- */

/// A desired item in a create/update request. Order is given by list position.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SetItemInput {
    pub competency_id: DbId,
    pub required_level: Level,
    #[serde(default)]
    pub is_mandatory: bool,
}

/// Request body for creating a set.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateCompetencySet {
    pub name: String,
    pub description: Option<String>,
    pub visibility: Option<Visibility>,
    #[serde(default)]
    pub items: Vec<SetItemInput>,
}

/// Request body for updating a set. `items`, when present, replaces the
/// stored list.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateCompetencySet {
    pub name: Option<String>,
    /// A blank string clears the description.
    pub description: Option<String>,
    pub visibility: Option<Visibility>,
    pub items: Option<Vec<SetItemInput>>,
}

/// Request body for changing a single item.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateSetItem {
    pub required_level: Option<Level>,
    pub is_mandatory: Option<bool>,
}

/// Direction for [`plan_item_move`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MoveDirection {
    Up,
    Down,
}

/// Request body for moving one item up or down.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct MoveItemRequest {
    pub direction: MoveDirection,
}

/* --------------------------------------------------------------------------
   Store inputs
   -------------------------------------------------------------------------- */

/// Insert payload for a set row.
#[derive(Debug, Clone)]
pub struct NewCompetencySet {
    pub name: String,
    pub description: Option<String>,
    pub visibility: Visibility,
    pub owner_id: DbId,
}

/// Metadata patch for a set row. `None` leaves a column untouched.
#[derive(Debug, Clone, Default)]
pub struct SetMetadataUpdate {
    pub name: Option<String>,
    /// `Some("")` clears the description.
    pub description: Option<String>,
    pub visibility: Option<Visibility>,
}

/// Insert payload for an item row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSetItem {
    pub competency_id: DbId,
    pub required_level: Level,
    pub is_mandatory: bool,
    pub display_order: i32,
}

/// Patch for an item row. `None` leaves a column untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SetItemUpdate {
    pub required_level: Option<Level>,
    pub is_mandatory: Option<bool>,
    pub display_order: Option<i32>,
}

/* --------------------------------------------------------------------------
   Validation
   -------------------------------------------------------------------------- */

/// Validate a set name: non-blank and within the length limit.
pub fn validate_set_name(name: &str) -> Result<(), CoreError> {
    if name.trim().is_empty() {
        return Err(CoreError::Validation(
            "Set name must not be empty".to_string(),
        ));
    }
    if name.len() > MAX_SET_NAME_LEN {
        return Err(CoreError::Validation(format!(
            "Set name too long: {} chars (max {MAX_SET_NAME_LEN})",
            name.len()
        )));
    }
    Ok(())
}

/// Validate an optional description length.
pub fn validate_description(description: Option<&str>) -> Result<(), CoreError> {
    match description {
        Some(d) if d.len() > MAX_DESCRIPTION_LEN => Err(CoreError::Validation(format!(
            "Description too long: {} chars (max {MAX_DESCRIPTION_LEN})",
            d.len()
        ))),
        _ => Ok(()),
    }
}

/// Validate a desired item list: every level on the scale and no competency
/// listed twice.
pub fn validate_items(items: &[SetItemInput], scale: &LevelScale) -> Result<(), CoreError> {
    let mut seen = HashSet::with_capacity(items.len());
    for item in items {
        if !seen.insert(item.competency_id) {
            return Err(CoreError::DuplicateItem {
                competency_id: item.competency_id,
            });
        }
        scale.validate(item.required_level)?;
    }
    Ok(())
}

/// Return the first id in `requested` that is missing from `found`.
pub fn first_missing_id(requested: &[DbId], found: &[DbId]) -> Option<DbId> {
    let found: HashSet<DbId> = found.iter().copied().collect();
    requested.iter().copied().find(|id| !found.contains(id))
}

/* --------------------------------------------------------------------------
   Item-list reconciliation
   -------------------------------------------------------------------------- */

/// An in-place update of an existing item row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedItemUpdate {
    pub item_id: DbId,
    pub competency_id: DbId,
    pub update: SetItemUpdate,
}

/// The store calls needed to turn a stored item list into a desired one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemReconcilePlan {
    /// Item ids to delete (stored, not desired).
    pub deletes: Vec<DbId>,
    /// Rows present on both sides whose level, flag, or order changed.
    pub updates: Vec<PlannedItemUpdate>,
    /// Rows to insert (desired, not stored).
    pub inserts: Vec<NewSetItem>,
}

impl ItemReconcilePlan {
    pub fn is_empty(&self) -> bool {
        self.deletes.is_empty() && self.updates.is_empty() && self.inserts.is_empty()
    }
}

/// Diff a stored item list against a desired list keyed by competency id.
///
/// The desired list's positions become the new dense `display_order`
/// (1-based). Items present on both sides are updated only when something
/// actually differs.
pub fn plan_item_reconciliation(
    stored: &[CompetencySetItem],
    desired: &[SetItemInput],
) -> ItemReconcilePlan {
    let stored_by_competency: HashMap<DbId, &CompetencySetItem> =
        stored.iter().map(|i| (i.competency_id, i)).collect();
    let desired_ids: HashSet<DbId> = desired.iter().map(|i| i.competency_id).collect();

    let mut plan = ItemReconcilePlan::default();

    for item in stored {
        if !desired_ids.contains(&item.competency_id) {
            plan.deletes.push(item.id);
        }
    }

    for (index, want) in desired.iter().enumerate() {
        let display_order = index as i32 + 1;
        match stored_by_competency.get(&want.competency_id) {
            Some(have) => {
                let update = SetItemUpdate {
                    required_level: (have.required_level != want.required_level)
                        .then_some(want.required_level),
                    is_mandatory: (have.is_mandatory != want.is_mandatory)
                        .then_some(want.is_mandatory),
                    display_order: (have.display_order != display_order).then_some(display_order),
                };
                if update != SetItemUpdate::default() {
                    plan.updates.push(PlannedItemUpdate {
                        item_id: have.id,
                        competency_id: have.competency_id,
                        update,
                    });
                }
            }
            None => plan.inserts.push(NewSetItem {
                competency_id: want.competency_id,
                required_level: want.required_level,
                is_mandatory: want.is_mandatory,
                display_order,
            }),
        }
    }

    plan
}

/* --------------------------------------------------------------------------
   Ordering
   -------------------------------------------------------------------------- */

/// Renumber `items` densely from 1 in their current relative order,
/// returning only the `(item_id, new_order)` pairs that change.
pub fn plan_dense_renumber(items: &[CompetencySetItem]) -> Vec<(DbId, i32)> {
    order_changes(sorted_by_order(items))
}

fn sorted_by_order(items: &[CompetencySetItem]) -> Vec<&CompetencySetItem> {
    let mut ordered: Vec<&CompetencySetItem> = items.iter().collect();
    ordered.sort_by_key(|i| (i.display_order, i.id));
    ordered
}

fn order_changes(ordered: Vec<&CompetencySetItem>) -> Vec<(DbId, i32)> {
    ordered
        .into_iter()
        .enumerate()
        .filter_map(|(index, item)| {
            let order = index as i32 + 1;
            (item.display_order != order).then_some((item.id, order))
        })
        .collect()
}

/// Swap `item_id` with its neighbour in `direction` and renumber densely.
///
/// Returns the `(item_id, new_order)` pairs that change. Moving the first
/// item up or the last item down yields an empty plan.
pub fn plan_item_move(
    items: &[CompetencySetItem],
    item_id: DbId,
    direction: MoveDirection,
) -> Result<Vec<(DbId, i32)>, CoreError> {
    let mut ordered = sorted_by_order(items);

    let index = ordered
        .iter()
        .position(|i| i.id == item_id)
        .ok_or(CoreError::NotFound {
            entity: "CompetencySetItem",
            id: item_id,
        })?;

    let neighbour = match direction {
        MoveDirection::Up if index > 0 => Some(index - 1),
        MoveDirection::Down if index + 1 < ordered.len() => Some(index + 1),
        _ => None,
    };

    if let Some(other) = neighbour {
        ordered.swap(index, other);
    }

    Ok(order_changes(ordered))
}

/* --------------------------------------------------------------------------
   Tests
   -------------------------------------------------------------------------- */

#[cfg(test)]
mod tests {
    use super::*;

    fn item(id: DbId, competency_id: DbId, level: Level, order: i32) -> CompetencySetItem {
        CompetencySetItem {
            id,
            set_id: 1,
            competency_id,
            competency_name: format!("C{competency_id}"),
            required_level: level,
            is_mandatory: false,
            display_order: order,
        }
    }

    fn input(competency_id: DbId, level: Level, mandatory: bool) -> SetItemInput {
        SetItemInput {
            competency_id,
            required_level: level,
            is_mandatory: mandatory,
        }
    }

    fn apply_orders(items: &mut [CompetencySetItem], plan: &[(DbId, i32)]) {
        for (id, order) in plan {
            if let Some(i) = items.iter_mut().find(|i| i.id == *id) {
                i.display_order = *order;
            }
        }
    }

    fn order_of(items: &[CompetencySetItem]) -> Vec<DbId> {
        let mut sorted = items.to_vec();
        sorted.sort_by_key(|i| i.display_order);
        sorted.iter().map(|i| i.id).collect()
    }

    // --- Visibility ---

    #[test]
    fn visibility_parses_known_values() {
        assert_eq!("public".parse::<Visibility>().unwrap(), Visibility::Public);
        assert_eq!("private".parse::<Visibility>().unwrap(), Visibility::Private);
        assert!("team".parse::<Visibility>().is_err());
    }

    #[test]
    fn private_set_visible_to_owner_only() {
        let set = CompetencySet {
            id: 1,
            name: "Core".into(),
            description: None,
            visibility: Visibility::Private,
            owner_id: 10,
            is_active: true,
            competency_count: 0,
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        };
        assert!(set.is_visible_to(10));
        assert!(!set.is_visible_to(11));
    }

    // --- Validation ---

    #[test]
    fn validate_set_name_rejects_blank_and_long() {
        assert!(validate_set_name("Core Leadership").is_ok());
        assert!(validate_set_name("   ").is_err());
        let long = "x".repeat(MAX_SET_NAME_LEN + 1);
        assert!(validate_set_name(&long)
            .unwrap_err()
            .to_string()
            .contains("too long"));
    }

    #[test]
    fn validate_items_rejects_duplicate_competency() {
        let items = vec![input(1, 2, false), input(1, 3, true)];
        let err = validate_items(&items, &LevelScale::default()).unwrap_err();
        assert!(matches!(err, CoreError::DuplicateItem { competency_id: 1 }));
    }

    #[test]
    fn validate_items_rejects_level_off_scale() {
        let items = vec![input(1, 9, false)];
        let err = validate_items(&items, &LevelScale::default()).unwrap_err();
        assert!(matches!(err, CoreError::InvalidLevel { level: 9, .. }));
    }

    #[test]
    fn first_missing_id_finds_unknown_reference() {
        assert_eq!(first_missing_id(&[1, 2, 3], &[3, 1]), Some(2));
        assert_eq!(first_missing_id(&[1], &[1]), None);
    }

    // --- Reconciliation ---

    #[test]
    fn reconciliation_is_keyed_by_competency_not_index() {
        let stored = vec![item(10, 1, 2, 1), item(11, 2, 3, 2)];
        // Same items, reversed order, no value changes.
        let desired = vec![input(2, 3, false), input(1, 2, false)];
        let plan = plan_item_reconciliation(&stored, &desired);

        assert!(plan.inserts.is_empty());
        assert!(plan.deletes.is_empty());
        assert_eq!(plan.updates.len(), 2);
        assert!(plan
            .updates
            .iter()
            .all(|u| u.update.required_level.is_none() && u.update.display_order.is_some()));
    }

    #[test]
    fn reconciliation_inserts_deletes_and_updates() {
        let stored = vec![item(10, 1, 2, 1), item(11, 2, 3, 2)];
        let desired = vec![input(1, 4, false), input(3, 1, true)];
        let plan = plan_item_reconciliation(&stored, &desired);

        assert_eq!(plan.deletes, vec![11]);
        assert_eq!(
            plan.updates,
            vec![PlannedItemUpdate {
                item_id: 10,
                competency_id: 1,
                update: SetItemUpdate {
                    required_level: Some(4),
                    is_mandatory: None,
                    display_order: None,
                },
            }]
        );
        assert_eq!(
            plan.inserts,
            vec![NewSetItem {
                competency_id: 3,
                required_level: 1,
                is_mandatory: true,
                display_order: 2,
            }]
        );
    }

    #[test]
    fn reconciliation_of_identical_lists_is_empty() {
        let stored = vec![item(10, 1, 2, 1)];
        let plan = plan_item_reconciliation(&stored, &[input(1, 2, false)]);
        assert!(plan.is_empty());
    }

    // --- Ordering ---

    #[test]
    fn move_up_then_down_restores_order() {
        let mut items = vec![item(1, 1, 1, 1), item(2, 2, 1, 2), item(3, 3, 1, 3)];
        let original = order_of(&items);

        let up = plan_item_move(&items, 3, MoveDirection::Up).unwrap();
        apply_orders(&mut items, &up);
        assert_eq!(order_of(&items), vec![1, 3, 2]);

        let down = plan_item_move(&items, 3, MoveDirection::Down).unwrap();
        apply_orders(&mut items, &down);
        assert_eq!(order_of(&items), original);
    }

    #[test]
    fn edge_moves_are_noops() {
        let items = vec![item(1, 1, 1, 1), item(2, 2, 1, 2)];
        assert!(plan_item_move(&items, 1, MoveDirection::Up)
            .unwrap()
            .is_empty());
        assert!(plan_item_move(&items, 2, MoveDirection::Down)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn move_unknown_item_is_not_found() {
        let items = vec![item(1, 1, 1, 1)];
        let err = plan_item_move(&items, 99, MoveDirection::Up).unwrap_err();
        assert!(matches!(err, CoreError::NotFound { id: 99, .. }));
    }

    #[test]
    fn dense_renumber_closes_gaps() {
        let items = vec![item(1, 1, 1, 1), item(3, 3, 1, 3), item(4, 4, 1, 7)];
        assert_eq!(plan_dense_renumber(&items), vec![(3, 2), (4, 3)]);
    }
}
