//! Position competency requirements: the live, per-position list that
//! assessments read from.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::level::LevelScale;
use crate::types::{DbId, Level, Timestamp};

/// A single requirement row owned by a position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PositionCompetencyRequirement {
    pub id: DbId,
    pub position_id: DbId,
    pub competency_id: DbId,
    pub competency_name: String,
    pub required_level: Level,
    pub is_mandatory: bool,
    pub modified_by: Option<DbId>,
    pub modified_at: Timestamp,
    pub created_at: Timestamp,
}

/// Insert-or-overwrite payload keyed by `(position_id, competency_id)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequirementUpsert {
    pub competency_id: DbId,
    pub required_level: Level,
    pub is_mandatory: bool,
}

/// Single-field patch for a requirement.
///
/// When `expected_modified_at` is set the store rejects the write with
/// [`CoreError::ConflictStale`] if the row changed after that instant.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RequirementPatch {
    pub required_level: Option<Level>,
    pub is_mandatory: Option<bool>,
    pub expected_modified_at: Option<Timestamp>,
}

/// Validate a patch: it must change something, and any level must be on the scale.
pub fn validate_patch(patch: &RequirementPatch, scale: &LevelScale) -> Result<(), CoreError> {
    if patch.required_level.is_none() && patch.is_mandatory.is_none() {
        return Err(CoreError::Validation(
            "Requirement update must set required_level or is_mandatory".to_string(),
        ));
    }
    if let Some(level) = patch.required_level {
        scale.validate(level)?;
    }
    Ok(())
}

/// Optimistic-concurrency check shared by store adapters.
pub fn ensure_not_stale(
    current: &PositionCompetencyRequirement,
    expected_modified_at: Option<Timestamp>,
) -> Result<(), CoreError> {
    match expected_modified_at {
        Some(expected) if expected != current.modified_at => Err(CoreError::ConflictStale(
            format!(
                "Requirement {} was modified at {} (expected {})",
                current.id, current.modified_at, expected
            ),
        )),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn requirement() -> PositionCompetencyRequirement {
        let now = Utc::now();
        PositionCompetencyRequirement {
            id: 5,
            position_id: 1,
            competency_id: 2,
            competency_name: "Communication".into(),
            required_level: 3,
            is_mandatory: true,
            modified_by: Some(9),
            modified_at: now,
            created_at: now,
        }
    }

    #[test]
    fn empty_patch_is_rejected() {
        let err = validate_patch(&RequirementPatch::default(), &LevelScale::default()).unwrap_err();
        assert!(err.to_string().contains("must set"));
    }

    #[test]
    fn patch_level_must_be_on_scale() {
        let patch = RequirementPatch {
            required_level: Some(0),
            ..Default::default()
        };
        assert!(matches!(
            validate_patch(&patch, &LevelScale::default()),
            Err(CoreError::InvalidLevel { level: 0, .. })
        ));
    }

    #[test]
    fn mandatory_only_patch_is_valid() {
        let patch = RequirementPatch {
            is_mandatory: Some(false),
            ..Default::default()
        };
        assert!(validate_patch(&patch, &LevelScale::default()).is_ok());
    }

    #[test]
    fn stale_timestamp_conflicts() {
        let req = requirement();
        assert!(ensure_not_stale(&req, None).is_ok());
        assert!(ensure_not_stale(&req, Some(req.modified_at)).is_ok());
        let earlier = req.modified_at - Duration::seconds(5);
        assert!(matches!(
            ensure_not_stale(&req, Some(earlier)),
            Err(CoreError::ConflictStale(_))
        ));
    }
}
